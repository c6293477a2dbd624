use std::{fs, path::PathBuf};

use common::prelude::SecretKey;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

pub const APP_NAME: &str = "multiseal";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEY_FILE_NAME: &str = "key.pem";
pub const LOG_FILE_NAME: &str = "mseal.log";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default log level, overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for daily-rolling log files (stderr only if unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// Number of recipients `mseal demo` generates
    #[serde(default = "default_demo_recipients")]
    pub demo_recipients: usize,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_demo_recipients() -> usize {
    3
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_dir: None,
            demo_recipients: default_demo_recipients(),
        }
    }
}

impl AppConfig {
    /// Parsed log level, falling back to `info` on anything unrecognised
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::INFO)
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the multiseal directory (~/.multiseal)
    pub multiseal_dir: PathBuf,
    /// Path to the secret key PEM file
    pub key_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the multiseal directory path (custom or default ~/.multiseal)
    pub fn multiseal_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new state directory with a fresh key
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let multiseal_dir = Self::multiseal_dir(custom_path)?;

        if multiseal_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&multiseal_dir)?;

        let key = SecretKey::generate();
        let key_path = multiseal_dir.join(KEY_FILE_NAME);
        fs::write(&key_path, key.to_pem().as_bytes())?;

        let config = config.unwrap_or_default();
        let config_path = multiseal_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            multiseal_dir,
            key_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the multiseal directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let multiseal_dir = Self::multiseal_dir(custom_path)?;

        if !multiseal_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let key_path = multiseal_dir.join(KEY_FILE_NAME);
        let config_path = multiseal_dir.join(CONFIG_FILE_NAME);

        if !key_path.exists() {
            return Err(StateError::MissingFile(KEY_FILE_NAME.to_string()));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            multiseal_dir,
            key_path,
            config_path,
            config,
        })
    }

    /// Load the secret key from the key file
    pub fn load_key(&self) -> Result<SecretKey, StateError> {
        load_key_file(&self.key_path)
    }
}

/// Read a PEM-encoded secret key from `path`
pub fn load_key_file(path: &std::path::Path) -> Result<SecretKey, StateError> {
    let pem = fs::read_to_string(path)?;
    SecretKey::from_pem(&pem).map_err(|e| StateError::InvalidKey(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("multiseal directory not initialized. Run 'mseal init' first")]
    NotInitialized,

    #[error("multiseal directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
