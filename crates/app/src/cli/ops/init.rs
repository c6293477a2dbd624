use std::path::PathBuf;

use clap::Args;

use multiseal::{AppConfig, AppState};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Default log level written to config.toml
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Directory for daily-rolling log files
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Number of recipients `mseal demo` generates by default
    #[arg(long, default_value_t = 3)]
    pub demo_recipients: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] multiseal::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            log_level: self.log_level.clone(),
            log_dir: self.log_dir.clone(),
            demo_recipients: self.demo_recipients,
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;
        let key = state.load_key()?;

        tracing::info!(dir = %state.multiseal_dir.display(), "initialized state directory");

        Ok(format!(
            "Initialized multiseal directory at: {}\n\
             - Key: {}\n\
             - Config: {}\n\
             - Address: {}\n\
             - Public key: {}",
            state.multiseal_dir.display(),
            state.key_path.display(),
            state.config_path.display(),
            key.public().address(),
            key.public(),
        ))
    }
}
