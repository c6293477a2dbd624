use std::fmt;

use serde::Serialize;

/// Build metadata captured by `build.rs`
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub build_profile: &'static str,
    pub build_features: &'static str,
    pub build_timestamp: &'static str,
    pub rust_version: &'static str,
    pub build_target: Option<&'static str>,
    pub build_host: Option<&'static str>,
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "multiseal {} ({}, features: {}) built {} with {}",
            self.version,
            self.build_profile,
            self.build_features,
            self.build_timestamp,
            self.rust_version
        )?;
        if let Some(target) = self.build_target {
            write!(f, " for {}", target)?;
        }
        Ok(())
    }
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("REPO_VERSION"),
        build_profile: env!("BUILD_PROFILE"),
        build_features: env!("BUILD_FEATURES"),
        build_timestamp: env!("BUILD_TIMESTAMP"),
        rust_version: env!("RUST_VERSION"),
        build_target: option_env!("BUILD_TARGET"),
        build_host: option_env!("BUILD_HOST"),
    }
}

#[macro_export]
macro_rules! build_info {
    () => {
        $crate::version::build_info()
    };
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_build_info_is_populated() {
        let info = build_info!();
        assert!(!info.version.is_empty());
        assert!(!info.build_profile.is_empty());
        assert!(info.to_string().starts_with("multiseal "));
    }
}
