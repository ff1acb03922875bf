//! Configuration for the regridder.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::RegridMethod;

/// Configuration for the regridder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegridConfig {
    /// Default interpolation method.
    pub method: RegridMethod,

    /// Treat longitude as periodic (wraps across the 360° seam).
    pub periodic: bool,

    /// Reuse weights persisted in `weights_dir`.
    pub reuse_weights: bool,

    /// Directory holding persisted weight files.
    pub weights_dir: Option<PathBuf>,
}

impl Default for RegridConfig {
    fn default() -> Self {
        Self {
            method: RegridMethod::Bilinear,
            periodic: false,
            reuse_weights: true,
            weights_dir: None,
        }
    }
}

impl RegridConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `WX_*` environment overrides on top of `self`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("WX_REGRID_METHOD") {
            match val.parse() {
                Ok(method) => self.method = method,
                Err(e) => warn!(error = %e, "Ignoring WX_REGRID_METHOD"),
            }
        }

        if let Ok(val) = std::env::var("WX_REGRID_PERIODIC") {
            self.periodic = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("WX_REUSE_WEIGHTS") {
            self.reuse_weights = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("WX_WEIGHTS_DIR") {
            if !val.is_empty() {
                self.weights_dir = Some(PathBuf::from(val));
            }
        }

        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(dir) = &self.weights_dir {
            if dir.as_os_str().is_empty() {
                return Err("weights_dir must not be empty".to_string());
            }
            if dir.is_file() {
                return Err(format!("weights_dir {} is a file", dir.display()));
            }
        }

        Ok(())
    }

    /// The directory weights should be persisted to, if persistence is on.
    pub fn persistence_dir(&self) -> Option<&PathBuf> {
        self.weights_dir.as_ref().filter(|_| self.reuse_weights)
    }
}

fn parse_flag(val: &str) -> bool {
    val.eq_ignore_ascii_case("true") || val == "1"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegridConfig::default();
        assert_eq!(config.method, RegridMethod::Bilinear);
        assert!(!config.periodic);
        assert!(config.reuse_weights);
        assert!(config.weights_dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_persistence_requires_reuse() {
        let mut config = RegridConfig {
            weights_dir: Some(PathBuf::from("/tmp/weights")),
            ..Default::default()
        };
        assert!(config.persistence_dir().is_some());

        config.reuse_weights = false;
        assert!(config.persistence_dir().is_none());
    }

    #[test]
    fn test_validation_rejects_file_dir() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = RegridConfig {
            weights_dir: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("no"));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: RegridConfig = serde_json::from_str(r#"{"method":"conservative"}"#).unwrap();
        assert_eq!(config.method, RegridMethod::Conservative);
        assert!(config.reuse_weights);
    }
}
