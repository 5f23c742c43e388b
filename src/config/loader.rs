// src/config/loader.rs
//! Layered configuration loader
//!
//! Sources are merged in order, later ones winning: built-in defaults, an
//! optional TOML file, then `PPG_BP_*` environment variables with `__` between
//! nesting levels (`PPG_BP_MODELS__SBP_PATH=/opt/models/sys.json`).

use crate::config::{constants::paths, BpConfig};
use config::{Config, Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Configuration validation errors: {}", .0.join("; "))]
    ValidationError(Vec<String>),

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err.to_string())
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Configuration loader
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    require_file: bool,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader that picks up `ppg-bp.toml` from the working directory if present
    pub fn new() -> Self {
        Self {
            config_path: Some(PathBuf::from(paths::DEFAULT_CONFIG_FILE)),
            require_file: false,
            env_prefix: paths::ENV_PREFIX.to_string(),
        }
    }

    /// Use an explicit file, which must then exist
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self.require_file = true;
        self
    }

    /// Skip file lookup entirely
    pub fn without_file(mut self) -> Self {
        self.config_path = None;
        self.require_file = false;
        self
    }

    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_string();
        self
    }

    /// Load, merge and validate the configuration
    pub fn load(&self) -> Result<BpConfig, ConfigError> {
        let defaults = Config::try_from(&BpConfig::default())?;
        let mut builder = Config::builder().add_source(defaults);

        if let Some(path) = &self.config_path {
            if self.require_file && !path.exists() {
                return Err(ConfigError::FileNotFound(path.display().to_string()));
            }
            debug!(path = %path.display(), "Reading configuration file");
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(self.require_file),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator(paths::ENV_SEPARATOR)
                .try_parsing(true),
        );

        let config: BpConfig = builder.build()?.try_deserialize()?;
        config
            .validate_consistency()
            .map_err(ConfigError::ValidationError)?;

        Ok(config)
    }

    /// Export a configuration as pretty TOML
    pub fn export_config<P: AsRef<Path>>(config: &BpConfig, path: P) -> Result<(), ConfigError> {
        let toml_content =
            toml::to_string_pretty(config).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, toml_content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_without_file_gives_defaults() {
        let config = ConfigLoader::new()
            .without_file()
            .with_env_prefix("PPG_BP_UNIT_TEST_UNUSED")
            .load()
            .unwrap();
        assert_eq!(config, BpConfig::default());
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = ConfigLoader::new()
            .with_file("/nonexistent/ppg-bp.toml")
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[filter]\nhighcut_hz = 6.0\n\n[features]\nfiducial_min_distance_samples = 40").unwrap();

        let config = ConfigLoader::new()
            .with_file(file.path())
            .with_env_prefix("PPG_BP_UNIT_TEST_UNUSED")
            .load()
            .unwrap();

        assert_eq!(config.filter.highcut_hz, 6.0);
        assert_eq!(config.filter.lowcut_hz, 0.5);
        assert_eq!(config.features.fiducial_min_distance_samples, 40);
    }

    #[test]
    fn test_invalid_file_fails_validation() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[filter]\nlowcut_hz = 9.0").unwrap();

        let result = ConfigLoader::new()
            .with_file(file.path())
            .with_env_prefix("PPG_BP_UNIT_TEST_UNUSED")
            .load();
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_export_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exported.toml");

        let mut config = BpConfig::default();
        config.models.sbp_crc32 = Some(0xDEAD_BEEF);
        ConfigLoader::export_config(&config, &path).unwrap();

        let loaded = ConfigLoader::new()
            .with_file(&path)
            .with_env_prefix("PPG_BP_UNIT_TEST_UNUSED")
            .load()
            .unwrap();
        assert_eq!(loaded.models.sbp_crc32, Some(0xDEAD_BEEF));
    }
}
