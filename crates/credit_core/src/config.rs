//! Runtime configuration for the scoring core
//!
//! Layering: built-in defaults, then an optional TOML file, then
//! `CREDIT_*` environment variables.

use crate::batch::MAX_BATCH_SIZE;
use crate::errors::{CreditCoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub const ENV_MODELS_DIR: &str = "CREDIT_MODELS_DIR";
pub const ENV_BUNDLE_PREFIX: &str = "CREDIT_BUNDLE_PREFIX";
pub const ENV_MAX_BATCH_SIZE: &str = "CREDIT_MAX_BATCH_SIZE";
pub const ENV_LOG_LEVEL: &str = "CREDIT_LOG_LEVEL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CoreConfig {
    pub models: ModelsConfig,
    pub batch: BatchConfig,
    pub logging: LoggingConfig,
}

/// Where artifact bundles live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub directory: PathBuf,
    /// Restrict bundle resolution to one model kind, e.g. `random_forest`
    pub bundle_prefix: Option<String>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("models"),
            bundle_prefix: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub max_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_size: MAX_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl CoreConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| CreditCoreError::Config(format!("failed to parse config: {}", e)))
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            CreditCoreError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Defaults or file, then environment overrides, then validation
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load_from_file(p)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_MODELS_DIR) {
            self.models.directory = PathBuf::from(dir);
        }
        if let Some(prefix) = lookup(ENV_BUNDLE_PREFIX) {
            self.models.bundle_prefix = Some(prefix).filter(|p| !p.is_empty());
        }
        if let Some(raw) = lookup(ENV_MAX_BATCH_SIZE) {
            self.batch.max_size = raw.trim().parse().map_err(|_| {
                CreditCoreError::Config(format!("{} is not a count: '{}'", ENV_MAX_BATCH_SIZE, raw))
            })?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch.max_size == 0 || self.batch.max_size > MAX_BATCH_SIZE {
            return Err(CreditCoreError::Config(format!(
                "batch.max_size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, self.batch.max_size
            )));
        }
        if self.models.directory.as_os_str().is_empty() {
            return Err(CreditCoreError::Config("models.directory is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn defaults_are_valid() {
        let config = CoreConfig::default();
        assert_eq!(config.batch.max_size, 100);
        assert_eq!(config.models.directory, PathBuf::from("models"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = CoreConfig::from_toml_str("[batch]\nmax_size = 25\n").unwrap();
        assert_eq!(config.batch.max_size, 25);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            (ENV_MODELS_DIR, "/srv/models"),
            (ENV_BUNDLE_PREFIX, "random_forest"),
            (ENV_MAX_BATCH_SIZE, "10"),
        ]
        .into_iter()
        .collect();

        let mut config = CoreConfig::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.models.directory, PathBuf::from("/srv/models"));
        assert_eq!(config.models.bundle_prefix.as_deref(), Some("random_forest"));
        assert_eq!(config.batch.max_size, 10);
    }

    #[test]
    fn malformed_batch_size_is_a_config_error() {
        let mut config = CoreConfig::default();
        let err = config
            .apply_overrides(|k| (k == ENV_MAX_BATCH_SIZE).then(|| "many".to_string()))
            .unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn batch_ceiling_is_enforced() {
        let mut config = CoreConfig::default();
        config.batch.max_size = 0;
        assert!(config.validate().is_err());
        config.batch.max_size = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credit.toml");
        std::fs::write(&path, "[models]\ndirectory = \"bundles\"\n\n[logging]\njson = true\n").unwrap();

        let config = CoreConfig::load_from_file(&path).unwrap();
        assert_eq!(config.models.directory, PathBuf::from("bundles"));
        assert!(config.logging.json);
    }
}
