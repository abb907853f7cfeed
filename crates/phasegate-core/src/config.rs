//! Engine configuration.
//!
//! Loaded from TOML. Search order for [`EngineConfig::load`]:
//!
//! 1. `$PHASEGATE_CONFIG`
//! 2. `./phasegate.toml`
//! 3. built-in defaults
//!
//! A file that exists but fails to load is logged and skipped.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn, Level};

use crate::event_log::DEFAULT_LOG_CAPACITY;
use crate::executor::ExecutorConfig;

pub const CONFIG_ENV_VAR: &str = "PHASEGATE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "phasegate.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config i/o error ({path}): {1}", path = .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("config parse error ({path}): {1}", path = .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {}", .0.join("; "))]
    Validation(Vec<String>),
}

/// Tracing output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Newline-delimited JSON instead of human-readable lines.
    pub json: bool,
    /// Default level when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json: false,
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Parsed level, falling back to `INFO` for unrecognized names.
    pub fn level(&self) -> Level {
        Level::from_str(&self.level).unwrap_or(Level::INFO)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum entries retained by the build event log.
    pub log_capacity: usize,
    pub executor: ExecutorConfig,
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_capacity: DEFAULT_LOG_CAPACITY,
            executor: ExecutorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load using the search order in the module docs. Never fails.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = Path::new(&path);
            if p.exists() {
                match Self::load_from_file(p) {
                    Ok(config) => {
                        info!(path = %p.display(), "loaded config from {CONFIG_ENV_VAR}");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "failed to load config from {CONFIG_ENV_VAR}, falling back");
                    }
                }
            } else {
                warn!(path = %path, "{CONFIG_ENV_VAR} points to a missing file, falling back");
            }
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(local) {
                Ok(config) => {
                    info!("loaded config from ./{DEFAULT_CONFIG_FILE}");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "failed to load ./{DEFAULT_CONFIG_FILE}, using defaults");
                }
            }
        }

        info!("no config file found, using built-in defaults");
        Self::default()
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Collects every problem rather than stopping at the first.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.log_capacity == 0 {
            errors.push("log_capacity must be at least 1".to_string());
        }
        let ex = &self.executor;
        if !(0.0..=1.0).contains(&ex.pass_ratio) {
            errors.push(format!(
                "executor.pass_ratio must be within 0.0..=1.0, got {}",
                ex.pass_ratio
            ));
        }
        if !(0.0..=100.0).contains(&ex.reported_coverage) {
            errors.push(format!(
                "executor.reported_coverage must be within 0..=100, got {}",
                ex.reported_coverage
            ));
        }
        if ex.source_dir.is_empty() {
            errors.push("executor.source_dir must not be empty".to_string());
        }
        if Level::from_str(&self.logging.level).is_err() {
            errors.push(format!("logging.level {:?} is not a level", self.logging.level));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.log_capacity, 1000);
        assert_eq!(config.logging.level(), Level::INFO);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            log_capacity = 50

            [executor]
            simulated_latency_ms = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.log_capacity, 50);
        assert_eq!(config.executor.simulated_latency_ms, 0);
        assert_eq!(config.executor.source_dir, "src/");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = EngineConfig::default();
        config.log_capacity = 0;
        config.executor.pass_ratio = 1.5;
        config.logging.level = "loud".to_string();
        match config.validate() {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_to_toml_round_trips() {
        let mut config = EngineConfig::default();
        config.logging.json = true;
        let text = config.to_toml().unwrap();
        let back: EngineConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
