//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `alarmhub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;

const CONFIG_FILE: &str = "alarmhub.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage backend settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Default data settings.
    pub seed: SeedConfig,
    /// Startup report settings.
    pub report: ReportConfig,
}

/// Which repository implementation backs the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    Memory,
}

/// Storage configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: Backend,
    /// `SQLite` connection URL; ignored by the memory backend.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Default data configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Write the default holidays, actions and alarms into an empty repository.
    pub enabled: bool,
}

/// Startup report configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// How many upcoming days and alarms to log.
    pub limit: usize,
}

impl Config {
    /// Load configuration from `alarmhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file(CONFIG_FILE)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("ALARMHUB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("ALARMHUB_BACKEND") {
            match val.as_str() {
                "sqlite" => self.database.backend = Backend::Sqlite,
                "memory" => self.database.backend = Backend::Memory,
                _ => {}
            }
        }
        if let Some(val) = var("ALARMHUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("ALARMHUB_SEED") {
            match val.as_str() {
                "1" | "true" => self.seed.enabled = true,
                "0" | "false" => self.seed.enabled = false,
                _ => {}
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.backend == Backend::Sqlite && self.database.url.is_empty() {
            return Err(ConfigError::Validation(
                "database url must not be empty".to_string(),
            ));
        }
        if self.report.limit == 0 {
            return Err(ConfigError::Validation(
                "report limit must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Sqlite,
            url: "sqlite:alarmhub.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "alarmhubd=info,alarmhub_app=info,alarmhub_domain=info".to_string(),
        }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { limit: 10 }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.database.backend, Backend::Sqlite);
        assert_eq!(config.database.url, "sqlite:alarmhub.db?mode=rwc");
        assert!(config.seed.enabled);
        assert_eq!(config.report.limit, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.report.limit, 10);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [database]
            backend = 'memory'
            url = 'sqlite:test.db'

            [logging]
            filter = 'debug'

            [seed]
            enabled = false

            [report]
            limit = 3
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.database.backend, Backend::Memory);
        assert_eq!(config.database.url, "sqlite:test.db");
        assert_eq!(config.logging.filter, "debug");
        assert!(!config.seed.enabled);
        assert_eq!(config.report.limit, 3);
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let toml = "
            [seed]
            enabled = false
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert!(!config.seed.enabled);
        assert_eq!(config.database.url, "sqlite:alarmhub.db?mode=rwc");
    }

    #[test]
    fn should_report_parse_error_for_unknown_backend() {
        let result: Result<Config, _> = toml::from_str("[database]\nbackend = 'postgres'");
        assert!(result.is_err());
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.report.limit, 10);
    }

    #[test]
    fn should_apply_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(env(&[
            ("ALARMHUB_DATABASE_URL", "sqlite::memory:"),
            ("ALARMHUB_BACKEND", "memory"),
            ("ALARMHUB_LOG", "warn"),
            ("ALARMHUB_SEED", "false"),
        ]));
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.backend, Backend::Memory);
        assert_eq!(config.logging.filter, "warn");
        assert!(!config.seed.enabled);
    }

    #[test]
    fn should_prefer_rust_log_over_alarmhub_log() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("ALARMHUB_LOG", "warn"), ("RUST_LOG", "trace")]));
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_ignore_unrecognised_override_values() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("ALARMHUB_SEED", "maybe"), ("ALARMHUB_BACKEND", "redis")]));
        assert!(config.seed.enabled);
        assert_eq!(config.database.backend, Backend::Sqlite);
    }

    #[test]
    fn should_reject_empty_sqlite_url() {
        let mut config = Config::default();
        config.database.url = String::new();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        config.database.backend = Backend::Memory;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_reject_zero_report_limit() {
        let mut config = Config::default();
        config.report.limit = 0;
        assert!(config.validate().is_err());
    }
}
