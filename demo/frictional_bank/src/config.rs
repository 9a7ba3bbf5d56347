//! Demo configuration management.
//!
//! Handles loading of the demo configuration from TOML files with
//! environment variable overrides. Command-line flags are applied last, on
//! top of both.

use pricer_kernel::EvaluatorConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "demo/data/config/demo_config.toml";

/// Upper bound on trades per curve.
pub const MAX_TRADES_PER_CURVE: usize = 1_000_000;

/// Upper bound on scenarios per batch.
pub const MAX_SCENARIOS: usize = 1_000_000;

/// Demo configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    /// Number of swaps booked on each curve
    pub trades_per_curve: usize,

    /// Number of scenarios in the batch run
    pub scenarios: usize,

    /// Seed for portfolio and scenario generation
    pub seed: u64,

    /// Report NPV per currency instead of one total
    pub per_currency: bool,

    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,

    /// Worker pool settings
    pub evaluator: EvaluatorConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            trades_per_curve: 3333,
            scenarios: 100,
            seed: 42,
            per_currency: false,
            log_level: "info".to_string(),
            evaluator: EvaluatorConfig::default(),
        }
    }
}

/// Values given on the command line; `None` keeps the configured value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    /// `--trades`
    pub trades_per_curve: Option<usize>,
    /// `--scenarios`
    pub scenarios: Option<usize>,
    /// `--workers`
    pub workers: Option<usize>,
    /// `--seed`
    pub seed: Option<u64>,
    /// `--per-currency`
    pub per_currency: bool,
}

impl DemoConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load `path`, or the default path if it exists, or fall back to
    /// defaults.
    ///
    /// An explicitly given path must load; the default path is optional.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::load(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Unparseable values are ignored.
    pub fn with_env_override(mut self) -> Self {
        if let Some(trades) = env_parse("DEMO_TRADES") {
            self.trades_per_curve = trades;
        }

        if let Some(scenarios) = env_parse("DEMO_SCENARIOS") {
            self.scenarios = scenarios;
        }

        if let Some(seed) = env_parse("DEMO_SEED") {
            self.seed = seed;
        }

        if let Some(workers) = env_parse("DEMO_WORKERS") {
            self.evaluator = self.evaluator.with_workers(workers);
        }

        if let Ok(per_currency) = std::env::var("DEMO_PER_CURRENCY") {
            self.per_currency = matches!(
                per_currency.to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        if let Ok(log_level) = std::env::var("DEMO_LOG_LEVEL") {
            self.log_level = log_level;
        }

        self
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(trades) = overrides.trades_per_curve {
            self.trades_per_curve = trades;
        }
        if let Some(scenarios) = overrides.scenarios {
            self.scenarios = scenarios;
        }
        if let Some(workers) = overrides.workers {
            self.evaluator = self.evaluator.with_workers(workers);
        }
        if let Some(seed) = overrides.seed {
            self.seed = seed;
        }
        if overrides.per_currency {
            self.per_currency = true;
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.to_lowercase().as_str()) {
            errors.push(format!(
                "Invalid log_level '{}'. Valid values: {:?}",
                self.log_level, valid_log_levels
            ));
        }

        if self.trades_per_curve > MAX_TRADES_PER_CURVE {
            errors.push(format!(
                "trades_per_curve {} exceeds maximum allowed ({})",
                self.trades_per_curve, MAX_TRADES_PER_CURVE
            ));
        }

        if self.scenarios == 0 {
            errors.push("scenarios must be greater than 0".to_string());
        }
        if self.scenarios > MAX_SCENARIOS {
            errors.push(format!(
                "scenarios {} exceeds maximum allowed ({})",
                self.scenarios, MAX_SCENARIOS
            ));
        }

        if let Err(e) = self.evaluator.validate() {
            errors.push(e.to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load, apply environment and command-line overrides, then validate.
    pub fn resolve(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let config = Self::load_or_default(path)?
            .with_env_override()
            .with_overrides(overrides);
        config.validate()?;
        Ok(config)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Configuration error type
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error reading {}: {message}", .path.display())]
    Io {
        /// File that failed to load
        path: PathBuf,
        /// Underlying error
        message: String,
    },

    /// Parse error in config file
    #[error("Parse error: {0}")]
    Parse(String),

    /// Validation error
    #[error("Validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = DemoConfig::default();
        assert_eq!(config.trades_per_curve, 3333);
        assert_eq!(config.seed, 42);
        assert!(!config.per_currency);
    }

    #[test]
    fn test_default_config_validates() {
        assert!(DemoConfig::default().validate().is_ok());
    }

    #[test]
    fn test_env_override() {
        std::env::set_var("DEMO_SCENARIOS", "7");
        let config = DemoConfig::default().with_env_override();
        assert_eq!(config.scenarios, 7);
        std::env::remove_var("DEMO_SCENARIOS");
    }

    #[test]
    fn test_cli_overrides_win() {
        let overrides = ConfigOverrides {
            trades_per_curve: Some(10),
            workers: Some(2),
            per_currency: true,
            ..Default::default()
        };
        let config = DemoConfig::default().with_overrides(&overrides);
        assert_eq!(config.trades_per_curve, 10);
        assert_eq!(config.evaluator.workers(), 2);
        assert!(config.per_currency);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_validate_collects_errors() {
        let mut config = DemoConfig::default();
        config.log_level = "loud".to_string();
        config.scenarios = 0;
        config.evaluator = config.evaluator.with_workers(0);

        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors.len(), 3);
                assert!(errors.iter().any(|e| e.contains("log_level")));
                assert!(errors.iter().any(|e| e.contains("worker")));
            }
            other => panic!("Expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_valid_log_levels() {
        for level in ["trace", "debug", "info", "warn", "error", "INFO"] {
            let config = DemoConfig {
                log_level: level.to_string(),
                ..Default::default()
            };
            assert!(config.validate().is_ok(), "{level} should be valid");
        }
    }

    #[test]
    fn test_load_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "trades_per_curve = 10\nper_currency = true\n\n[evaluator]\nworkers = 3"
        )
        .unwrap();

        let config = DemoConfig::load(file.path()).unwrap();
        assert_eq!(config.trades_per_curve, 10);
        assert!(config.per_currency);
        assert_eq!(config.evaluator.workers(), 3);
        assert_eq!(config.scenarios, 100);
    }

    #[test]
    fn test_load_missing_file() {
        let err = DemoConfig::load(Path::new("/nonexistent/demo.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "trades_per_curve = \"many\"").unwrap();
        assert!(matches!(
            DemoConfig::load(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
