// ⚙️ Configuration - defaults, environment overrides, logging setup

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_DATA_FILE: &str = "data/sample_failed_transactions.csv";
pub const DEFAULT_OUTPUT_FILE: &str = "output/crew_results.csv";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub data_file: PathBuf,
    pub output_file: PathBuf,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub bind_address: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidEnvOverride {
                key: "TXN_LOG_FORMAT".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            server: ServerConfig {
                bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Compact,
            },
        }
    }
}

impl AppConfig {
    /// Defaults overlaid with `TXN_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = get("TXN_DATA_FILE") {
            config.data_file = PathBuf::from(path);
        }
        if let Some(path) = get("TXN_OUTPUT_FILE") {
            config.output_file = PathBuf::from(path);
        }
        if let Some(addr) = get("TXN_BIND_ADDRESS") {
            config.server.bind_address = addr;
        }
        if let Some(level) = get("TXN_LOG_LEVEL") {
            if level.parse::<tracing::Level>().is_err() {
                return Err(ConfigError::InvalidEnvOverride {
                    key: "TXN_LOG_LEVEL".to_string(),
                    value: level,
                });
            }
            config.logging.level = level;
        }
        if let Some(format) = get("TXN_LOG_FORMAT") {
            config.logging.format = format.parse()?;
        }

        Ok(config)
    }
}

/// Install the global tracing subscriber. Logs go to stderr so stdout stays
/// free for command output and the terminal UI.
pub fn init_logging(config: &LoggingConfig) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(log_filter(&config.level, rust_log.as_deref()))
        .with_writer(std::io::stderr);

    match config.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// `RUST_LOG` directives win when set and valid, otherwise the configured level
fn log_filter(level: &str, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .map(str::trim)
        .filter(|directives| !directives.is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.data_file, PathBuf::from(DEFAULT_DATA_FILE));
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("TXN_DATA_FILE", "/tmp/in.csv"),
            ("TXN_OUTPUT_FILE", "/tmp/out.csv"),
            ("TXN_BIND_ADDRESS", "127.0.0.1:8080"),
            ("TXN_LOG_LEVEL", "debug"),
            ("TXN_LOG_FORMAT", "JSON"),
        ]))
        .unwrap();

        assert_eq!(config.data_file, PathBuf::from("/tmp/in.csv"));
        assert_eq!(config.output_file, PathBuf::from("/tmp/out.csv"));
        assert_eq!(config.server.bind_address, "127.0.0.1:8080");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let config = AppConfig::from_lookup(lookup_from(&[("TXN_DATA_FILE", "  ")])).unwrap();
        assert_eq!(config.data_file, PathBuf::from(DEFAULT_DATA_FILE));
    }

    #[test]
    fn test_invalid_overrides() {
        let err = AppConfig::from_lookup(lookup_from(&[("TXN_LOG_FORMAT", "xml")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidEnvOverride {
                key: "TXN_LOG_FORMAT".to_string(),
                value: "xml".to_string()
            }
        );

        let err = AppConfig::from_lookup(lookup_from(&[("TXN_LOG_LEVEL", "loud")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvOverride { ref key, .. } if key == "TXN_LOG_LEVEL"));
    }

    #[test]
    fn test_log_filter_prefers_rust_log() {
        use tracing_subscriber::filter::LevelFilter;

        let filter = log_filter("info", Some("warn"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));

        let filter = log_filter("debug", None);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));

        let filter = log_filter("error", Some("   "));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));
    }
}
