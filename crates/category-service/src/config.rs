//! Service configuration loaded from environment variables.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ServiceError;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ServiceError::InvalidConfig {
                key: "LOG_FORMAT",
                value: other.to_string(),
            }),
        }
    }
}

/// Service configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `METRICS_HOST`: Prometheus listener address (default: `"0.0.0.0"`)
/// - `METRICS_PORT`: Prometheus listener port (default: `9000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `INDEX_POLL_MS`: how often the subcategory index catches up (default: `250`)
#[derive(Debug, Clone)]
pub struct Config {
    pub metrics_host: String,
    pub metrics_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub index_poll: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    ///
    /// Unparseable numbers fall back to their default; an unknown
    /// `LOG_FORMAT` is an error.
    pub fn from_env() -> Result<Self, ServiceError> {
        let defaults = Self::default();
        let log_format = match std::env::var("LOG_FORMAT") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.log_format,
        };

        Ok(Self {
            metrics_host: std::env::var("METRICS_HOST").unwrap_or(defaults.metrics_host),
            metrics_port: std::env::var("METRICS_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.metrics_port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format,
            index_poll: std::env::var("INDEX_POLL_MS")
                .ok()
                .and_then(|ms| ms.parse().ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.index_poll),
        })
    }

    /// Returns the socket address of the metrics listener.
    pub fn metrics_addr(&self) -> Result<SocketAddr, ServiceError> {
        let addr = format!("{}:{}", self.metrics_host, self.metrics_port);
        addr.parse()
            .map_err(|source| ServiceError::InvalidAddress { addr, source })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metrics_host: "0.0.0.0".to_string(),
            metrics_port: 9000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            index_poll: Duration::from_millis(250),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: [&str; 5] = [
        "METRICS_HOST",
        "METRICS_PORT",
        "RUST_LOG",
        "LOG_FORMAT",
        "INDEX_POLL_MS",
    ];

    fn clear_env() {
        for key in KEYS {
            // SAFETY: tests touching the environment are serialized.
            unsafe { std::env::remove_var(key) };
        }
    }

    fn set_env(key: &str, value: &str) {
        // SAFETY: tests touching the environment are serialized.
        unsafe { std::env::set_var(key, value) };
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.metrics_host, "0.0.0.0");
        assert_eq!(config.metrics_port, 9000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.index_poll, Duration::from_millis(250));
    }

    #[test]
    fn test_metrics_addr() {
        let config = Config {
            metrics_host: "127.0.0.1".to_string(),
            metrics_port: 9100,
            ..Config::default()
        };
        assert_eq!(
            config.metrics_addr().unwrap(),
            "127.0.0.1:9100".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_metrics_addr_rejects_hostname() {
        let config = Config {
            metrics_host: "metrics.local".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.metrics_addr(),
            Err(ServiceError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" JSON ".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = Config::from_env().unwrap();
        assert_eq!(config.metrics_port, 9000);
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.index_poll, Duration::from_millis(250));
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        set_env("METRICS_HOST", "127.0.0.1");
        set_env("METRICS_PORT", "9464");
        set_env("RUST_LOG", "debug");
        set_env("LOG_FORMAT", "json");
        set_env("INDEX_POLL_MS", "50");

        let config = Config::from_env().unwrap();
        clear_env();

        assert_eq!(config.metrics_host, "127.0.0.1");
        assert_eq!(config.metrics_port, 9464);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.index_poll, Duration::from_millis(50));
    }

    #[test]
    #[serial]
    fn test_from_env_bad_numbers_fall_back() {
        clear_env();
        set_env("METRICS_PORT", "not-a-port");
        set_env("INDEX_POLL_MS", "0");

        let config = Config::from_env().unwrap();
        clear_env();

        assert_eq!(config.metrics_port, 9000);
        assert_eq!(config.index_poll, Duration::from_millis(250));
    }

    #[test]
    #[serial]
    fn test_from_env_unknown_log_format() {
        clear_env();
        set_env("LOG_FORMAT", "xml");

        let result = Config::from_env();
        clear_env();

        assert!(matches!(
            result,
            Err(ServiceError::InvalidConfig { key: "LOG_FORMAT", .. })
        ));
    }
}
