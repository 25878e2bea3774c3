//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Environment (development, production)
    pub environment: String,

    /// Seconds between two runs of the overdue-transaction sweep
    pub late_sweep_interval_secs: u64,

    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let late_sweep_interval_secs = env::var("LATE_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::InvalidValue("LATE_SWEEP_INTERVAL_SECS"))?;

        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("text") | Err(_) => LogFormat::Text,
            Ok(_) => return Err(ConfigError::InvalidValue("LOG_FORMAT")),
        };

        Ok(Self {
            database_url,
            database_max_connections,
            environment,
            late_sweep_interval_secs,
            log_format,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Log filter used when `RUST_LOG` is not set
    pub fn default_log_filter(&self) -> &'static str {
        if self.is_production() {
            "budget_core=info"
        } else {
            "budget_core=debug"
        }
    }

    pub fn late_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.late_sweep_interval_secs)
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(environment: &str) -> Config {
        Config {
            database_url: "postgres://localhost/budget".to_string(),
            database_max_connections: 10,
            environment: environment.to_string(),
            late_sweep_interval_secs: 300,
            log_format: LogFormat::Text,
        }
    }

    #[test]
    fn test_production_logs_at_info() {
        let production = config("production");
        assert!(production.is_production());
        assert_eq!(production.default_log_filter(), "budget_core=info");
    }

    #[test]
    fn test_development_logs_at_debug() {
        let development = config("development");
        assert!(!development.is_production());
        assert_eq!(development.default_log_filter(), "budget_core=debug");
        assert_eq!(development.late_sweep_interval(), Duration::from_secs(300));
    }
}
