//! Server configuration.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults; a local `.env` file is honored in development (see
//! `main.rs`).

use std::env;
use std::path::PathBuf;

/// Which storage backend to construct at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// SQLite file (production default).
    Sqlite,
    /// In-memory store: nothing durable, handy for demos and tests.
    Memory,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub port: u16,

    /// Storage backend selection
    pub backend: Backend,

    /// SQLite database path (ignored for the memory backend)
    pub database_path: PathBuf,

    /// Soft-deleted rows older than this many days are purged
    pub purge_retention_days: i64,

    /// How often the purge task runs, in hours
    pub purge_interval_hours: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let backend = match env::var("STORE")
            .unwrap_or_else(|_| "sqlite".to_string())
            .to_lowercase()
            .as_str()
        {
            "sqlite" => Backend::Sqlite,
            "memory" => Backend::Memory,
            _ => return Err(ConfigError::InvalidValue("STORE".to_string())),
        };

        let config = ServerConfig {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,

            backend,

            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./till.db".to_string())
                .into(),

            purge_retention_days: env::var("PURGE_RETENTION_DAYS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PURGE_RETENTION_DAYS".to_string()))?,

            purge_interval_hours: env::var("PURGE_INTERVAL_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PURGE_INTERVAL_HOURS".to_string()))?,
        };

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

// =============================================================================
// Unit Tests
// =============================================================================
//
// Env-var tests mutate process state, so each one uses its own variable
// and restores it; the defaults test runs against unset variables.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        // Only meaningful when the variables are unset, which is the
        // normal test environment
        if env::var("PORT").is_err() && env::var("STORE").is_err() {
            let config = ServerConfig::load().unwrap();
            assert_eq!(config.port, 8080);
            assert_eq!(config.backend, Backend::Sqlite);
            assert_eq!(config.purge_retention_days, 30);
            assert_eq!(config.purge_interval_hours, 24);
        }
    }
}
