//! Storage configuration: database URL and optional log file path.
//! Loaded from the DATABASE_URL and LOG_FILE environment variables.

use anyhow::Result;
use std::env;

/// Minimal storage configuration.
pub struct StorageConfig {
    pub database_url: String,
    pub log_file: Option<String>,
}

impl StorageConfig {
    /// Loads from environment variables: DATABASE_URL is required, LOG_FILE optional.
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL not set"))?;
        let log_file = env::var("LOG_FILE").ok();
        Ok(Self {
            database_url,
            log_file,
        })
    }

    /// Constructs with the given database URL, no log file.
    pub fn with_database_url(database_url: String) -> Self {
        Self {
            database_url,
            log_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_database_url() {
        let config = StorageConfig::with_database_url("sqlite::memory:".to_string());
        assert_eq!(config.database_url, "sqlite::memory:");
        assert!(config.log_file.is_none());
    }
}
