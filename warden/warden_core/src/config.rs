//! Configuration.
//!
//! Configuration is a plain value loaded from TOML. Every field has a
//! default, so an empty document is a valid configuration.

use std::path::Path;
use std::time::Duration;
use serde::{Serialize, Deserialize};

use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use crate::Result;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// Verdict cache tuning.
    pub cache: CacheConfig,

    /// Logging setup.
    pub logging: LoggingConfig,
}

impl WardenConfig {
    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache.validate()
    }
}

/// Verdict cache tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Sliding expiry window in seconds. An entry not read or written for
    /// this long is discarded.
    pub expire_after_access_secs: u64,

    /// Number of shards in the per-principal map. Must be a power of two
    /// greater than one.
    pub shard_amount: usize,
}

impl CacheConfig {
    /// Default sliding expiry window: five minutes.
    pub const DEFAULT_EXPIRE_AFTER_ACCESS_SECS: u64 = 300;

    /// Default shard amount.
    pub const DEFAULT_SHARD_AMOUNT: usize = 16;

    /// The sliding expiry window.
    pub fn expire_after_access(&self) -> Duration {
        Duration::from_secs(self.expire_after_access_secs)
    }

    /// Check that the values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.expire_after_access_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "cache.expire_after_access_secs",
                reason: "must be greater than zero".into(),
            });
        }

        if self.shard_amount < 2 || !self.shard_amount.is_power_of_two() {
            return Err(ConfigError::Invalid {
                field: "cache.shard_amount",
                reason: format!("{} is not a power of two greater than one", self.shard_amount),
            });
        }

        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            expire_after_access_secs: Self::DEFAULT_EXPIRE_AFTER_ACCESS_SECS,
            shard_amount: Self::DEFAULT_SHARD_AMOUNT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::logging::LogLevel;
    use std::io::Write;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = WardenConfig::from_toml_str("").unwrap();
        assert_eq!(config, WardenConfig::default());
        assert_eq!(config.cache.expire_after_access(), Duration::from_secs(300));
    }

    #[test]
    fn test_partial_document() {
        let config = WardenConfig::from_toml_str(
            r#"
            [cache]
            expire_after_access_secs = 30

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.expire_after_access_secs, 30);
        assert_eq!(config.cache.shard_amount, CacheConfig::DEFAULT_SHARD_AMOUNT);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(!config.logging.json);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = WardenConfig::from_toml_str("[cache]\nexpire_after_access_secs = 0").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Invalid { .. })));

        let err = WardenConfig::from_toml_str("[cache]\nshard_amount = 12").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Invalid { field: "cache.shard_amount", .. })));

        let err = WardenConfig::from_toml_str("[cache]\nshard_amount = \"many\"").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cache]\nshard_amount = 4").unwrap();

        let config = WardenConfig::from_file(file.path()).unwrap();
        assert_eq!(config.cache.shard_amount, 4);

        let missing = WardenConfig::from_file("/nonexistent/warden.toml");
        assert!(matches!(missing, Err(Error::Io(_))));
    }
}
