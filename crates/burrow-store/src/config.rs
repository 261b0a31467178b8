//! Connection settings for the Redis record store.

use std::fmt::{Display, Formatter};
use std::time::Duration;
use thiserror::Error;
use typed_builder::TypedBuilder;
use url::Url;

/// How multi-step writes are issued to Redis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// One command per step, exactly as the record layout is described:
    /// `HSETNX`, then `HSET` for the metadata, then `PEXPIRE`; `EXISTS`, then
    /// `HINCRBY`. A failure between steps leaves the earlier steps applied.
    #[default]
    Stepwise,
    /// The same steps run server-side in a single Lua script, so no other
    /// client can observe a half-written record.
    Scripted,
}

impl Display for WriteMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteMode::Stepwise => write!(f, "stepwise"),
            WriteMode::Scripted => write!(f, "scripted"),
        }
    }
}

/// Configuration for [`RedisStore`](crate::RedisStore) with typed builder.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use burrow_store::RedisConfig;
///
/// let config = RedisConfig::builder()
///     .host("redis.internal")
///     .password(Some("s3cret".to_string()))
///     .call_timeout(Duration::from_secs(2))
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct RedisConfig {
    #[builder(default = "127.0.0.1".to_string(), setter(into))]
    pub host: String,

    #[builder(default = 6379)]
    pub port: u16,

    #[builder(default)]
    pub password: Option<String>,

    /// Logical database index.
    #[builder(default = 0)]
    pub database: i64,

    /// Maximum number of pooled connections.
    #[builder(default = 16)]
    pub pool_size: usize,

    /// Upper bound for every round trip, including waiting for a pooled
    /// connection.
    #[builder(default = Duration::from_secs(5))]
    pub call_timeout: Duration,

    #[builder(default = "short:url:".to_string(), setter(into))]
    pub key_prefix: String,

    #[builder(default)]
    pub write_mode: WriteMode,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RedisConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.database < 0 {
            return Err(ConfigError::InvalidDatabase(self.database));
        }
        if self.pool_size == 0 {
            return Err(ConfigError::InvalidPoolSize);
        }
        if self.call_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        if self.key_prefix.is_empty() {
            return Err(ConfigError::EmptyKeyPrefix);
        }

        self.connection_url().map(|_| ())
    }

    /// Renders the `redis://` URL the connection pool is built from.
    pub fn connection_url(&self) -> Result<String, ConfigError> {
        let mut url = Url::parse(&format!(
            "redis://{}:{}/{}",
            self.host, self.port, self.database
        ))
        .map_err(|e| ConfigError::InvalidHost(format!("{}: {e}", self.host)))?;

        if let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) {
            url.set_password(Some(password))
                .map_err(|()| ConfigError::InvalidHost(self.host.clone()))?;
        }

        Ok(url.into())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("redis host must not be empty")]
    EmptyHost,
    #[error("invalid redis host: {0}")]
    InvalidHost(String),
    #[error("redis port must not be 0")]
    InvalidPort,
    #[error("redis database index must be >= 0, got {0}")]
    InvalidDatabase(i64),
    #[error("redis pool size must be at least 1")]
    InvalidPoolSize,
    #[error("redis call timeout must be greater than zero")]
    InvalidTimeout,
    #[error("redis key prefix must not be empty")]
    EmptyKeyPrefix,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RedisConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 6379);
        assert_eq!(config.database, 0);
        assert_eq!(config.pool_size, 16);
        assert_eq!(config.call_timeout, Duration::from_secs(5));
        assert_eq!(config.key_prefix, "short:url:");
        assert_eq!(config.write_mode, WriteMode::Stepwise);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_connection_url_without_password() {
        let config = RedisConfig::builder().host("cache").port(6380).database(2).build();
        assert_eq!(config.connection_url().unwrap(), "redis://cache:6380/2");
    }

    #[test]
    fn test_connection_url_encodes_password() {
        let config = RedisConfig::builder()
            .password(Some("p@ss:word/1".to_string()))
            .build();
        assert_eq!(
            config.connection_url().unwrap(),
            "redis://:p%40ss%3Aword%2F1@127.0.0.1:6379/0"
        );
    }

    #[test]
    fn test_empty_password_is_ignored() {
        let config = RedisConfig::builder().password(Some(String::new())).build();
        assert_eq!(config.connection_url().unwrap(), "redis://127.0.0.1:6379/0");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cases = [
            (RedisConfig::builder().host(" ").build(), ConfigError::EmptyHost),
            (RedisConfig::builder().port(0).build(), ConfigError::InvalidPort),
            (
                RedisConfig::builder().database(-1).build(),
                ConfigError::InvalidDatabase(-1),
            ),
            (
                RedisConfig::builder().pool_size(0).build(),
                ConfigError::InvalidPoolSize,
            ),
            (
                RedisConfig::builder().call_timeout(Duration::ZERO).build(),
                ConfigError::InvalidTimeout,
            ),
            (
                RedisConfig::builder().key_prefix("").build(),
                ConfigError::EmptyKeyPrefix,
            ),
        ];

        for (config, expected) in cases {
            assert_eq!(config.validate().unwrap_err(), expected);
        }
    }

    #[test]
    fn test_validate_rejects_unparsable_host() {
        let config = RedisConfig::builder().host("bad host").build();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidHost(_))
        ));
    }
}
