use burrow_core::StoreError;
use deadpool_redis::redis::RedisError;
use deadpool_redis::PoolError;
use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while building a [`RedisStore`](crate::RedisStore).
#[derive(Debug, Clone, Error)]
pub enum ConnectError {
    #[error("invalid redis configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub(crate) fn map_redis_error(operation: &str, err: RedisError) -> StoreError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() || is_timeout_message(&message) {
        StoreError::Timeout(message)
    } else if err.is_connection_refusal() || err.is_connection_dropped() {
        StoreError::Unavailable(message)
    } else {
        StoreError::Operation(message)
    }
}

pub(crate) fn map_pool_error(operation: &str, err: PoolError) -> StoreError {
    match err {
        PoolError::Backend(e) => map_redis_error(operation, e),
        PoolError::Timeout(_) => StoreError::Timeout(format!("{operation}: {err}")),
        other => {
            let message = format!("{operation}: {other}");
            if is_timeout_message(&message) {
                StoreError::Timeout(message)
            } else {
                StoreError::Unavailable(message)
            }
        }
    }
}

pub(crate) fn elapsed(operation: &str, limit: Duration) -> StoreError {
    StoreError::Timeout(format!("{operation}: no reply within {}ms", limit.as_millis()))
}

fn is_timeout_message(message: &str) -> bool {
    message.to_ascii_lowercase().contains("timed out")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_messages_are_detected() {
        assert!(is_timeout_message("failed to read record: Operation TIMED OUT"));
        assert!(!is_timeout_message("failed to read record: WRONGTYPE"));
    }

    #[test]
    fn refused_connection_is_unavailable() {
        let err = RedisError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert!(matches!(
            map_redis_error("failed to ping redis", err),
            StoreError::Unavailable(_)
        ));
    }

    #[test]
    fn elapsed_is_a_timeout() {
        let err = elapsed("failed to delete record", Duration::from_millis(250));
        assert_eq!(
            err,
            StoreError::Timeout("failed to delete record: no reply within 250ms".to_string())
        );
    }
}
