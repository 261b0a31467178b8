use async_trait::async_trait;
use burrow_core::{
    CreateError, LookupError, RecordStore, RecordTtl, ShortCode, StoreError, UrlStats,
};
use deadpool_redis::redis::{self, AsyncCommands, RedisResult};
use deadpool_redis::{Connection, Pool, PoolConfig, Runtime};
use jiff::{SignedDuration, Timestamp};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::config::{RedisConfig, WriteMode};
use crate::error::{elapsed, map_pool_error, map_redis_error, ConnectError};

const FIELD_URL: &str = "url";
const FIELD_CREATED_AT: &str = "created_at";
const FIELD_VISITS: &str = "visits";

/// Reserve, populate and expire a record in one server-side step.
///
/// KEYS[1] record key; ARGV[1] url, ARGV[2] created_at, ARGV[3] ttl in ms.
const CREATE_SCRIPT: &str = r"
if redis.call('HSETNX', KEYS[1], 'url', ARGV[1]) == 0 then
  return 0
end
redis.call('HSET', KEYS[1], 'created_at', ARGV[2], 'visits', 0)
local ttl = tonumber(ARGV[3])
if ttl > 0 then
  redis.call('PEXPIRE', KEYS[1], ttl)
end
return 1
";

/// Increment only a record that exists. Returns -1 for a missing key.
const INCREMENT_SCRIPT: &str = r"
if redis.call('EXISTS', KEYS[1]) == 0 then
  return -1
end
return redis.call('HINCRBY', KEYS[1], 'visits', 1)
";

/// A Redis-backed implementation of [`RecordStore`].
///
/// Each code is one hash at `{key_prefix}{code}` with the fields `url`,
/// `created_at` (RFC 3339, UTC, nanosecond precision) and `visits`. Expiry
/// uses the native key TTL. Connections come from a shared pool; no two calls
/// of one operation are assumed to run on the same connection.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
    key_prefix: String,
    call_timeout: Duration,
    write_mode: WriteMode,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("key_prefix", &self.key_prefix)
            .field("call_timeout", &self.call_timeout)
            .field("write_mode", &self.write_mode)
            .finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Validates `config`, builds the connection pool and checks that the
    /// server answers.
    pub async fn connect(config: RedisConfig) -> Result<Self, ConnectError> {
        config.validate()?;

        let mut pool_config = deadpool_redis::Config::from_url(config.connection_url()?);
        pool_config.pool = Some(PoolConfig::new(config.pool_size));

        let pool = pool_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StoreError::Unavailable(format!("failed to create redis pool: {e}")))?;

        let store = Self::from_pool(pool, &config);
        store.ping().await?;

        info!(
            host = %config.host,
            port = config.port,
            database = config.database,
            pool_size = config.pool_size,
            write_mode = %config.write_mode,
            "connected to redis"
        );
        Ok(store)
    }

    /// Wraps an existing pool. `config` supplies the key prefix, call
    /// timeout and write mode; its connection fields are ignored.
    pub fn from_pool(pool: Pool, config: &RedisConfig) -> Self {
        Self {
            pool,
            key_prefix: config.key_prefix.clone(),
            call_timeout: config.call_timeout,
            write_mode: config.write_mode,
        }
    }

    /// Round-trips a `PING`.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let _pong: String = self
            .bounded("failed to ping redis", redis::cmd("PING").query_async(&mut conn))
            .await?;
        Ok(())
    }

    /// Generates the storage key for a short code.
    fn record_key(&self, code: &ShortCode) -> String {
        format!("{}{}", self.key_prefix, code.as_str())
    }

    async fn connection(&self) -> Result<Connection, StoreError> {
        const OPERATION: &str = "failed to get redis connection";
        match tokio::time::timeout(self.call_timeout, self.pool.get()).await {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(e)) => Err(map_pool_error(OPERATION, e)),
            Err(_) => Err(elapsed(OPERATION, self.call_timeout)),
        }
    }

    /// Runs one Redis round trip under the configured call timeout.
    async fn bounded<T>(
        &self,
        operation: &str,
        call: impl Future<Output = RedisResult<T>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(map_redis_error(operation, e)),
            Err(_) => Err(elapsed(operation, self.call_timeout)),
        }
    }

    async fn create_stepwise(
        &self,
        conn: &mut Connection,
        code: &ShortCode,
        key: &str,
        long_url: &str,
        created_at: &str,
        ttl_ms: Option<i64>,
    ) -> Result<(), CreateError> {
        let created: bool = self
            .bounded("failed to create short url", conn.hset_nx(key, FIELD_URL, long_url))
            .await?;
        if !created {
            return Err(CreateError::Conflict(code.to_string()));
        }

        // The code is ours from here on; later failures are store errors and
        // leave the partially written record in place.
        let _: () = self
            .bounded(
                "failed to write short url metadata",
                conn.hset_multiple(key, &[(FIELD_CREATED_AT, created_at), (FIELD_VISITS, "0")]),
            )
            .await
            .inspect_err(|e| warn!(code = %code, error = %e, "Record left without metadata"))?;

        if let Some(ttl_ms) = ttl_ms {
            let _: () = self
                .bounded("failed to set short url ttl", conn.pexpire(key, ttl_ms))
                .await
                .inspect_err(|e| warn!(code = %code, error = %e, "Record left without ttl"))?;
        }

        Ok(())
    }

    async fn create_scripted(
        &self,
        conn: &mut Connection,
        code: &ShortCode,
        key: &str,
        long_url: &str,
        created_at: &str,
        ttl_ms: Option<i64>,
    ) -> Result<(), CreateError> {
        let created: i64 = self
            .bounded(
                "failed to create short url",
                redis::cmd("EVAL")
                    .arg(CREATE_SCRIPT)
                    .arg(1)
                    .arg(key)
                    .arg(long_url)
                    .arg(created_at)
                    .arg(ttl_ms.unwrap_or(0))
                    .query_async(conn),
            )
            .await?;

        if created == 0 {
            return Err(CreateError::Conflict(code.to_string()));
        }
        Ok(())
    }
}

/// Converts a TTL into whole milliseconds for `PEXPIRE`, never rounding a
/// positive TTL down to zero.
fn ttl_millis(ttl: RecordTtl) -> Option<i64> {
    ttl.duration()
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX).max(1))
}

/// Builds [`UrlStats`] from a `HGETALL` reply and a `PTTL` reply.
///
/// A remaining TTL of zero or below (no expiry, or already gone) yields no
/// `expires_at`.
fn parse_stats(
    code: &ShortCode,
    mut values: HashMap<String, String>,
    remaining_ttl_ms: i64,
    now: Timestamp,
) -> Result<UrlStats, StoreError> {
    let long_url = values.remove(FIELD_URL).ok_or_else(|| {
        StoreError::InvalidData(format!("record '{code}' has no {FIELD_URL} field"))
    })?;

    let created_at = values
        .get(FIELD_CREATED_AT)
        .ok_or_else(|| {
            StoreError::InvalidData(format!("record '{code}' has no {FIELD_CREATED_AT} field"))
        })?
        .parse::<Timestamp>()
        .map_err(|e| StoreError::InvalidData(format!("parse {FIELD_CREATED_AT}: {e}")))?;

    let visits = values
        .get(FIELD_VISITS)
        .ok_or_else(|| {
            StoreError::InvalidData(format!("record '{code}' has no {FIELD_VISITS} field"))
        })?
        .parse::<i64>()
        .map_err(|e| StoreError::InvalidData(format!("parse {FIELD_VISITS}: {e}")))?;

    let expires_at = (remaining_ttl_ms > 0)
        .then(|| now.checked_add(SignedDuration::from_millis(remaining_ttl_ms)).ok())
        .flatten();

    Ok(UrlStats {
        code: code.clone(),
        long_url,
        created_at,
        visits,
        expires_at,
    })
}

#[async_trait]
impl RecordStore for RedisStore {
    async fn create_if_absent(
        &self,
        code: &ShortCode,
        long_url: &str,
        ttl: RecordTtl,
    ) -> Result<(), CreateError> {
        let key = self.record_key(code);
        let created_at = format!("{:.9}", Timestamp::now());
        let ttl_ms = ttl_millis(ttl);
        trace!(code = %code, mode = %self.write_mode, "Creating record in Redis");

        let mut conn = self.connection().await?;
        let result = match self.write_mode {
            WriteMode::Stepwise => {
                self.create_stepwise(&mut conn, code, &key, long_url, &created_at, ttl_ms)
                    .await
            }
            WriteMode::Scripted => {
                self.create_scripted(&mut conn, code, &key, long_url, &created_at, ttl_ms)
                    .await
            }
        };

        match &result {
            Ok(()) => debug!(code = %code, ttl_ms = ?ttl_ms, "Created record in Redis"),
            Err(CreateError::Conflict(_)) => debug!(code = %code, "Short code already taken"),
            Err(CreateError::Store(e)) => warn!(code = %code, error = %e, "Failed to create record"),
        }
        result
    }

    async fn get_long_url(&self, code: &ShortCode) -> Result<String, LookupError> {
        let key = self.record_key(code);
        trace!(code = %code, "Fetching long url from Redis");

        let mut conn = self.connection().await?;
        let url: Option<String> = self
            .bounded("failed to get long url", conn.hget(&key, FIELD_URL))
            .await?;

        url.ok_or_else(|| LookupError::NotFound(code.to_string()))
    }

    async fn increment_visits(&self, code: &ShortCode) -> Result<i64, LookupError> {
        let key = self.record_key(code);
        trace!(code = %code, "Incrementing visits in Redis");

        let mut conn = self.connection().await?;
        let visits: i64 = match self.write_mode {
            WriteMode::Stepwise => {
                // HINCRBY on a missing key would create it, so check first.
                let exists: bool = self
                    .bounded("failed to check short code exists", conn.exists(&key))
                    .await?;
                if !exists {
                    return Err(LookupError::NotFound(code.to_string()));
                }
                self.bounded(
                    "failed to increment visits",
                    conn.hincr(&key, FIELD_VISITS, 1_i64),
                )
                .await?
            }
            WriteMode::Scripted => {
                let visits: i64 = self
                    .bounded(
                        "failed to increment visits",
                        redis::cmd("EVAL")
                            .arg(INCREMENT_SCRIPT)
                            .arg(1)
                            .arg(&key)
                            .query_async(&mut conn),
                    )
                    .await?;
                if visits < 0 {
                    return Err(LookupError::NotFound(code.to_string()));
                }
                visits
            }
        };

        debug!(code = %code, visits, "Incremented visits");
        Ok(visits)
    }

    async fn get_stats(&self, code: &ShortCode) -> Result<UrlStats, LookupError> {
        let key = self.record_key(code);
        trace!(code = %code, "Fetching stats from Redis");

        let mut conn = self.connection().await?;
        let values: HashMap<String, String> = self
            .bounded("failed to get stats", conn.hgetall(&key))
            .await?;
        if values.is_empty() {
            return Err(LookupError::NotFound(code.to_string()));
        }

        let remaining_ttl_ms: i64 = self
            .bounded("failed to get ttl", conn.pttl(&key))
            .await?;

        parse_stats(code, values, remaining_ttl_ms, Timestamp::now()).map_err(|e| {
            warn!(code = %code, error = %e, "Stored record is malformed");
            LookupError::Store(e)
        })
    }

    async fn delete(&self, code: &ShortCode) -> Result<(), LookupError> {
        let key = self.record_key(code);
        trace!(code = %code, "Deleting record from Redis");

        let mut conn = self.connection().await?;
        let removed: i64 = self
            .bounded("failed to delete short url", conn.del(&key))
            .await?;
        if removed == 0 {
            return Err(LookupError::NotFound(code.to_string()));
        }

        debug!(code = %code, "Deleted record from Redis");
        Ok(())
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool, StoreError> {
        let key = self.record_key(code);
        let mut conn = self.connection().await?;
        self.bounded("failed to check short code exists", conn.exists(&key))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> ShortCode {
        ShortCode::new_unchecked(s)
    }

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn stats_without_ttl_have_no_expiry() {
        let now = Timestamp::now();
        for remaining in [-2, -1, 0] {
            let stats = parse_stats(
                &code("abc1234"),
                fields(&[
                    ("url", "https://example.com"),
                    ("created_at", "2024-05-01T10:00:00.123456789Z"),
                    ("visits", "4"),
                ]),
                remaining,
                now,
            )
            .unwrap();

            assert_eq!(stats.long_url, "https://example.com");
            assert_eq!(stats.visits, 4);
            assert_eq!(stats.expires_at, None);
            assert_eq!(
                stats.created_at,
                "2024-05-01T10:00:00.123456789Z".parse::<Timestamp>().unwrap()
            );
        }
    }

    #[test]
    fn stats_expiry_is_now_plus_remaining_ttl() {
        let now = Timestamp::now();
        let stats = parse_stats(
            &code("abc1234"),
            fields(&[
                ("url", "https://example.com"),
                ("created_at", "2024-05-01T10:00:00Z"),
                ("visits", "0"),
            ]),
            90_000,
            now,
        )
        .unwrap();

        assert_eq!(
            stats.expires_at,
            Some(now.checked_add(SignedDuration::from_secs(90)).unwrap())
        );
    }

    #[test]
    fn record_without_metadata_is_invalid_data() {
        let err = parse_stats(
            &code("half123"),
            fields(&[("url", "https://example.com")]),
            -1,
            Timestamp::now(),
        )
        .unwrap_err();

        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    #[test]
    fn unparsable_visits_are_invalid_data() {
        let err = parse_stats(
            &code("bad1234"),
            fields(&[
                ("url", "https://example.com"),
                ("created_at", "2024-05-01T10:00:00Z"),
                ("visits", "many"),
            ]),
            -1,
            Timestamp::now(),
        )
        .unwrap_err();

        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    #[test]
    fn ttl_is_rendered_in_milliseconds() {
        assert_eq!(ttl_millis(RecordTtl::NEVER), None);
        assert_eq!(
            ttl_millis(RecordTtl::after(Duration::from_secs(3600))),
            Some(3_600_000)
        );
        assert_eq!(ttl_millis(RecordTtl::after(Duration::from_micros(10))), Some(1));
    }

    #[tokio::test]
    async fn connect_rejects_invalid_config_before_dialing() {
        let err = RedisStore::connect(RedisConfig::builder().pool_size(0).build())
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectError::Config(_)));
    }

    #[tokio::test]
    async fn connect_fails_when_server_is_unreachable() {
        let config = RedisConfig::builder()
            .port(1)
            .call_timeout(Duration::from_millis(500))
            .build();

        let err = RedisStore::connect(config).await.unwrap_err();
        // a refused dial surfaces through the pool as a backend error
        assert!(matches!(
            err,
            ConnectError::Store(StoreError::Unavailable(_) | StoreError::Timeout(_))
        ));
    }
}
