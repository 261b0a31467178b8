use crate::error::{CreateError, LookupError, StoreError};
use crate::record::{RecordTtl, UrlStats};
use crate::shortcode::ShortCode;
use crate::store::RecordStore;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::Timestamp;
use tracing::trace;

/// In-memory storage entry for a short code.
#[derive(Debug, Clone)]
struct Record {
    long_url: String,
    created_at: Timestamp,
    visits: i64,
    expire_at: Option<Timestamp>,
}

impl Record {
    fn is_expired(&self, now: Timestamp) -> bool {
        self.expire_at.is_some_and(|expire_at| now >= expire_at)
    }
}

/// In-memory implementation of [`RecordStore`] using DashMap.
///
/// Creation goes through DashMap's entry API, which holds the shard lock for
/// the whole check-and-insert, so it is as atomic as the Redis `HSETNX` it
/// stands in for. Expired records are dropped lazily when touched.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: DashMap<String, Record>,
}

impl InMemoryStore {
    /// Creates a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory store with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: DashMap::with_capacity(capacity),
        }
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        let now = Timestamp::now();
        self.records
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of the record if it is still live, evicting it otherwise.
    fn live_record(&self, key: &str) -> Option<Record> {
        let now = Timestamp::now();
        let record = self.records.get(key)?.value().clone();

        if record.is_expired(now) {
            self.records.remove_if(key, |_, r| r.is_expired(now));
            return None;
        }

        Some(record)
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn create_if_absent(
        &self,
        code: &ShortCode,
        long_url: &str,
        ttl: RecordTtl,
    ) -> Result<(), CreateError> {
        let now = Timestamp::now();
        let record = Record {
            long_url: long_url.to_owned(),
            created_at: now,
            visits: 0,
            expire_at: ttl.expires_at(now),
        };

        match self.records.entry(code.as_str().to_owned()) {
            Entry::Occupied(mut occupied) => {
                if !occupied.get().is_expired(now) {
                    return Err(CreateError::Conflict(code.to_string()));
                }
                occupied.insert(record);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(record);
            }
        }

        trace!(code = %code, "Created record in memory");
        Ok(())
    }

    async fn get_long_url(&self, code: &ShortCode) -> Result<String, LookupError> {
        self.live_record(code.as_str())
            .map(|record| record.long_url)
            .ok_or_else(|| LookupError::NotFound(code.to_string()))
    }

    async fn increment_visits(&self, code: &ShortCode) -> Result<i64, LookupError> {
        let key = code.as_str();
        let now = Timestamp::now();

        match self.records.get_mut(key) {
            Some(mut record) if !record.is_expired(now) => {
                record.visits += 1;
                return Ok(record.visits);
            }
            Some(_) => {}
            None => return Err(LookupError::NotFound(code.to_string())),
        }

        self.records.remove_if(key, |_, r| r.is_expired(now));
        Err(LookupError::NotFound(code.to_string()))
    }

    async fn get_stats(&self, code: &ShortCode) -> Result<UrlStats, LookupError> {
        let record = self
            .live_record(code.as_str())
            .ok_or_else(|| LookupError::NotFound(code.to_string()))?;

        let now = Timestamp::now();
        let expires_at = record.expire_at.filter(|expire_at| *expire_at > now);

        Ok(UrlStats {
            code: code.clone(),
            long_url: record.long_url,
            created_at: record.created_at,
            visits: record.visits,
            expires_at,
        })
    }

    async fn delete(&self, code: &ShortCode) -> Result<(), LookupError> {
        match self.records.remove(code.as_str()) {
            Some((_, record)) if !record.is_expired(Timestamp::now()) => Ok(()),
            _ => Err(LookupError::NotFound(code.to_string())),
        }
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool, StoreError> {
        Ok(self.live_record(code.as_str()).is_some())
    }
}
