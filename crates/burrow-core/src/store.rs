use crate::error::{CreateError, LookupError, StoreError};
use crate::record::{RecordTtl, UrlStats};
use crate::shortcode::ShortCode;
use async_trait::async_trait;

/// The per-code record store shared by every request.
///
/// Code uniqueness is enforced by [`create_if_absent`](Self::create_if_absent)
/// alone. Any existence check performed before it is advisory: two callers
/// may both observe a code as free, and only one of them will create it.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Atomically reserves `code` for `long_url`, then records the creation
    /// time, a zero visit count and the optional TTL.
    ///
    /// Returns `Err(Conflict)` if a record already exists. A failure after the
    /// reservation surfaces as `Err(Store)`, never as a conflict.
    async fn create_if_absent(
        &self,
        code: &ShortCode,
        long_url: &str,
        ttl: RecordTtl,
    ) -> Result<(), CreateError>;

    /// Returns the target URL of a live record.
    async fn get_long_url(&self, code: &ShortCode) -> Result<String, LookupError>;

    /// Adds one visit and returns the new count.
    ///
    /// Never creates a record for an unknown code.
    async fn increment_visits(&self, code: &ShortCode) -> Result<i64, LookupError>;

    /// Reads the full record; `expires_at` is derived from the remaining TTL.
    async fn get_stats(&self, code: &ShortCode) -> Result<UrlStats, LookupError>;

    /// Removes the record.
    async fn delete(&self, code: &ShortCode) -> Result<(), LookupError>;

    /// Checks whether a live record exists for `code`.
    async fn exists(&self, code: &ShortCode) -> Result<bool, StoreError>;
}
