use crate::error::CoreError;
use crate::shortcode::ShortCode;
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest expiration a client may request.
pub const MAX_EXPIRATION_DAYS: i64 = 36_500;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Time-to-live attached to a record at creation.
///
/// The store owns the absolute expiry; a zero duration means the record
/// never expires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordTtl(Option<Duration>);

impl RecordTtl {
    /// A record that never expires.
    pub const NEVER: Self = Self(None);

    /// Expire the record `duration` after creation.
    pub fn after(duration: Duration) -> Self {
        if duration.is_zero() {
            Self::NEVER
        } else {
            Self(Some(duration))
        }
    }

    /// Expire the record after a whole number of days. `0` means never.
    pub fn from_days(days: i64) -> Result<Self, CoreError> {
        if days < 0 {
            return Err(CoreError::InvalidExpiration(
                "expiration_days must be >= 0".to_string(),
            ));
        }
        if days > MAX_EXPIRATION_DAYS {
            return Err(CoreError::InvalidExpiration(format!(
                "expiration_days must be <= {MAX_EXPIRATION_DAYS}"
            )));
        }

        Ok(Self::after(Duration::from_secs(
            days.unsigned_abs() * SECONDS_PER_DAY,
        )))
    }

    /// The TTL to apply, or `None` if the record never expires.
    pub fn duration(&self) -> Option<Duration> {
        self.0
    }

    /// Absolute expiry for a record created at `now`.
    pub fn expires_at(&self, now: Timestamp) -> Option<Timestamp> {
        let ttl = SignedDuration::try_from(self.0?).ok()?;
        now.checked_add(ttl).ok()
    }
}

/// Everything known about a short code at the time it is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlStats {
    pub code: ShortCode,
    pub long_url: String,
    pub created_at: Timestamp,
    pub visits: i64,
    /// `now + remaining TTL` at read time; absent when the record never expires.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub expires_at: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_duration_never_expires() {
        assert_eq!(RecordTtl::after(Duration::ZERO), RecordTtl::NEVER);
        assert_eq!(RecordTtl::from_days(0).unwrap(), RecordTtl::NEVER);
        assert_eq!(RecordTtl::NEVER.expires_at(Timestamp::now()), None);
    }

    #[test]
    fn days_convert_to_seconds() {
        let ttl = RecordTtl::from_days(2).unwrap();
        assert_eq!(ttl.duration(), Some(Duration::from_secs(172_800)));
    }

    #[test]
    fn negative_days_are_rejected() {
        assert!(matches!(
            RecordTtl::from_days(-1),
            Err(CoreError::InvalidExpiration(_))
        ));
    }

    #[test]
    fn excessive_days_are_rejected() {
        assert!(RecordTtl::from_days(MAX_EXPIRATION_DAYS).is_ok());
        assert!(RecordTtl::from_days(MAX_EXPIRATION_DAYS + 1).is_err());
    }

    #[test]
    fn expires_at_is_relative_to_now() {
        let now = Timestamp::now();
        let ttl = RecordTtl::after(Duration::from_secs(3600));
        assert_eq!(
            ttl.expires_at(now),
            Some(now.checked_add(SignedDuration::from_hours(1)).unwrap())
        );
    }

    #[test]
    fn stats_omit_missing_expiry() {
        let stats = UrlStats {
            code: ShortCode::new_unchecked("abc1234"),
            long_url: "https://example.com".to_string(),
            created_at: "2024-05-01T10:00:00Z".parse().unwrap(),
            visits: 3,
            expires_at: None,
        };

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["code"], "abc1234");
        assert_eq!(json["visits"], 3);
        assert!(json.get("expires_at").is_none());
    }
}
