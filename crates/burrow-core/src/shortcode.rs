use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Symbols a generated short code is drawn from.
pub const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of every system-generated short code.
pub const GENERATED_LENGTH: usize = 7;

const MIN_ALIAS_LENGTH: usize = 4;
const MAX_ALIAS_LENGTH: usize = 32;

/// An identifier mapping to a long URL.
///
/// Custom aliases are 4-32 characters of `[A-Za-z0-9_-]`. Generated codes are
/// exactly [`GENERATED_LENGTH`] symbols from [`ALPHABET`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortCode(String);

impl ShortCode {
    /// Validates a user-supplied alias.
    pub fn parse_alias(alias: impl Into<String>) -> Result<Self, CoreError> {
        let alias = alias.into();
        Self::validate_alias(&alias)?;
        Ok(Self(alias))
    }

    /// Creates a `ShortCode` without validation.
    ///
    /// Use this only for codes produced by trusted internal sources
    /// (the random generator, or keys already present in the store).
    pub fn new_unchecked(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Generates the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate_alias(alias: &str) -> Result<(), CoreError> {
        if alias.len() < MIN_ALIAS_LENGTH || alias.len() > MAX_ALIAS_LENGTH {
            return Err(CoreError::InvalidShortCode(format!(
                "custom_alias length must be between {} and {}, got {}",
                MIN_ALIAS_LENGTH,
                MAX_ALIAS_LENGTH,
                alias.len()
            )));
        }

        if !alias
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(CoreError::InvalidShortCode(format!(
                "custom_alias must contain only alphanumeric characters, hyphens, or underscores: '{}'",
                alias
            )));
        }

        Ok(())
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShortCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
