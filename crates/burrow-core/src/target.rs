use crate::error::CoreError;
use std::fmt::Display;
use url::Url;

/// A validated redirect target.
///
/// Only `http` and `https` URLs with a non-empty host are accepted. The
/// trimmed input is kept verbatim so the stored URL is exactly what the
/// client submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUrl(String);

impl TargetUrl {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidUrl("url is required".to_string()));
        }

        let parsed = Url::parse(trimmed)
            .map_err(|e| CoreError::InvalidUrl(format!("invalid url '{trimmed}': {e}")))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(CoreError::InvalidUrl(
                "url must start with http:// or https://".to_string(),
            ));
        }

        // The parser supplies a missing `//` for special schemes, so
        // `http:example.com` would otherwise pass with no authority written.
        let has_authority = trimmed
            .split_once(':')
            .is_some_and(|(_, rest)| rest.starts_with("//"));
        if !has_authority || parsed.host_str().is_none_or(str::is_empty) {
            return Err(CoreError::InvalidUrl("url host is required".to_string()));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for TargetUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https() {
        assert_eq!(
            TargetUrl::parse("https://example.com").unwrap().as_str(),
            "https://example.com"
        );
        assert_eq!(
            TargetUrl::parse("  http://example.com/path?q=1  ")
                .unwrap()
                .as_str(),
            "http://example.com/path?q=1"
        );
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(
            TargetUrl::parse("   ").unwrap_err(),
            CoreError::InvalidUrl("url is required".to_string())
        );
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(TargetUrl::parse("ftp://example.com").is_err());
        assert!(TargetUrl::parse("mailto:someone@example.com").is_err());
        assert!(TargetUrl::parse("javascript:alert(1)").is_err());
    }

    #[test]
    fn rejects_missing_scheme_or_host() {
        assert!(TargetUrl::parse("not-a-valid-url").is_err());
        assert!(TargetUrl::parse("example.com/path").is_err());
        assert!(TargetUrl::parse("https://").is_err());
    }

    #[test]
    fn rejects_scheme_without_authority() {
        for raw in ["http:example.com", "https:/example.com", r"http:\\example.com"] {
            assert_eq!(
                TargetUrl::parse(raw).unwrap_err(),
                CoreError::InvalidUrl("url host is required".to_string()),
                "{raw}"
            );
        }
    }
}
