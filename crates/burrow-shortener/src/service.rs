use crate::error::{Result, ShortenerError};
use crate::generator::Generator;
use crate::resolver::CodeResolver;
use burrow_core::{RecordStore, RecordTtl, ShortCode, TargetUrl, UrlStats};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Parameters for shortening a URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShortenRequest {
    pub url: String,
    #[serde(default)]
    pub custom_alias: Option<String>,
    /// Days until the record expires; `0` keeps it forever.
    #[serde(default)]
    pub expiration_days: i64,
}

/// A freshly created short URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shortened {
    pub code: ShortCode,
    pub short_url: String,
    pub long_url: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub expires_at: Option<Timestamp>,
}

/// Shortens, redirects, reports and deletes on top of a [`RecordStore`].
///
/// Codes come from a [`CodeResolver`]; the store's create-if-absent decides
/// the winner when two requests race for the same code.
pub struct ShortenerService<S, G> {
    store: Arc<S>,
    resolver: CodeResolver<G>,
    base_url: String,
}

impl<S: RecordStore, G: Generator> ShortenerService<S, G> {
    pub fn new(store: Arc<S>, generator: G, base_url: impl Into<String>) -> Self {
        Self {
            store,
            resolver: CodeResolver::new(generator),
            base_url: base_url.into(),
        }
    }

    /// Replaces the resolver, e.g. to change the attempt limit.
    pub fn with_resolver(mut self, resolver: CodeResolver<G>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn shorten(&self, request: ShortenRequest) -> Result<Shortened> {
        let target = TargetUrl::parse(&request.url)?;
        let ttl = RecordTtl::from_days(request.expiration_days)?;

        let code = self
            .resolver
            .resolve(request.custom_alias.as_deref(), self.store.as_ref())
            .await?;

        self.store
            .create_if_absent(&code, target.as_str(), ttl)
            .await?;

        let expires_at = ttl.expires_at(Timestamp::now());
        info!(code = %code, url = %target, "Created short url");

        Ok(Shortened {
            short_url: code.to_url(&self.base_url),
            code,
            long_url: target.into_string(),
            expires_at,
        })
    }

    /// Looks up the target of `code` and counts the visit.
    ///
    /// A failed increment is logged and does not fail the redirect.
    pub async fn redirect(&self, code: &str) -> Result<String> {
        let code = Self::lookup_code(code)?;
        let long_url = self.store.get_long_url(&code).await?;

        match self.store.increment_visits(&code).await {
            Ok(visits) => debug!(code = %code, visits, "Recorded visit"),
            Err(e) => warn!(code = %code, error = %e, "Failed to record visit"),
        }

        Ok(long_url)
    }

    pub async fn stats(&self, code: &str) -> Result<UrlStats> {
        let code = Self::lookup_code(code)?;
        Ok(self.store.get_stats(&code).await?)
    }

    pub async fn delete(&self, code: &str) -> Result<()> {
        let code = Self::lookup_code(code)?;
        self.store.delete(&code).await?;
        info!(code = %code, "Deleted short url");
        Ok(())
    }

    // Keyed operations take codes as given; a blank one cannot exist.
    fn lookup_code(code: &str) -> Result<ShortCode> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ShortenerError::NotFound(code.to_string()));
        }
        Ok(ShortCode::new_unchecked(code))
    }
}
