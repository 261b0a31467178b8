use async_trait::async_trait;
use burrow_core::{CoreError, RecordStore, ShortCode, StoreError};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::generator::Generator;

/// Number of random candidates tried before giving up.
pub const MAX_GENERATION_ATTEMPTS: usize = 10;

/// Reasons a code could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("{0}")]
    Validation(String),
    #[error("short code already exists: {0}")]
    Conflict(String),
    #[error("failed to allocate a unique short code after {0} attempts")]
    Exhausted(usize),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<CoreError> for ResolveError {
    fn from(value: CoreError) -> Self {
        ResolveError::Validation(value.to_string())
    }
}

/// Answers whether a code is already taken.
///
/// This is advisory only: a code reported free may still be claimed by a
/// concurrent request before it is created.
#[async_trait]
pub trait ExistenceCheck: Send + Sync {
    async fn is_taken(&self, code: &ShortCode) -> Result<bool, StoreError>;
}

#[async_trait]
impl<S: RecordStore + ?Sized> ExistenceCheck for S {
    async fn is_taken(&self, code: &ShortCode) -> Result<bool, StoreError> {
        self.exists(code).await
    }
}

/// Picks the code a new record will be created under.
#[derive(Debug, Clone)]
pub struct CodeResolver<G> {
    generator: G,
    max_attempts: usize,
}

impl<G: Generator> CodeResolver<G> {
    pub fn new(generator: G) -> Self {
        Self::with_max_attempts(generator, MAX_GENERATION_ATTEMPTS)
    }

    pub fn with_max_attempts(generator: G, max_attempts: usize) -> Self {
        Self {
            generator,
            max_attempts,
        }
    }

    /// Validates and checks a custom alias, or finds a free random code.
    ///
    /// A blank alias counts as absent. An invalid alias is rejected before
    /// the store is consulted.
    pub async fn resolve<E>(
        &self,
        custom_alias: Option<&str>,
        check: &E,
    ) -> Result<ShortCode, ResolveError>
    where
        E: ExistenceCheck + ?Sized,
    {
        match custom_alias.map(str::trim).filter(|alias| !alias.is_empty()) {
            Some(alias) => self.resolve_alias(alias, check).await,
            None => self.resolve_generated(check).await,
        }
    }

    async fn resolve_alias<E>(&self, alias: &str, check: &E) -> Result<ShortCode, ResolveError>
    where
        E: ExistenceCheck + ?Sized,
    {
        let code = ShortCode::parse_alias(alias)?;
        if check.is_taken(&code).await? {
            debug!(code = %code, "Custom alias already taken");
            return Err(ResolveError::Conflict(code.to_string()));
        }
        Ok(code)
    }

    async fn resolve_generated<E>(&self, check: &E) -> Result<ShortCode, ResolveError>
    where
        E: ExistenceCheck + ?Sized,
    {
        for attempt in 1..=self.max_attempts {
            let candidate = self.generator.generate();
            if !check.is_taken(&candidate).await? {
                trace!(code = %candidate, attempt, "Allocated short code");
                return Ok(candidate);
            }
            debug!(code = %candidate, attempt, "Generated short code collided");
        }

        warn!(
            attempts = self.max_attempts,
            "Failed to allocate a unique short code"
        );
        Err(ResolveError::Exhausted(self.max_attempts))
    }
}
