use crate::resolver::ResolveError;
use burrow_core::{CoreError, CreateError, LookupError, StoreError};
use thiserror::Error;

pub type Result<T, E = ShortenerError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShortenerError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
    #[error("invalid expiration: {0}")]
    InvalidExpiration(String),
    #[error("short code already exists: {0}")]
    Conflict(String),
    #[error("short code not found: {0}")]
    NotFound(String),
    #[error("failed to allocate a unique short code after {0} attempts")]
    Exhausted(usize),
    #[error("storage error: {0}")]
    Storage(StoreError),
}

impl ShortenerError {
    /// HTTP status an outer surface should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidUrl(_) | Self::InvalidShortCode(_) | Self::InvalidExpiration(_) => 400,
            Self::Conflict(_) => 409,
            Self::NotFound(_) => 404,
            Self::Exhausted(_) | Self::Storage(_) => 500,
        }
    }
}

impl From<CoreError> for ShortenerError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::InvalidShortCode(message) => Self::InvalidShortCode(message),
            CoreError::InvalidUrl(message) => Self::InvalidUrl(message),
            CoreError::InvalidExpiration(message) => Self::InvalidExpiration(message),
        }
    }
}

impl From<StoreError> for ShortenerError {
    fn from(value: StoreError) -> Self {
        Self::Storage(value)
    }
}

impl From<ResolveError> for ShortenerError {
    fn from(value: ResolveError) -> Self {
        match value {
            ResolveError::Validation(message) => Self::InvalidShortCode(message),
            ResolveError::Conflict(code) => Self::Conflict(code),
            ResolveError::Exhausted(attempts) => Self::Exhausted(attempts),
            ResolveError::Store(e) => Self::Storage(e),
        }
    }
}

impl From<CreateError> for ShortenerError {
    fn from(value: CreateError) -> Self {
        match value {
            CreateError::Conflict(code) => Self::Conflict(code),
            CreateError::Store(e) => Self::Storage(e),
        }
    }
}

impl From<LookupError> for ShortenerError {
    fn from(value: LookupError) -> Self {
        match value {
            LookupError::NotFound(code) => Self::NotFound(code),
            LookupError::Store(e) => Self::Storage(e),
        }
    }
}
