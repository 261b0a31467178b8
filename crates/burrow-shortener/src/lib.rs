//! URL shortener service implementation.
//!
//! This crate allocates short codes (random or custom) through the
//! [`CodeResolver`] and drives a [`burrow_core::RecordStore`] from the
//! [`ShortenerService`]. Core types are re-exported from `burrow_core`.

pub mod error;
pub mod generator;
pub mod resolver;
pub mod service;

pub use burrow_core::{ShortCode, UrlStats};
pub use error::ShortenerError;
pub use generator::random::RandomGenerator;
pub use generator::Generator;
pub use resolver::{CodeResolver, ExistenceCheck, ResolveError, MAX_GENERATION_ATTEMPTS};
pub use service::{ShortenRequest, Shortened, ShortenerService};
