//! Core types and traits for the Burrow URL shortener.
//!
//! This crate provides the domain types shared by the Redis adapter and the
//! shortener service, the [`RecordStore`] contract they meet at, and an
//! in-memory store with the same semantics.

pub mod error;
pub mod memory;
pub mod record;
pub mod shortcode;
pub mod store;
pub mod target;

pub use error::{CoreError, CreateError, LookupError, StoreError};
pub use memory::InMemoryStore;
pub use record::{RecordTtl, UrlStats};
pub use shortcode::ShortCode;
pub use store::RecordStore;
pub use target::TargetUrl;
