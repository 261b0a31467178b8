//! Redis adapter for the Burrow record store.
//!
//! [`RedisStore`] implements [`burrow_core::RecordStore`] on top of a pooled
//! Redis connection. Code uniqueness comes from `HSETNX` on the record hash;
//! nothing in this crate takes a lock.

pub mod config;
pub mod error;
pub mod redis;

pub use config::{ConfigError, RedisConfig, WriteMode};
pub use error::ConnectError;
pub use redis::RedisStore;
