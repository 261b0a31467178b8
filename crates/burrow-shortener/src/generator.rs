pub mod random;

use burrow_core::ShortCode;

/// Trait for generating candidate short codes.
///
/// Implementations are pure generators that don't interact with storage;
/// the [`CodeResolver`](crate::resolver::CodeResolver) checks candidates
/// against the store and retries on collision.
pub trait Generator: Send + Sync + 'static {
    /// Produces the next candidate code.
    fn generate(&self) -> ShortCode;
}
