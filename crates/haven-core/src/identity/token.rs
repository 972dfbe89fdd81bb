//! TokenHasher trait for generating and hashing API tokens.
//!
//! Defined in haven-core so services can issue tokens without coupling to a
//! specific RNG or hash algorithm. The `Sha256TokenHasher` adapter lives in
//! haven-infra.

/// Abstraction over API token generation and hashing.
pub trait TokenHasher: Send + Sync {
    /// Generate a fresh random plaintext token.
    fn generate(&self) -> String;

    /// Compute the hex-encoded hash stored for a plaintext token.
    fn hash(&self, token: &str) -> String;
}
