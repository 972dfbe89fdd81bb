//! API token generation and hashing.
//!
//! Implements the `TokenHasher` trait from `haven-core`. Tokens are 32 bytes
//! from the OS RNG, hex-encoded with a `hvn_` prefix; only their SHA-256
//! digest is stored.

use aes_gcm::aead::{OsRng, rand_core::RngCore};
use sha2::{Digest, Sha256};

use haven_core::identity::token::TokenHasher;

/// Prefix on every plaintext token, so leaked tokens are recognisable.
pub const TOKEN_PREFIX: &str = "hvn_";

pub struct Sha256TokenHasher;

impl Sha256TokenHasher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Sha256TokenHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenHasher for Sha256TokenHasher {
    fn generate(&self) -> String {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        format!(
            "{TOKEN_PREFIX}{}",
            bytes.iter().map(|b| format!("{b:02x}")).collect::<String>()
        )
    }

    fn hash(&self, token: &str) -> String {
        format!("{:x}", Sha256::digest(token.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_known_value() {
        let hasher = Sha256TokenHasher::new();
        assert_eq!(
            hasher.hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_generated_tokens_are_unique_and_prefixed() {
        let hasher = Sha256TokenHasher::new();
        let a = hasher.generate();
        let b = hasher.generate();
        assert_ne!(a, b);
        assert!(a.starts_with(TOKEN_PREFIX));
        assert_eq!(a.len(), TOKEN_PREFIX.len() + 64);
        assert_ne!(hasher.hash(&a), hasher.hash(&b));
    }
}
