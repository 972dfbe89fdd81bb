//! Cryptographic operations for Haven.
//!
//! - `token`: random API token generation and SHA-256 token hashing

pub mod token;
