//! Infrastructure layer for Haven.
//!
//! Contains implementations of the repository and provider traits defined in
//! `haven-core`: SQLite storage, LLM completion backends, token hashing, and
//! config/data-directory loading.

pub mod config;
pub mod crypto;
pub mod filesystem;
pub mod llm;
pub mod sqlite;
