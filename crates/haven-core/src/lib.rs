//! Business logic and repository trait definitions for Haven.
//!
//! This crate defines the "ports" (repository and provider traits) that the
//! infrastructure layer implements, plus the services built on them. It
//! depends only on `haven-types` -- never on `haven-infra` or any
//! database/IO crate.

pub mod assistant;
pub mod event;
pub mod expert;
pub mod identity;
pub mod llm;
pub mod repository;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;
