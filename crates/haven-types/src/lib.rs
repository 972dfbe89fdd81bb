//! Shared domain types for Haven.
//!
//! Expert chat sessions, chat messages, identities, change-feed events,
//! assistant conversations, LLM request shapes, configuration, and the
//! error enums used across the workspace.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod assistant;
pub mod config;
pub mod error;
pub mod event;
pub mod expert;
pub mod identity;
pub mod llm;
pub mod message;
pub mod stats;
