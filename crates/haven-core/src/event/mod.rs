//! Realtime change feed for expert chat sessions.

pub mod feed;
