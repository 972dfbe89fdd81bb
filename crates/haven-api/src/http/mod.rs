//! HTTP/REST API layer for Haven.
//!
//! Axum-based REST API at `/api/v1/` with bearer token authentication,
//! envelope response format, WebSocket change feeds, and CORS support.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
