//! HTTP request handlers for the REST API.

pub mod assistant;
pub mod expert;
pub mod profile;
pub mod stats;
pub mod ws;
