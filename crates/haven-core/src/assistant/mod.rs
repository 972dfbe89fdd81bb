//! AI assistant: intent detection and the reply service.

pub mod intent;
pub mod service;
