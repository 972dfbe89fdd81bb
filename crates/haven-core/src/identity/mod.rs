//! Identity: profiles, role claims, and bearer API tokens.

pub mod service;
pub mod token;
