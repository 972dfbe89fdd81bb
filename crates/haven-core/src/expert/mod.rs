//! Expert chat sessions: access rules, the server-side service, and the
//! client-side manager that switches between AI and expert mode.

pub mod access;
pub mod manager;
pub mod service;
