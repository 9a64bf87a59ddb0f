//! Request handlers.

pub mod agent;
pub mod chat;
pub mod session;
