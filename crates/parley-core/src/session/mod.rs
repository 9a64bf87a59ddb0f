//! Session store abstraction.

pub mod memory;
pub mod store;

pub use memory::InMemorySessionStore;
pub use store::{SessionStore, DEFAULT_SESSION_KEY};
