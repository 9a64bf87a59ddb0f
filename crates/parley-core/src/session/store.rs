//! SessionStore trait definition.
//!
//! Persistence seam for dialog sessions, keyed by a session key from day
//! one even though a deployment typically uses a single key. This keeps the
//! read-modify-persist race of a shared global session out of the store
//! contract itself; concurrency remains last-writer-wins per key.
//!
//! Implementations live in parley-infra (`FileSessionStore`) and in this
//! crate (`InMemorySessionStore`). Uses native async fn in traits (RPITIT,
//! Rust 2024 edition).

use parley_types::dialog::DialogSession;
use parley_types::error::SessionStoreError;

/// The well-known key used when a request does not name a session.
pub const DEFAULT_SESSION_KEY: &str = "default";

/// Repository trait for dialog session persistence.
///
/// A store holds at most one session per key; saving under an existing key
/// replaces the previous session. No component should hold a session
/// reference across a save boundary -- load, mutate, save.
pub trait SessionStore: Send + Sync {
    /// Load the session stored under `key`, if any.
    fn load(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<DialogSession>, SessionStoreError>> + Send;

    /// Persist `session` under `key`, replacing any previous value.
    fn save(
        &self,
        key: &str,
        session: &DialogSession,
    ) -> impl std::future::Future<Output = Result<(), SessionStoreError>> + Send;

    /// Remove the session stored under `key`. Removing an absent key is a
    /// no-op.
    fn clear(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<(), SessionStoreError>> + Send;
}
