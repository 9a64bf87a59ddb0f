//! In-memory session store.
//!
//! Backs tests and ephemeral deployments where sessions need not survive a
//! restart. Durable persistence lives in parley-infra's `FileSessionStore`.

use dashmap::DashMap;

use parley_types::dialog::DialogSession;
use parley_types::error::SessionStoreError;

use super::store::SessionStore;

/// Session store holding sessions in a concurrent map.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, DialogSession>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    async fn load(&self, key: &str) -> Result<Option<DialogSession>, SessionStoreError> {
        Ok(self.sessions.get(key).map(|entry| entry.clone()))
    }

    async fn save(&self, key: &str, session: &DialogSession) -> Result<(), SessionStoreError> {
        self.sessions.insert(key.to_string(), session.clone());
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), SessionStoreError> {
        self.sessions.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> DialogSession {
        DialogSession::new(
            None,
            "test-model".to_string(),
            512,
            false,
            3,
            "hello".to_string(),
        )
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let store = InMemorySessionStore::new();
        assert!(store.load("default").await.unwrap().is_none());

        let mut s = session();
        s.record_exchange("q", "a", None);
        store.save("default", &s).await.unwrap();

        let loaded = store.load("default").await.unwrap().unwrap();
        assert_eq!(loaded.current_round, 1);
        assert_eq!(loaded.messages, s.messages);
    }

    #[tokio::test]
    async fn test_save_replaces_previous_session() {
        let store = InMemorySessionStore::new();
        store.save("k", &session()).await.unwrap();

        let mut replacement = session();
        replacement.record_exchange("q", "a", None);
        store.save("k", &replacement).await.unwrap();

        let loaded = store.load("k").await.unwrap().unwrap();
        assert_eq!(loaded.current_round, 1);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let store = InMemorySessionStore::new();
        store.save("k", &session()).await.unwrap();
        store.clear("k").await.unwrap();
        assert!(store.load("k").await.unwrap().is_none());
        // Clearing an absent key is fine.
        store.clear("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let store = InMemorySessionStore::new();
        store.save("a", &session()).await.unwrap();
        assert!(store.load("b").await.unwrap().is_none());
    }
}
