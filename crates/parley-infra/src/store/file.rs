//! File-backed session store.
//!
//! One JSON document per session key under `{data_dir}/sessions/`, so a
//! session survives a process restart. Absence of the file means no active
//! session.

use std::path::{Path, PathBuf};

use parley_core::session::store::SessionStore;
use parley_types::dialog::DialogSession;
use parley_types::error::SessionStoreError;

/// Session store writing each session as `{data_dir}/sessions/{key}.json`.
pub struct FileSessionStore {
    sessions_dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            sessions_dir: data_dir.join("sessions"),
        }
    }

    fn session_path(&self, key: &str) -> PathBuf {
        // Keys come from request payloads; keep them from escaping the
        // sessions directory.
        let safe: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.sessions_dir.join(format!("{safe}.json"))
    }
}

impl SessionStore for FileSessionStore {
    async fn load(&self, key: &str) -> Result<Option<DialogSession>, SessionStoreError> {
        let path = self.session_path(key);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(SessionStoreError::Io(err.to_string())),
        };
        let session = serde_json::from_str(&content)
            .map_err(|err| SessionStoreError::Serialization(err.to_string()))?;
        Ok(Some(session))
    }

    async fn save(&self, key: &str, session: &DialogSession) -> Result<(), SessionStoreError> {
        tokio::fs::create_dir_all(&self.sessions_dir)
            .await
            .map_err(|err| SessionStoreError::Io(err.to_string()))?;
        let json = serde_json::to_string_pretty(session)
            .map_err(|err| SessionStoreError::Serialization(err.to_string()))?;
        tokio::fs::write(self.session_path(key), json)
            .await
            .map_err(|err| SessionStoreError::Io(err.to_string()))
    }

    async fn clear(&self, key: &str) -> Result<(), SessionStoreError> {
        match tokio::fs::remove_file(self.session_path(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(SessionStoreError::Io(err.to_string())),
        }
    }
}
