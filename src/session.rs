use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;

const SESSION_FILE: &str = "session.json";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("session storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("session encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// The persisted credential pair, the localStorage analog of the web client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub token: String,
}

/// File-backed session storage under the platform config dir. Read by every
/// protected call, written only at login, removed at logout.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(storage_dir: &Path) -> Self {
        SessionStore {
            path: storage_dir.join(SESSION_FILE),
        }
    }

    pub fn default_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("binomi")
    }

    /// A missing or unreadable session file is "not signed in", never a
    /// crash; corruption is logged and treated the same way.
    pub async fn load(&self) -> Result<Session, SessionError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(_) => return Err(SessionError::NotAuthenticated),
        };

        match serde_json::from_str(&raw) {
            Ok(session) => Ok(session),
            Err(e) => {
                warn!("discarding corrupt session file: {}", e);
                Err(SessionError::NotAuthenticated)
            }
        }
    }

    pub async fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, raw).await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::Storage(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_not_authenticated() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        assert!(matches!(
            store.load().await,
            Err(SessionError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let session = Session {
            user_id: "u1".into(),
            token: "tok".into(),
        };
        store.save(&session).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.user_id, "u1");
        assert_eq!(loaded.token, "tok");
    }

    #[tokio::test]
    async fn corrupt_file_is_not_authenticated() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        tokio::fs::write(dir.path().join(SESSION_FILE), "{not json")
            .await
            .unwrap();
        assert!(matches!(
            store.load().await,
            Err(SessionError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.clear().await.unwrap();

        let session = Session {
            user_id: "u1".into(),
            token: "tok".into(),
        };
        store.save(&session).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.is_err());
    }
}
