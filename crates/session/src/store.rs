//! Persistent local session storage.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::StoreError;
use crate::session::Session;

/// Key-value session record storage (`token`, `refreshToken`,
/// `tokenExpiration`).
///
/// Only the guard and the login flow write to it.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<Session>, StoreError>;

    fn save(&self, session: &Session) -> Result<(), StoreError>;

    /// Remove every session key. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), StoreError>;
}

/// In-memory session store.
///
/// Intended for tests/dev and for embedding where persistence is not wanted.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    session: RwLock<Option<Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self) -> Result<Option<Session>, StoreError> {
        let guard = self.session.read().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.clone())
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        let mut guard = self.session.write().map_err(|_| StoreError::Poisoned)?;
        *guard = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut guard = self.session.write().map_err(|_| StoreError::Poisoned)?;
        *guard = None;
        Ok(())
    }
}

/// JSON file holding the session keys.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash never leaves a half-written record.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "session.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }

        let record: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        // A record without an access token is an empty session, not corruption.
        if record.get("token").is_none_or(|t| t.is_null()) {
            return Ok(None);
        }
        let session = serde_json::from_value(record).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(Some(session))
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_vec_pretty(session).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let tmp = self.temp_path();
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn temp_store() -> FileSessionStore {
        let dir = std::env::temp_dir().join(format!("claimdesk-store-{}", uuid::Uuid::now_v7()));
        FileSessionStore::new(dir.join("session.json"))
    }

    fn sample() -> Session {
        Session::new(
            "access-1",
            "refresh-1",
            Utc.with_ymd_and_hms(2026, 5, 4, 12, 30, 0).unwrap(),
        )
    }

    #[test]
    fn in_memory_store_round_trip() {
        let store = InMemorySessionStore::new();
        assert!(store.load().unwrap().is_none());

        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample()));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_store_persists_under_store_keys() {
        let store = temp_store();
        assert!(store.load().unwrap().is_none());

        store.save(&sample()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["token"], "access-1");
        assert_eq!(raw["refreshToken"], "refresh-1");
        assert_eq!(raw["tokenExpiration"], "2026-05-04T12:30:00Z");

        let reopened = FileSessionStore::new(store.path().to_path_buf());
        assert_eq!(reopened.load().unwrap(), Some(sample()));

        store.clear().unwrap();
        assert!(!store.path().exists());
        // Clearing twice is fine.
        store.clear().unwrap();
    }

    #[test]
    fn file_store_reads_partial_records() {
        let store = temp_store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();

        std::fs::write(store.path(), r#"{"refreshToken":"r"}"#).unwrap();
        assert!(store.load().unwrap().is_none());

        std::fs::write(store.path(), r#"{"token":"a"}"#).unwrap();
        let session = store.load().unwrap().unwrap();
        assert_eq!(session.access_token, "a");
        assert!(session.refresh_token.is_none());
        assert!(session.expires_at.is_none());

        std::fs::write(store.path(), "not json").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Corrupt(_))));

        store.clear().unwrap();
    }
}
