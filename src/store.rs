//! Durable persistence for the credential record: exactly two logical keys,
//! the bearer token and the serialized user snapshot. Absence and corruption
//! are normal conditions here and never cross the public boundary as errors;
//! a corrupt record is cleared and reported as "no session".

use std::collections::HashMap;
use std::path::PathBuf;

use parking_lot::Mutex;
use tracing::warn;

use crate::models::User;

/// Storage keys match the browser-origin layout of the reference deployment.
pub const TOKEN_KEY: &str = "authToken";
pub const USER_KEY: &str = "userData";

/// Minimal string key/value surface the token store runs on. Implementations
/// must be infallible from the caller's perspective; a backend that cannot
/// write simply loses the record (next `load` reports no session).
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// One file per key under a directory.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            warn!("store: could not create {}: {}", self.dir.display(), e);
            return;
        }
        if let Err(e) = std::fs::write(self.path_for(key), value) {
            warn!("store: write of {} failed: {}", key, e);
        }
    }

    fn remove(&self, key: &str) {
        let _ = std::fs::remove_file(self.path_for(key));
    }
}

/// In-memory backend for tests and embedders without a disk.
#[derive(Default)]
pub struct MemoryBackend {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.map.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.map.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.map.lock().remove(key);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredSession {
    pub token: String,
    pub user: User,
}

pub struct TokenStore {
    backend: Box<dyn StorageBackend>,
}

impl TokenStore {
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()))
    }

    pub fn on_disk<P: Into<PathBuf>>(dir: P) -> Self {
        Self::new(Box::new(FileBackend::new(dir)))
    }

    /// Persist the credential record. User is written first so a reader can
    /// never observe a token without a snapshot; "token present, user absent"
    /// is the corruption signature `load` self-heals from.
    pub fn save(&self, token: &str, user: &User) {
        match serde_json::to_string(user) {
            Ok(json) => {
                self.backend.set(USER_KEY, &json);
                self.backend.set(TOKEN_KEY, token);
            }
            Err(e) => {
                warn!("store: user snapshot did not serialize: {}", e);
                self.clear();
            }
        }
    }

    /// Read the record back. Any missing or unparseable piece clears both
    /// keys and reports no session; this never errors.
    pub fn load(&self) -> Option<StoredSession> {
        let token = self.backend.get(TOKEN_KEY)?;
        let raw_user = match self.backend.get(USER_KEY) {
            Some(raw) => raw,
            None => {
                warn!("store: token present without user snapshot, clearing record");
                self.clear();
                return None;
            }
        };
        match serde_json::from_str::<User>(&raw_user) {
            Ok(user) if !token.is_empty() => Some(StoredSession { token, user }),
            Ok(_) => {
                self.clear();
                None
            }
            Err(e) => {
                warn!("store: corrupt user snapshot ({}), clearing record", e);
                self.clear();
                None
            }
        }
    }

    /// Remove both keys; idempotent.
    pub fn clear(&self) {
        self.backend.remove(TOKEN_KEY);
        self.backend.remove(USER_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn user() -> User {
        serde_json::from_str(r#"{"id":1,"role":"student","name":"Asha","studentId":"21BCE1001"}"#).unwrap()
    }

    #[test]
    fn save_then_load_returns_last_record() {
        let store = TokenStore::in_memory();
        store.save("t1", &user());
        let mut other = user();
        other.name = "Asha R".into();
        store.save("t2", &other);
        let got = store.load().expect("record");
        assert_eq!(got.token, "t2");
        assert_eq!(got.user.name, "Asha R");
        assert_eq!(got.user.role, Role::Student);
    }

    #[test]
    fn clear_then_load_is_none_and_idempotent() {
        let store = TokenStore::in_memory();
        store.save("t", &user());
        store.clear();
        store.clear();
        assert!(store.load().is_none());
    }

    #[test]
    fn corrupt_user_snapshot_self_heals() {
        let backend = MemoryBackend::new();
        backend.set(TOKEN_KEY, "t");
        backend.set(USER_KEY, "{not json");
        let store = TokenStore::new(Box::new(backend));
        assert!(store.load().is_none());
        // both keys must be gone after the self-heal
        assert!(store.load().is_none());
    }

    #[test]
    fn token_without_user_is_corrupt() {
        let backend = MemoryBackend::new();
        backend.set(TOKEN_KEY, "orphan");
        let store = TokenStore::new(Box::new(backend));
        assert!(store.load().is_none());
    }

    #[test]
    fn file_backend_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = TokenStore::on_disk(tmp.path().join("unilink"));
        assert!(store.load().is_none());
        store.save("abc", &user());
        let got = store.load().expect("record");
        assert_eq!(got.token, "abc");
        assert_eq!(got.user.student_id, "21BCE1001");
        store.clear();
        assert!(store.load().is_none());
    }

    #[test]
    fn file_backend_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("unilink");
        TokenStore::on_disk(&dir).save("abc", &user());
        // a fresh store over the same directory simulates a reload
        let got = TokenStore::on_disk(&dir).load().expect("record");
        assert_eq!(got.token, "abc");
    }
}
