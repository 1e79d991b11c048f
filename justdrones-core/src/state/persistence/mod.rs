//! Key-value settings persistence.
//!
//! `KeyValueStore` is the seam between the stateful aggregates and whatever
//! actually keeps settings across launches. Writes are best effort: callers
//! log failures and carry on with the in-memory value.

pub mod schema;
mod sqlite;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub use sqlite::SqliteStore;

pub const KEY_DIAPASON: &str = "drones.diapason";
pub const KEY_STOP: &str = "drones.stop";
pub const KEY_TEMPERED_FIFTH: &str = "drones.temperedfifth";
pub const KEY_SUB_OCTAVE: &str = "synth.subOctave";
pub const KEY_PRESETS: &str = "drones.presets";

/// Result type for store operations.
pub type StoreResult<T = ()> = Result<T, StoreError>;

/// Error from a store read or write.
#[derive(Debug, Clone)]
pub struct StoreError(pub String);

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError(e.to_string())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError(e.to_string())
    }
}

/// Persistent numbers and blobs, addressed by string key.
pub trait KeyValueStore: Send + Sync {
    fn get_number(&self, key: &str) -> StoreResult<Option<f64>>;
    fn set_number(&self, key: &str, value: f64) -> StoreResult;
    fn get_blob(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;
    fn set_blob(&self, key: &str, value: &[u8]) -> StoreResult;
}

/// Shared handle used by every aggregate that persists settings.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Open the on-disk store at `path`, or an in-memory one if there is no path
/// or the database can't be opened.
pub fn open_store(path: Option<&Path>) -> SharedStore {
    let Some(path) = path else {
        log::warn!(target: "store", "no settings path, settings will not persist");
        return MemoryStore::shared();
    };
    match SqliteStore::open(path) {
        Ok(store) => {
            log::info!(target: "store", "settings at {}", path.display());
            Arc::new(store)
        }
        Err(e) => {
            log::warn!(target: "store", "could not open {}: {}", path.display(), e);
            MemoryStore::shared()
        }
    }
}

/// Read a number, logging and swallowing store errors.
pub fn load_number(store: &dyn KeyValueStore, key: &str) -> Option<f64> {
    match store.get_number(key) {
        Ok(value) => value,
        Err(e) => {
            log::warn!(target: "store", "could not read {}: {}", key, e);
            None
        }
    }
}

/// Write a number, logging and swallowing store errors.
pub fn persist_number(store: &dyn KeyValueStore, key: &str, value: f64) {
    if let Err(e) = store.set_number(key, value) {
        log::warn!(target: "store", "could not write {}: {}", key, e);
    }
}

pub fn load_bool(store: &dyn KeyValueStore, key: &str) -> Option<bool> {
    load_number(store, key).map(|v| v != 0.0)
}

pub fn persist_bool(store: &dyn KeyValueStore, key: &str, value: bool) {
    persist_number(store, key, if value { 1.0 } else { 0.0 });
}

#[derive(Default)]
struct MemoryInner {
    numbers: HashMap<String, f64>,
    blobs: HashMap<String, Vec<u8>>,
}

/// In-process store. Used in tests and when the on-disk store can't be opened.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedStore {
        Arc::new(Self::new())
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, MemoryInner>> {
        self.inner
            .lock()
            .map_err(|_| StoreError("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get_number(&self, key: &str) -> StoreResult<Option<f64>> {
        Ok(self.lock()?.numbers.get(key).copied())
    }

    fn set_number(&self, key: &str, value: f64) -> StoreResult {
        self.lock()?.numbers.insert(key.to_string(), value);
        Ok(())
    }

    fn get_blob(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.lock()?.blobs.get(key).cloned())
    }

    fn set_blob(&self, key: &str, value: &[u8]) -> StoreResult {
        self.lock()?.blobs.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// A store whose every operation fails. Exercises the fallback paths.
#[cfg(test)]
pub(crate) struct FailingStore;

#[cfg(test)]
impl KeyValueStore for FailingStore {
    fn get_number(&self, _: &str) -> StoreResult<Option<f64>> {
        Err(StoreError("unavailable".to_string()))
    }
    fn set_number(&self, _: &str, _: f64) -> StoreResult {
        Err(StoreError("unavailable".to_string()))
    }
    fn get_blob(&self, _: &str) -> StoreResult<Option<Vec<u8>>> {
        Err(StoreError("unavailable".to_string()))
    }
    fn set_blob(&self, _: &str, _: &[u8]) -> StoreResult {
        Err(StoreError("unavailable".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get_number(KEY_DIAPASON).unwrap(), None);
        store.set_number(KEY_DIAPASON, 432.0).unwrap();
        assert_eq!(store.get_number(KEY_DIAPASON).unwrap(), Some(432.0));

        store.set_blob(KEY_PRESETS, b"[]").unwrap();
        assert_eq!(store.get_blob(KEY_PRESETS).unwrap(), Some(b"[]".to_vec()));
    }

    #[test]
    fn helpers_swallow_failures() {
        let store = FailingStore;
        assert_eq!(load_number(&store, KEY_STOP), None);
        persist_number(&store, KEY_STOP, 8.0);
        assert_eq!(load_bool(&store, "synth.isSub"), None);
    }

    #[test]
    fn open_store_without_path_is_in_memory() {
        let store = open_store(None);
        store.set_number(KEY_STOP, 4.0).unwrap();
        assert_eq!(store.get_number(KEY_STOP).unwrap(), Some(4.0));
    }

    #[test]
    fn open_store_uses_sqlite_when_possible() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.sqlite");
        open_store(Some(&path)).set_number(KEY_STOP, 8.0).unwrap();
        assert_eq!(open_store(Some(&path)).get_number(KEY_STOP).unwrap(), Some(8.0));
    }

    #[test]
    fn bools_are_stored_as_numbers() {
        let store = MemoryStore::new();
        persist_bool(&store, "synth.isPhaser", true);
        assert_eq!(store.get_number("synth.isPhaser").unwrap(), Some(1.0));
        assert_eq!(load_bool(&store, "synth.isPhaser"), Some(true));
    }
}
