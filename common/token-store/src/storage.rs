use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, warn};

use crate::error::{StorageError, StorageResult};

/// Client-side persistent key-value storage.
///
/// Callers treat storage as always available: implementations absorb their own
/// I/O failures instead of surfacing them through these methods.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Volatile storage, used for tests and for sessions that should not outlive the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("rwlock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        let guard = self.inner.read().expect("rwlock poisoned");
        guard.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut guard = self.inner.write().expect("rwlock poisoned");
        guard.insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        let mut guard = self.inner.write().expect("rwlock poisoned");
        guard.remove(key);
    }
}

/// Storage persisted as a flat JSON object on disk.
///
/// The whole map is rewritten on every mutation. A failed write is logged and the
/// in-memory view stays authoritative until the next successful write.
///
/// Writes are synchronous and happen under the write lock, so `set` and `remove`
/// return only once the file is on disk. This suits the one-shot CLI, which runs
/// on a multi-threaded runtime. A long-lived async host should back
/// [`TokenStore`](crate::TokenStore) with [`MemoryStorage`] or its own non-blocking
/// implementation instead.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Opens the storage file, treating a missing file as empty storage.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str::<BTreeMap<String, String>>(&contents)
                .map_err(|err| StorageError::Corrupt {
                    path: path.clone(),
                    reason: err.to_string(),
                })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Read { path, source }),
        };

        debug!(path = %path.display(), keys = entries.len(), "opened file storage");
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StorageError::Write {
                    path: self.path.clone(),
                    source,
                })?;
            }
        }

        let body = serde_json::to_string_pretty(entries).map_err(|err| StorageError::Corrupt {
            path: self.path.clone(),
            reason: err.to_string(),
        })?;
        fs::write(&self.path, body).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })
    }

    fn persist_or_warn(&self, entries: &BTreeMap<String, String>) {
        if let Err(err) = self.persist(entries) {
            warn!(error = %err, "failed to persist client storage");
        }
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        let guard = self.entries.read().expect("rwlock poisoned");
        guard.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut guard = self.entries.write().expect("rwlock poisoned");
        guard.insert(key.to_owned(), value.to_owned());
        self.persist_or_warn(&guard);
    }

    fn remove(&self, key: &str) {
        let mut guard = self.entries.write().expect("rwlock poisoned");
        if guard.remove(key).is_some() {
            self.persist_or_warn(&guard);
        }
    }
}
