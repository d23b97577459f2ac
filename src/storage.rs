//! Local persistent key-value storage.
//!
//! Progress records are stored as one JSON document per key. Storage may be
//! unavailable (no writable data directory, disk errors); consumers are
//! expected to treat any `StorageError` as "no data" and keep working from
//! memory.

use std::collections::HashMap;
use std::path::PathBuf;

/// Errors that can occur while reading or writing persisted state.
#[derive(Debug, Clone)]
pub enum StorageError {
    Unavailable(String),
    ReadFailed(String),
    WriteFailed(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Unavailable(e) => write!(f, "Storage unavailable: {}", e),
            StorageError::ReadFailed(e) => write!(f, "Failed to read stored value: {}", e),
            StorageError::WriteFailed(e) => write!(f, "Failed to write stored value: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

/// String-valued key-value storage that survives process restarts.
pub trait KeyValueStore {
    /// Read the value stored under `key`. `Ok(None)` means the key was never
    /// written, which is distinct from a read failure.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key`, replacing any previous value.
    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// File-backed store: one `<key>.json` file per key under a data directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at `<data_local_dir>/selftalk-practice/progress/`.
    pub fn new() -> Self {
        let dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("selftalk-practice")
            .join("progress");
        Self { dir }
    }

    /// Store rooted at an explicit directory.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys become file names; anything outside a conservative character
        // set is replaced so a key can never escape the store directory.
        let sanitized: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", sanitized))
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadFailed(format!("{:?}: {}", path, e))),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| StorageError::Unavailable(format!("{:?}: {}", self.dir, e)))?;

        let path = self.path_for(key);

        // Write atomically: write to a temp file in the same directory, then
        // rename. This prevents a partial/corrupt record if the process dies
        // mid-write.
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, value)
            .map_err(|e| StorageError::WriteFailed(format!("{:?}: {}", tmp_path, e)))?;

        // On Unix, rename will atomically replace the destination. On Windows,
        // rename fails if the destination exists, so we remove it first
        // (ignoring NotFound).
        if cfg!(windows) {
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    return Err(StorageError::WriteFailed(format!("{:?}: {}", path, e)));
                }
            }
        }

        std::fs::rename(&tmp_path, &path)
            .map_err(|e| StorageError::WriteFailed(format!("{:?} -> {:?}: {}", tmp_path, path, e)))
    }
}

/// In-memory store for tests and embeddings without persistent storage.
#[derive(Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
