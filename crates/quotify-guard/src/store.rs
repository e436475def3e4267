use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use quotify_core::config::StorageConfig;

use crate::error::{StoreError, StoreResult};

/// A single local string key-value store, the only persistence the guard uses.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&mut self, key: &str) -> StoreResult<()>;
    /// Drop every entry.
    fn clear(&mut self) -> StoreResult<()>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn clear(&mut self) -> StoreResult<()> {
        self.entries.borrow_mut().clear();
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

/// JSON-file backed store. The whole map is rewritten on every mutation.
#[derive(Debug)]
pub struct FileStore {
    entries: BTreeMap<String, String>,
    path: PathBuf,
}

impl FileStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    ///
    /// An unparseable file is removed and the store starts empty, so a
    /// damaged file can never keep a wipe from running.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let entries = if path.exists() {
            let bytes = std::fs::read(path).map_err(|e| StoreError::Io(e.to_string()))?;
            match serde_json::from_slice(&bytes) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Discarding unreadable store file {}: {e}", path.display());
                    std::fs::remove_file(path).map_err(|e| StoreError::Io(e.to_string()))?;
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            entries,
            path: path.to_path_buf(),
        })
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }
        let tmp = self.tmp_path();
        std::fs::write(&tmp, json).map_err(|e| StoreError::Io(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        let mut next = self.entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        self.entries = next;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        if !self.entries.contains_key(key) {
            return Ok(());
        }
        let mut next = self.entries.clone();
        next.remove(key);
        self.persist(&next)?;
        self.entries = next;
        Ok(())
    }

    fn clear(&mut self) -> StoreResult<()> {
        self.entries.clear();
        let _ = std::fs::remove_file(self.tmp_path());
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                // Leave an empty map behind so nothing is restored on the next start.
                tracing::warn!("Failed to remove store file, truncating instead: {e}");
                std::fs::write(&self.path, b"{}").map_err(|_| StoreError::Io(e.to_string()))
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Open the store described by the `[storage]` config section.
pub fn open_store(config: &StorageConfig) -> StoreResult<Box<dyn KeyValueStore>> {
    match config.mode.as_str() {
        "memory" => Ok(Box::new(MemoryStore::new())),
        "file" => Ok(Box::new(FileStore::open(Path::new(&config.path))?)),
        other => Err(StoreError::Unavailable(format!(
            "unknown storage mode: {other}"
        ))),
    }
}
