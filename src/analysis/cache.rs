use lru::LruCache;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::CacheError;
use crate::types::{CacheKey, ViewModel};

/// Bump whenever the serialized shape of [`ViewModel`] changes.
pub const SCHEMA_VERSION: u32 = 4;

const MEMORY_CAPACITY: usize = 16;

/// Session-scoped string storage, analogous to browser session storage.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, value: String) -> Result<(), CacheError>;
    fn remove(&self, key: &str) -> Result<(), CacheError>;
    fn clear(&self) -> Result<(), CacheError>;
}

impl<T: SessionStore + ?Sized> SessionStore for Box<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: String) -> Result<(), CacheError> {
        (**self).put(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        (**self).remove(key)
    }

    fn clear(&self) -> Result<(), CacheError> {
        (**self).clear()
    }
}

/// In-process store that lives as long as the process.
pub struct MemoryStore {
    entries: Mutex<LruCache<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_capacity(MEMORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn put(&self, key: &str, value: String) -> Result<(), CacheError> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(key.to_string(), value);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.pop(key);
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
        Ok(())
    }
}

/// One file per key inside a per-session directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the platform cache directory, scoped to `session`.
    pub fn for_session(session: &str) -> Result<Self, CacheError> {
        let base = dirs::cache_dir().ok_or(CacheError::NoCacheDir)?;
        Ok(Self::new(
            base.join("w3c-activity").join(format!("session-{}", session)),
        ))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> CacheError {
    CacheError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn put(&self, key: &str, value: String) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;
        let path = self.path_for(key);
        fs::write(&path, value).map_err(|e| io_error(&path, e))
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(io_error(&path, e)),
            _ => Ok(()),
        }
    }

    fn clear(&self) -> Result<(), CacheError> {
        match fs::remove_dir_all(&self.dir) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(io_error(&self.dir, e)),
            _ => Ok(()),
        }
    }
}

/// The key for entries written by a resolution strategy at the current schema version.
pub fn cache_key(strategy: &str) -> CacheKey {
    CacheKey::new(strategy, SCHEMA_VERSION)
}

/// Manages caching of view models in a session store
pub struct CacheManager<S> {
    backend: S,
}

impl<S: SessionStore> CacheManager<S> {
    /// Create a new cache manager
    pub fn new(store: S) -> Self {
        Self { backend: store }
    }

    /// Store a view model in the cache
    pub fn store(&self, key: &CacheKey, view: &ViewModel) -> Result<(), CacheError> {
        let serialized = serde_json::to_string(view)?;
        self.backend.put(&key.to_string(), serialized)?;
        tracing::debug!(key = %key, "stored view model");
        Ok(())
    }

    /// Retrieve a view model from the cache
    ///
    /// Entries that no longer deserialize are dropped and reported as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<ViewModel> {
        let raw = self.backend.get(&key.to_string())?;
        match serde_json::from_str(&raw) {
            Ok(view) => Some(view),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "discarding unreadable cache entry");
                if let Err(e) = self.backend.remove(&key.to_string()) {
                    tracing::warn!(key = %key, error = %e, "failed to remove cache entry");
                }
                None
            }
        }
    }

    /// Clear the cache
    pub fn clear(&self) -> Result<(), CacheError> {
        self.backend.clear()
    }
}
