//! Local key-value cache for client state.
//!
//! Every slice of client state is stored as one JSON document under a fixed
//! key. [`FileStore`] keeps one `<key>.json` file per key in the data
//! directory; [`MemoryStore`] backs tests.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use foodcourt_core::UserId;

use crate::error::StorageError;

// =============================================================================
// Keys
// =============================================================================

pub const TOKEN: &str = "token";
pub const REFRESH_TOKEN: &str = "refreshToken";
pub const USER: &str = "user";
pub const COOKIE_CONSENT: &str = "cookieConsent";
pub const FAVORITES: &str = "favorites";
pub const RECENTLY_VIEWED: &str = "recentlyViewed";
pub const SHOPPING_LISTS: &str = "shoppingLists";
pub const CART: &str = "cart";

/// Loyalty accounts are stored per user.
#[must_use]
pub fn loyalty_key(user_id: UserId) -> String {
    format!("loyalty_{user_id}")
}

// =============================================================================
// LocalCache
// =============================================================================

/// Raw string storage.
pub trait LocalCache: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn set_raw(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Typed JSON access on top of [`LocalCache`].
pub trait LocalCacheExt: LocalCache {
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupt`] if the stored JSON does not decode.
    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        self.get_raw(key)?
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// # Errors
    ///
    /// Returns an error if the value cannot be encoded or written.
    fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<String, StorageError> {
        let raw = serde_json::to_string(value).map_err(|source| StorageError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.set_raw(key, &raw)?;
        Ok(raw)
    }
}

impl<C: LocalCache + ?Sized> LocalCacheExt for C {}

// =============================================================================
// FileStore
// =============================================================================

/// One JSON file per key under a directory, created on first write.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

fn io_error(key: &str) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        key: key.to_string(),
        source,
    }
}

impl LocalCache for FileStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key)(e)),
        }
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(io_error(key))?;
        // Write then rename so a crash never leaves a half-written document.
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value).map_err(io_error(key))?;
        fs::rename(&tmp, self.path(key)).map_err(io_error(key))?;
        debug!(key, "Stored");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key)(e)),
        }
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently stored, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = values.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl LocalCache for MemoryStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

// =============================================================================
// Remote sync
// =============================================================================

/// Hook for mirroring stored values to a remote service.
///
/// No backend endpoint exists for this yet, so [`NoRemoteSync`] is the only
/// implementation.
pub trait RemoteSync: Send + Sync {
    /// Called after `key` was written locally.
    ///
    /// # Errors
    ///
    /// Returns an error if the value could not be mirrored.
    fn push(&self, key: &str, raw: &str) -> Result<(), StorageError>;
}

/// Does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRemoteSync;

impl RemoteSync for NoRemoteSync {
    fn push(&self, _key: &str, _raw: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use foodcourt_core::Favorites;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.load::<Favorites>(FAVORITES).unwrap(), None);

        store.save(FAVORITES, &Favorites::new()).unwrap();
        assert_eq!(store.load::<Favorites>(FAVORITES).unwrap(), Some(Favorites::new()));

        store.remove(FAVORITES).unwrap();
        store.remove(FAVORITES).unwrap();
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_corrupt_value() {
        let store = MemoryStore::new();
        store.set_raw(FAVORITES, "{not json").unwrap();
        assert!(matches!(
            store.load::<Favorites>(FAVORITES),
            Err(StorageError::Corrupt { key, .. }) if key == FAVORITES
        ));
    }

    #[test]
    fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("data"));

        assert_eq!(store.get_raw(TOKEN).unwrap(), None);
        store.save(TOKEN, "abc").unwrap();
        assert_eq!(store.get_raw(TOKEN).unwrap().as_deref(), Some("\"abc\""));
        assert!(store.dir().join("token.json").exists());

        store.remove(TOKEN).unwrap();
        store.remove(TOKEN).unwrap();
        assert_eq!(store.load::<String>(TOKEN).unwrap(), None);
    }

    #[test]
    fn test_loyalty_key() {
        assert_eq!(loyalty_key(UserId::new(42)), "loyalty_42");
    }
}
