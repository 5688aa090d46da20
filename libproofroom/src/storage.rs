//! Cross-backend key-value storage for small secrets
//!
//! Persists opaque strings (the auth token, primarily) across two backends:
//! the OS keychain where one is available, or a mode-0600 JSON file under the
//! config directory otherwise. The backend is picked once at process start;
//! there is no runtime migration between backends.
//!
//! # Failure semantics
//!
//! [`StorageAdapter::set`] propagates failures to the caller. `get` and
//! `remove` degrade instead of propagating: a failed read reports the key as
//! absent and a failed remove is a no-op, so read paths stay usable when the
//! backend is flaky. `clear` is best-effort and sweeps the adapter's own key
//! registry. The keychain API cannot enumerate its entries, so the registry
//! is what makes `clear` work on that backend too.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::StorageConfig;
use crate::error::StorageError;

/// Well-known service name for keychain entries.
const KEYRING_SERVICE: &str = "proofroom";

/// Reserved key holding the adapter's registry of written key names.
const REGISTRY_KEY: &str = "__proofroom_keys";

type StoreResult<T> = std::result::Result<T, StorageError>;

/// Storage backend type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// OS-native keychain (macOS Keychain, Windows Credential Manager,
    /// Linux Secret Service)
    Keyring,
    /// JSON file under the config directory, mode 0600
    File,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Keyring => write!(f, "keyring"),
            BackendKind::File => write!(f, "file"),
        }
    }
}

/// Trait for secret storage backends
///
/// Backends store and fetch single opaque strings by key. Absent keys are
/// reported as [`StorageError::NotFound`]; deleting an absent key is not an
/// error.
pub trait SecretStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<String>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, key: &str) -> StoreResult<()>;
    fn backend_name(&self) -> &str;
}

/// OS keychain backend via the `keyring` crate.
///
/// The keychain may be unavailable (headless Linux without Secret Service,
/// containers without D-Bus); `new` probes for that so the adapter can fall
/// back to the file backend.
pub struct KeyringBackend;

impl KeyringBackend {
    pub fn new() -> StoreResult<Self> {
        // Probe availability by constructing an entry.
        keyring::Entry::new(KEYRING_SERVICE, "availability_check")?;
        Ok(Self)
    }

    fn entry(key: &str) -> StoreResult<keyring::Entry> {
        Ok(keyring::Entry::new(KEYRING_SERVICE, key)?)
    }
}

impl SecretStore for KeyringBackend {
    fn get(&self, key: &str) -> StoreResult<String> {
        match Self::entry(key)?.get_password() {
            Ok(value) => Ok(value),
            Err(keyring::Error::NoEntry) => Err(StorageError::NotFound(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        Self::entry(key)?.set_password(value)?;
        tracing::debug!("Stored {} in OS keychain", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        match Self::entry(key)?.delete_password() {
            Ok(()) => Ok(()),
            // Not an error to remove a key that isn't there
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn backend_name(&self) -> &str {
        "keyring"
    }
}

/// File backend: a JSON object of key-value pairs, mode 0600 on Unix.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn load(&self) -> StoreResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        validate_not_symlink(&self.path)?;
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, map: &BTreeMap<String, String>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, perms)?;
        }

        Ok(())
    }
}

impl SecretStore for FileBackend {
    fn get(&self, key: &str) -> StoreResult<String> {
        self.load()?
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut map = self.load()?;
        map.insert(key.to_string(), value.to_string());
        self.save(&map)?;
        tracing::debug!("Stored {} in {:?}", key, self.path);
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut map = self.load()?;
        if map.remove(key).is_some() {
            self.save(&map)?;
        }
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "file"
    }
}

/// Refuse to read or write storage files through symlinks.
pub fn validate_not_symlink(path: &Path) -> StoreResult<()> {
    let metadata = std::fs::symlink_metadata(path)?;
    if metadata.is_symlink() {
        return Err(StorageError::SymlinkRejected(path.display().to_string()));
    }
    Ok(())
}

/// Storage adapter facade over the platform-picked backend.
///
/// Keeps a registry of every key it has written (under a reserved name) so
/// that `clear` can sweep entries on the keychain backend as well.
pub struct StorageAdapter {
    store: Box<dyn SecretStore>,
}

impl StorageAdapter {
    /// Build the adapter for the current platform.
    ///
    /// An explicit `backend` in the config wins; otherwise the OS keychain is
    /// probed and the file backend is the fallback.
    pub fn new(config: &StorageConfig) -> StoreResult<Self> {
        let store: Box<dyn SecretStore> = match config.backend {
            Some(BackendKind::Keyring) => Box::new(KeyringBackend::new()?),
            Some(BackendKind::File) => Box::new(FileBackend::new(config.expanded_file_path())),
            None => match KeyringBackend::new() {
                Ok(backend) => Box::new(backend),
                Err(e) => {
                    tracing::warn!("OS keychain unavailable ({}), using file storage", e);
                    Box::new(FileBackend::new(config.expanded_file_path()))
                }
            },
        };

        tracing::debug!("Using {} storage backend", store.backend_name());
        Ok(Self { store })
    }

    /// Wrap a specific backend. Used by tests and embedders.
    pub fn with_store(store: Box<dyn SecretStore>) -> Self {
        Self { store }
    }

    pub fn backend_name(&self) -> &str {
        self.store.backend_name()
    }

    /// Read a key. Absent keys and backend failures both report `None`; a
    /// failure is logged but never propagated on the read path.
    pub fn get(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => Some(value),
            Err(StorageError::NotFound(_)) => None,
            Err(e) => {
                tracing::warn!("Storage read for {} failed, treating as absent: {}", key, e);
                None
            }
        }
    }

    /// Write a key. Failures propagate; callers must handle them.
    pub fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.store.set(key, value)?;
        if let Err(e) = self.register_key(key) {
            // The value is stored; only the clear() sweep loses track of it.
            tracing::warn!("Failed to register {} in the key registry: {}", key, e);
        }
        Ok(())
    }

    /// Remove a key, best-effort. Failures are logged and swallowed.
    pub fn remove(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            tracing::warn!("Storage remove for {} failed: {}", key, e);
        }
        if let Err(e) = self.unregister_key(key) {
            tracing::warn!("Failed to unregister {} from the key registry: {}", key, e);
        }
    }

    /// Remove every key this adapter has written, best-effort.
    ///
    /// Sweeps the registry rather than enumerating the backend, so it works
    /// on the keychain backend too. Keys written outside this adapter are
    /// not touched.
    pub fn clear(&self) {
        for key in self.registered_keys() {
            if let Err(e) = self.store.remove(&key) {
                tracing::warn!("Storage clear failed to remove {}: {}", key, e);
            }
        }
        if let Err(e) = self.store.remove(REGISTRY_KEY) {
            tracing::warn!("Storage clear failed to remove the key registry: {}", e);
        }
    }

    /// Keys currently tracked by the registry, sorted.
    pub fn registered_keys(&self) -> Vec<String> {
        match self.store.get(REGISTRY_KEY) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    fn register_key(&self, key: &str) -> StoreResult<()> {
        let mut keys = self.registered_keys();
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
            keys.sort();
            self.store.set(REGISTRY_KEY, &serde_json::to_string(&keys)?)?;
        }
        Ok(())
    }

    fn unregister_key(&self, key: &str) -> StoreResult<()> {
        let mut keys = self.registered_keys();
        let before = keys.len();
        keys.retain(|k| k != key);
        if keys.len() != before {
            self.store.set(REGISTRY_KEY, &serde_json::to_string(&keys)?)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file_adapter(dir: &TempDir) -> StorageAdapter {
        let path = dir.path().join("secrets.json");
        StorageAdapter::with_store(Box::new(FileBackend::new(path)))
    }

    #[test]
    fn test_set_get_roundtrip() {
        let dir = TempDir::new().unwrap();
        let adapter = file_adapter(&dir);

        adapter.set("auth_token", "tok-123").unwrap();
        assert_eq!(adapter.get("auth_token"), Some("tok-123".to_string()));
    }

    #[test]
    fn test_get_absent_key_is_none() {
        let dir = TempDir::new().unwrap();
        let adapter = file_adapter(&dir);
        assert_eq!(adapter.get("auth_token"), None);
    }

    #[test]
    fn test_set_overwrites() {
        let dir = TempDir::new().unwrap();
        let adapter = file_adapter(&dir);

        adapter.set("auth_token", "old").unwrap();
        adapter.set("auth_token", "new").unwrap();
        assert_eq!(adapter.get("auth_token"), Some("new".to_string()));
    }

    #[test]
    fn test_remove_is_a_noop_on_absent_key() {
        let dir = TempDir::new().unwrap();
        let adapter = file_adapter(&dir);
        adapter.remove("never_written");
        assert_eq!(adapter.get("never_written"), None);
    }

    #[test]
    fn test_remove_deletes_the_key() {
        let dir = TempDir::new().unwrap();
        let adapter = file_adapter(&dir);

        adapter.set("auth_token", "tok").unwrap();
        adapter.remove("auth_token");
        assert_eq!(adapter.get("auth_token"), None);
    }

    #[test]
    fn test_clear_sweeps_every_written_key() {
        let dir = TempDir::new().unwrap();
        let adapter = file_adapter(&dir);

        adapter.set("auth_token", "tok").unwrap();
        adapter.set("last_studio", "studio-1").unwrap();
        assert_eq!(adapter.registered_keys().len(), 2);

        adapter.clear();
        assert_eq!(adapter.get("auth_token"), None);
        assert_eq!(adapter.get("last_studio"), None);
        assert!(adapter.registered_keys().is_empty());
    }

    #[test]
    fn test_registry_tracks_writes_and_removes() {
        let dir = TempDir::new().unwrap();
        let adapter = file_adapter(&dir);

        adapter.set("a", "1").unwrap();
        adapter.set("b", "2").unwrap();
        adapter.set("a", "1-again").unwrap();
        assert_eq!(adapter.registered_keys(), vec!["a", "b"]);

        adapter.remove("a");
        assert_eq!(adapter.registered_keys(), vec!["b"]);
    }

    #[test]
    fn test_get_degrades_to_none_on_corrupt_backend() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secrets.json");
        std::fs::write(&path, "this is not json").unwrap();

        let adapter = StorageAdapter::with_store(Box::new(FileBackend::new(path)));
        assert_eq!(adapter.get("auth_token"), None);
    }

    #[test]
    fn test_set_propagates_backend_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secrets.json");
        std::fs::write(&path, "this is not json").unwrap();

        let adapter = StorageAdapter::with_store(Box::new(FileBackend::new(path)));
        assert!(adapter.set("auth_token", "tok").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_backend_rejects_symlinked_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target.json");
        let link = dir.path().join("secrets.json");
        std::fs::write(&target, "{}").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let backend = FileBackend::new(link);
        assert!(matches!(
            backend.get("auth_token"),
            Err(StorageError::SymlinkRejected(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_backend_sets_0600_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secrets.json");
        let backend = FileBackend::new(path.clone());
        backend.set("auth_token", "tok").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_file_backend_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secrets.json");

        FileBackend::new(path.clone()).set("auth_token", "tok").unwrap();
        let reopened = FileBackend::new(path);
        assert_eq!(reopened.get("auth_token").unwrap(), "tok");
    }

    #[test]
    fn test_backend_kind_serde() {
        assert_eq!(
            serde_json::to_string(&BackendKind::Keyring).unwrap(),
            "\"keyring\""
        );
        let kind: BackendKind = serde_json::from_str("\"file\"").unwrap();
        assert_eq!(kind, BackendKind::File);
    }
}
