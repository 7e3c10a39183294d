//! Credential persistence.
//!
//! `get` never fails: anything missing or unreadable reads back as empty
//! strings, which the UI surfaces treat as "not configured yet". `set`
//! replaces all three fields at once so a concurrent reader never observes
//! a half-written record.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use wp_snippets::Credentials;

use super::error::CredentialError;

/// File name of the settings record inside the settings directory.
pub const CREDENTIALS_FILE_NAME: &str = "credentials.json";

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read the stored credentials, defaulting missing fields to empty strings.
    async fn get(&self) -> Credentials;

    /// Replace the stored credentials. No validation happens here.
    async fn set(&self, credentials: Credentials) -> Result<(), CredentialError>;
}

/// Whether a first-run configuration prompt should be shown.
pub async fn needs_configuration(store: &dyn CredentialStore) -> bool {
    !store.get().await.is_complete()
}

/// JSON file store, replaced atomically on every write.
///
/// The file is re-read on every `get` so edits made by another process
/// (for example `snip configure` while the relay is running) are picked up
/// by the next save.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    // Serializes writers against readers inside this process.
    lock: tokio::sync::RwLock<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: tokio::sync::RwLock::new(()),
        }
    }

    /// Store under `<config_dir>/snippet-relay/credentials.json`.
    pub fn default_location() -> Result<Self, CredentialError> {
        let dir = dirs::config_dir().ok_or(CredentialError::NoSettingsDir)?;
        Ok(Self::new(dir.join("snippet-relay").join(CREDENTIALS_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Credentials {
        let _guard = self.lock.read().await;
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No credentials stored yet");
                return Credentials::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read credentials");
                return Credentials::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Ignoring corrupt credentials file");
            Credentials::default()
        })
    }

    async fn write(&self, credentials: &Credentials) -> Result<(), CredentialError> {
        let payload = serde_json::to_vec_pretty(credentials)?;
        let path = self.path.clone();

        let _guard = self.lock.write().await;
        tokio::task::spawn_blocking(move || write_atomic(&path, &payload)).await??;

        debug!(path = %self.path.display(), "Credentials saved");
        Ok(())
    }
}

/// Replace `path` with `payload` through a synced temp file in the same directory.
fn write_atomic(path: &Path, payload: &[u8]) -> Result<(), CredentialError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|source| CredentialError::CreateDir {
        path: dir.clone(),
        source,
    })?;

    let write_err = |source| CredentialError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(payload).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self) -> Credentials {
        self.read().await
    }

    async fn set(&self, credentials: Credentials) -> Result<(), CredentialError> {
        self.write(&credentials).await
    }
}

/// In-memory store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Credentials>,
}

impl MemoryCredentialStore {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            inner: RwLock::new(credentials),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self) -> Credentials {
        self.inner.read().clone()
    }

    async fn set(&self, credentials: Credentials) -> Result<(), CredentialError> {
        *self.inner.write() = credentials;
        Ok(())
    }
}
