//! Durable storage for the signed-in identity
//!
//! The store keeps one entry under a well-known key, like browser local
//! storage would. `FileSessionStore` writes it as a small JSON document;
//! `MemorySessionStore` keeps it in memory (tests, ephemeral sessions).

use crate::error::Result;
use crate::state::Identity;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Key under which the identity is persisted
pub const STORAGE_KEY: &str = "identity";

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read the persisted identity, if any
    async fn load(&self) -> Result<Option<Identity>>;

    async fn save(&self, identity: &Identity) -> Result<()>;

    /// Remove the persisted identity; removing nothing is not an error
    async fn clear(&self) -> Result<()>;
}

/// On-disk document; the field name is the storage key, see [`STORAGE_KEY`]
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSession {
    #[serde(default)]
    identity: Option<Identity>,
}

/// JSON file backed store
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
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<Identity>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No persisted session");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let stored: StoredSession = serde_json::from_slice(&bytes)?;
        Ok(stored.identity)
    }

    async fn save(&self, identity: &Identity) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let stored = StoredSession {
            identity: Some(identity.clone()),
        };
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(&stored)?).await?;
        debug!(path = %self.path.display(), "Session persisted");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<Identity>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a persisted identity
    pub fn with_identity(identity: Identity) -> Self {
        Self {
            slot: Mutex::new(Some(identity)),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Identity>> {
        // a poisoned slot still holds a valid Option
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<Identity>> {
        Ok(self.slot().clone())
    }

    async fn save(&self, identity: &Identity) -> Result<()> {
        *self.slot() = Some(identity.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}
