//! The durable client-side session record.
//!
//! A single key holding a serialized demo identity: read at startup, written
//! on demo sign-in, cleared on sign-out. Remote sessions are never cached
//! here; the hosted auth subsystem owns those.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use super::Identity;

/// Errors reading or writing the session record.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Storage for the persisted session record.
pub trait SessionCache: Send + Sync {
    /// Read the stored identity, if any.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the store cannot be read. A present but
    /// unparseable record is treated as absent, not as an error.
    fn load(&self) -> Result<Option<Identity>, CacheError>;

    /// Persist an identity, replacing any stored one.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the store cannot be written.
    fn save(&self, identity: &Identity) -> Result<(), CacheError>;

    /// Remove the stored identity.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the store cannot be cleared.
    fn clear(&self) -> Result<(), CacheError>;
}

/// File-backed session record (one JSON document).
pub struct FileSessionCache {
    path: PathBuf,
}

impl FileSessionCache {
    /// Create a cache backed by the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionCache for FileSessionCache {
    fn load(&self) -> Result<Option<Identity>, CacheError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str(&raw) {
            Ok(identity) => Ok(Some(identity)),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Discarding unparseable session record"
                );
                Ok(None)
            }
        }
    }

    fn save(&self, identity: &Identity) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(identity)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Io(e)),
        }
    }
}

/// In-memory session record for tests.
#[derive(Default)]
pub struct MemorySessionCache {
    slot: Mutex<Option<Identity>>,
}

impl MemorySessionCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Identity>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionCache for MemorySessionCache {
    fn load(&self) -> Result<Option<Identity>, CacheError> {
        Ok(self.lock().clone())
    }

    fn save(&self, identity: &Identity) -> Result<(), CacheError> {
        *self.lock() = Some(identity.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        *self.lock() = None;
        Ok(())
    }
}
