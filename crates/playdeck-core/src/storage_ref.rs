//! Opaque storage references and the capability to resolve them.
//!
//! An item's backing storage is identified by an opaque string (an absolute
//! path or a URI). The core never branches on the string itself; anything
//! that needs to know whether the bytes are still reachable goes through a
//! [`StorageResolver`] supplied by the embedding application.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, FileSystemError, Result};

/// Opaque reference to an item's backing storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct StorageRef(String);

impl StorageRef {
    /// Wrap a raw reference string.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Build a reference from a filesystem path.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }

    /// The raw reference string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StorageRef {
    fn from(reference: &str) -> Self {
        Self(reference.to_string())
    }
}

/// Capability to resolve opaque storage references.
///
/// Implementations may block on I/O; callers treat each call as synchronous
/// and never parallelize across items.
#[cfg_attr(test, mockall::automock)]
pub trait StorageResolver: Send + Sync {
    /// Check whether the referenced storage still exists.
    fn exists(&self, reference: &StorageRef) -> bool;

    /// Open the referenced storage for reading.
    fn open_for_read(&self, reference: &StorageRef) -> Result<Box<dyn Read + Send>>;
}

/// Resolver for references backed by the local filesystem.
///
/// Understands plain paths and `file://` URIs; any other scheme resolves to
/// "not found" rather than an error, since such references belong to a
/// platform-specific resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorageResolver;

impl FsStorageResolver {
    /// Create a new filesystem resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn to_path(reference: &StorageRef) -> Option<PathBuf> {
        let raw = reference.as_str();
        if let Some(stripped) = raw.strip_prefix("file://") {
            return Some(PathBuf::from(stripped));
        }
        if raw.contains("://") {
            return None;
        }
        Some(PathBuf::from(raw))
    }
}

impl StorageResolver for FsStorageResolver {
    fn exists(&self, reference: &StorageRef) -> bool {
        Self::to_path(reference).is_some_and(|path| path.exists())
    }

    fn open_for_read(&self, reference: &StorageRef) -> Result<Box<dyn Read + Send>> {
        let path = Self::to_path(reference).ok_or_else(|| {
            Error::FileSystem(FileSystemError::NotFound {
                path: PathBuf::from(reference.as_str()),
            })
        })?;
        let file = File::open(&path).map_err(|e| {
            Error::FileSystem(FileSystemError::ReadFailed {
                path: path.clone(),
                reason: e.to_string(),
            })
        })?;
        Ok(Box::new(file))
    }
}
