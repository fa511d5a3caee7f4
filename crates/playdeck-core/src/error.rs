//! Error types for Playdeck core operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Playdeck core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// File system operation failed.
    #[error("File system error: {0}")]
    FileSystem(#[from] FileSystemError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// File system failures, carrying the path that was being operated on.
#[derive(Debug, Error)]
pub enum FileSystemError {
    /// Reading a file or directory failed.
    #[error("Failed to read {path}: {reason}")]
    ReadFailed {
        /// Path where the error occurred.
        path: PathBuf,
        /// Underlying failure description.
        reason: String,
    },

    /// Writing a file failed.
    #[error("Failed to write {path}: {reason}")]
    WriteFailed {
        /// Path where the error occurred.
        path: PathBuf,
        /// Underlying failure description.
        reason: String,
    },

    /// Creating a directory failed.
    #[error("Failed to create directory {path}: {reason}")]
    CreateDirFailed {
        /// Path where the error occurred.
        path: PathBuf,
        /// Underlying failure description.
        reason: String,
    },

    /// Deleting a file or directory failed.
    #[error("Failed to delete {path}: {reason}")]
    DeleteFailed {
        /// Path where the error occurred.
        path: PathBuf,
        /// Underlying failure description.
        reason: String,
    },

    /// Copying a file failed.
    #[error("Failed to copy {source_path} to {destination}: {reason}")]
    CopyFailed {
        /// Source path of the copy.
        source_path: PathBuf,
        /// Destination path of the copy.
        destination: PathBuf,
        /// Underlying failure description.
        reason: String,
    },

    /// A path does not exist.
    #[error("Not found: {path}")]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },
}

impl FileSystemError {
    /// The path the failed operation was targeting.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::ReadFailed { path, .. }
            | Self::WriteFailed { path, .. }
            | Self::CreateDirFailed { path, .. }
            | Self::DeleteFailed { path, .. }
            | Self::NotFound { path } => path,
            Self::CopyFailed { destination, .. } => destination,
        }
    }
}
