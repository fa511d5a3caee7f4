//! Durable playlist collection store.
//!
//! The whole collection persists as one JSON index file under the store's
//! root directory; there is never partial visibility of an in-progress
//! write. Every public operation holds the store's async mutex for its full
//! duration, so a write always reflects a read performed under the same
//! lock and two concurrent mutations cannot silently drop one another.
//!
//! Read-modify-write sequences spanning multiple public calls (load then
//! upsert, as the repository does) are NOT atomic across the gap; under
//! concurrent callers the last writer's view of the collection wins.

use std::fs;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::codec;
use crate::error::{Error, FileSystemError, Result};
use crate::model::Playlist;

/// Name of the JSON index file holding the full collection.
pub const INDEX_FILE_NAME: &str = "index.json";

/// Durable store for the playlist collection.
pub struct PlaylistStore {
    root_dir: PathBuf,
    index_file: PathBuf,
    lock: Mutex<()>,
}

impl PlaylistStore {
    /// Create a store rooted at the given directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be created.
    pub fn new(root_dir: impl Into<PathBuf>) -> Result<Self> {
        let root_dir = root_dir.into();
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir).map_err(|e| {
                Error::FileSystem(FileSystemError::CreateDirFailed {
                    path: root_dir.clone(),
                    reason: e.to_string(),
                })
            })?;
        }
        let index_file = root_dir.join(INDEX_FILE_NAME);
        Ok(Self {
            root_dir,
            index_file,
            lock: Mutex::new(()),
        })
    }

    /// Root directory holding the index and playlist-scoped directories.
    #[must_use]
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Load the persisted collection, newest first.
    ///
    /// An absent, unreadable or corrupt index degrades to an empty
    /// collection; it is never an error.
    pub async fn load(&self) -> Vec<Playlist> {
        let _guard = self.lock.lock().await;
        let mut playlists = self.load_unlocked();
        playlists.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        playlists
    }

    /// Replace the playlist with the same id, or append it, then write the
    /// full collection back.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be written.
    pub async fn upsert(&self, playlist: Playlist) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut current = self.load_unlocked();
        current.retain(|existing| existing.playlist_id != playlist.playlist_id);
        current.push(playlist);
        self.save_unlocked(&current)
    }

    /// Remove a playlist by id and write the collection back; removing an
    /// unknown id is a no-op (the write still happens).
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be written.
    pub async fn remove(&self, playlist_id: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut current = self.load_unlocked();
        current.retain(|existing| existing.playlist_id != playlist_id);
        self.save_unlocked(&current)
    }

    /// Wholesale replacement of the collection, used after reconciliation.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be written.
    pub async fn replace(&self, playlists: Vec<Playlist>) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.save_unlocked(&playlists)
    }

    /// Return the playlist-scoped storage directory, creating it if needed.
    ///
    /// Collaborators that physically copy media bytes place them here; the
    /// reference-only import variant never uses it.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn playlist_dir(&self, playlist_id: &str) -> Result<PathBuf> {
        let dir = self.root_dir.join(playlist_id);
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| {
                Error::FileSystem(FileSystemError::CreateDirFailed {
                    path: dir.clone(),
                    reason: e.to_string(),
                })
            })?;
        }
        Ok(dir)
    }

    fn load_unlocked(&self) -> Vec<Playlist> {
        if !self.index_file.exists() {
            return Vec::new();
        }
        match fs::read_to_string(&self.index_file) {
            Ok(content) => codec::decode(&content),
            Err(e) => {
                warn!(
                    "Failed to read playlist index at {}: {e}",
                    self.index_file.display()
                );
                Vec::new()
            }
        }
    }

    fn save_unlocked(&self, playlists: &[Playlist]) -> Result<()> {
        if let Some(parent) = self.index_file.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| {
                Error::FileSystem(FileSystemError::CreateDirFailed {
                    path: parent.to_path_buf(),
                    reason: e.to_string(),
                })
            })?;
        }

        let content = codec::encode(playlists)?;
        fs::write(&self.index_file, content).map_err(|e| {
            Error::FileSystem(FileSystemError::WriteFailed {
                path: self.index_file.clone(),
                reason: e.to_string(),
            })
        })?;
        debug!(
            "Persisted {} playlists to {}",
            playlists.len(),
            self.index_file.display()
        );
        Ok(())
    }
}
