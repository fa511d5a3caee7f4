//! Playdeck Core Library
//!
//! This crate provides the core functionality for the Playdeck application:
//! - Durable playlist persistence with a single mutex-serialized index
//! - Startup reconciliation against backing storage
//! - Caption-keyed merging of successive shared imports
//! - Import pipeline for local media files
//! - Application configuration management
//!
//! # Error Handling
//!
//! Fallible operations return the crate-wide [`Result`]; malformed
//! persisted data and unreachable media are recovered from, never surfaced
//! as errors.
//!
//! ```rust,ignore
//! use playdeck_core::{PlaylistRepository, Result};
//!
//! async fn boot(repository: &PlaylistRepository) -> Result<()> {
//!     let playlists = repository.load_playlists().await?;
//!     // Your code here
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod import;
pub mod media;
pub mod merge;
pub mod model;
pub mod reconcile;
pub mod repository;
pub mod storage_ref;
pub mod store;
pub mod title;

pub use codec::{DEFAULT_DISPLAY_NAME, DEFAULT_MIME_TYPE};
pub use config::{AppConfig, ConfigManager, default_playlists_directory};
pub use error::{Error, FileSystemError, Result};
pub use import::{FsImportPipeline, ImportDraft, ImportPipeline, SharePayload};
pub use media::{
    MediaValidation, detect_supported_media, duration_text, extract_display_name,
    file_name_without_extension, normalize_extension, readable_size, sanitize_file_name,
};
pub use merge::{CaptionMergeResult, caption_key, compare_natural, merge_into_caption_playlist};
pub use model::{
    ImportResult, ImportSummary, ItemStatus, Playlist, PlaylistItem, new_entity_id,
};
pub use reconcile::{Reconciled, reconcile};
pub use repository::PlaylistRepository;
pub use storage_ref::{FsStorageResolver, StorageRef, StorageResolver};
pub use store::{INDEX_FILE_NAME, PlaylistStore};
pub use title::resolve_title;
