//! Shared entity model for playlists and imported media items.
//!
//! Every playlist the core returns or persists satisfies the consistency
//! invariants: `item_count` equals `items.len()`, `total_bytes` equals the
//! sum of item sizes, and item order indices form the contiguous range
//! `0..item_count` with no gaps or repeats.

use serde::{Deserialize, Serialize};

use crate::storage_ref::StorageRef;

/// Decoding status of an imported media item.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    /// The item is playable.
    #[default]
    Ready,
    /// The player failed to decode the item.
    DecodeFailed,
    /// The item was removed by the user.
    Deleted,
}

impl ItemStatus {
    /// Parse a status from its persisted symbolic name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "READY" => Some(Self::Ready),
            "DECODE_FAILED" => Some(Self::DecodeFailed),
            "DELETED" => Some(Self::Deleted),
            _ => None,
        }
    }

    /// The persisted symbolic name of this status.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::DecodeFailed => "DECODE_FAILED",
            Self::Deleted => "DELETED",
        }
    }
}

/// One imported media reference within a playlist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    /// Opaque unique identifier, stable for the item's lifetime.
    pub item_id: String,
    /// Position within the playlist; contiguous from 0 across all items.
    pub import_order_index: usize,
    /// Display name the item was imported under.
    pub original_display_name: String,
    /// Resolved mime type.
    pub mime_type: String,
    /// Opaque reference to the backing storage.
    pub local_path: StorageRef,
    /// Size in bytes.
    pub bytes: u64,
    /// Playback duration in milliseconds, filled in by a later probe.
    pub duration_ms: Option<u64>,
    /// Current decoding status.
    #[serde(default)]
    pub status: ItemStatus,
}

/// A named, ordered, persisted collection of media item references.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    /// Opaque unique identifier, stable for the playlist's lifetime.
    pub playlist_id: String,
    /// Human-readable title.
    pub title: String,
    /// Creation timestamp (Unix epoch milliseconds), set once.
    pub created_at: u64,
    /// Last merge timestamp (Unix epoch milliseconds), if ever merged into.
    pub updated_at: Option<u64>,
    /// Identifier of the application the content was shared from.
    pub source_app: Option<String>,
    /// Normalized caption key used for merge grouping; unique across the
    /// store when present.
    pub caption_key: Option<String>,
    /// Number of items; always equals `items.len()`.
    pub item_count: usize,
    /// Total size in bytes; always equals the sum of item sizes.
    pub total_bytes: u64,
    /// Items ordered by `import_order_index`.
    pub items: Vec<PlaylistItem>,
}

/// Counters describing the outcome of one import operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// Resolved playlist title.
    pub title: String,
    /// Number of items actually added.
    pub imported_count: usize,
    /// Number of sources skipped, including merge-policy duplicates.
    pub skipped_count: usize,
    /// Number of sources rejected as unsupported media.
    pub unsupported_count: usize,
    /// Total bytes actually added.
    pub total_bytes: u64,
}

/// Result of one import operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    /// The created or extended playlist; `None` when nothing was imported.
    pub playlist: Option<Playlist>,
    /// Import counters.
    pub summary: ImportSummary,
}

/// Generate a fresh opaque identifier for playlists and items.
#[must_use]
pub fn new_entity_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
