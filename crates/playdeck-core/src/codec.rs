//! Lossy-tolerant translation between the entity model and the persisted
//! JSON record format.
//!
//! The index file has no version field; compatibility across application
//! updates relies entirely on field-level tolerance. Decoding never fails:
//! unparseable input yields an empty collection, a record missing an
//! identity field is dropped, and every other missing or wrong-typed field
//! takes a documented default.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::Result;
use crate::model::{ItemStatus, Playlist, PlaylistItem};
use crate::storage_ref::StorageRef;

/// Placeholder display name for item records missing one.
pub const DEFAULT_DISPLAY_NAME: &str = "Media file";

/// Fallback mime type for item records missing one.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

#[derive(Serialize)]
struct CollectionRecord<'a> {
    playlists: &'a [Playlist],
}

/// Encode the full collection as pretty-printed JSON.
///
/// Deterministic: field order follows the entity model and every field is
/// present, absent optionals serialized as `null`.
pub fn encode(playlists: &[Playlist]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&CollectionRecord { playlists })?)
}

/// Decode a persisted collection, tolerating malformed and legacy records.
#[must_use]
pub fn decode(raw: &str) -> Vec<Playlist> {
    let Ok(root) = serde_json::from_str::<Value>(raw) else {
        if !raw.trim().is_empty() {
            warn!("Discarding unparseable playlist index");
        }
        return Vec::new();
    };
    let Some(entries) = root.get("playlists").and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let playlist = decode_playlist(entry);
            if playlist.is_none() && !entry.is_null() {
                warn!("Dropping playlist record missing identity fields");
            }
            playlist
        })
        .collect()
}

fn decode_playlist(value: &Value) -> Option<Playlist> {
    let record = value.as_object()?;
    let playlist_id = non_blank_string(record.get("playlistId"))?;
    let title = non_blank_string(record.get("title"))?;

    let items: Vec<PlaylistItem> = record
        .get("items")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(decode_item).collect())
        .unwrap_or_default();

    Some(Playlist {
        playlist_id,
        title,
        created_at: u64_or_zero(record.get("createdAt")),
        updated_at: positive_u64(record.get("updatedAt")),
        source_app: optional_string(record.get("sourceApp")),
        caption_key: optional_string(record.get("captionKey")),
        item_count: record
            .get("itemCount")
            .and_then(Value::as_u64)
            .map_or(items.len(), |count| count as usize),
        total_bytes: u64_or_zero(record.get("totalBytes")),
        items,
    })
}

fn decode_item(value: &Value) -> Option<PlaylistItem> {
    let record = value.as_object()?;
    let item_id = non_blank_string(record.get("itemId"))?;
    let local_path = non_blank_string(record.get("localPath"))?;

    let status = record
        .get("status")
        .and_then(Value::as_str)
        .and_then(ItemStatus::parse)
        .unwrap_or_default();

    Some(PlaylistItem {
        item_id,
        import_order_index: u64_or_zero(record.get("importOrderIndex")) as usize,
        original_display_name: non_blank_string(record.get("originalDisplayName"))
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()),
        mime_type: non_blank_string(record.get("mimeType"))
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
        local_path: StorageRef::new(local_path),
        bytes: u64_or_zero(record.get("bytes")),
        duration_ms: record.get("durationMs").and_then(Value::as_u64),
        status,
    })
}

fn non_blank_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn optional_string(value: Option<&Value>) -> Option<String> {
    non_blank_string(value).filter(|s| s != "null")
}

fn u64_or_zero(value: Option<&Value>) -> u64 {
    value.and_then(Value::as_u64).unwrap_or(0)
}

fn positive_u64(value: Option<&Value>) -> Option<u64> {
    value.and_then(Value::as_u64).filter(|&v| v > 0)
}
