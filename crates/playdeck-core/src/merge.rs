//! Caption-keyed merge policy for shared imports.
//!
//! Successive shared imports carrying the same caption grow a single
//! playlist: incoming items whose filename is already present are
//! suppressed as duplicates, and the union is kept in natural (numeric
//! aware) filename order. A blank or absent caption means no merge is
//! attempted and the caller falls back to standalone-playlist creation.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::model::{Playlist, PlaylistItem, new_entity_id};

/// Fallback title when a caption trims to nothing.
const FALLBACK_TITLE: &str = "Playlist";

/// Result of grouping an incoming batch into a caption playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionMergeResult {
    /// The merged or freshly created playlist.
    pub playlist: Playlist,
    /// Number of incoming items actually added.
    pub added_count: usize,
    /// Number of incoming items suppressed as filename duplicates.
    pub duplicate_count: usize,
    /// Total bytes of the added items.
    pub added_bytes: u64,
}

/// Normalized grouping key for a share caption.
///
/// Trims, collapses internal whitespace runs to single spaces and
/// lowercases; a caption that normalizes to nothing yields `None`.
#[must_use]
pub fn caption_key(caption: Option<&str>) -> Option<String> {
    let caption = caption?;
    let normalized = caption
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Group an incoming batch into the existing playlist carrying the same
/// caption key, or start a new one.
///
/// Returns `None` when the caption has no key (blank/absent), signalling
/// the caller to create a standalone playlist instead. When an existing
/// playlist is found and every incoming item is a duplicate, the existing
/// playlist is returned untouched with `added_count == 0` so the caller can
/// skip the store write. Callers pass a non-empty batch; an emptied
/// playlist is never produced here.
#[must_use]
pub fn merge_into_caption_playlist(
    existing_playlists: &[Playlist],
    incoming_items: Vec<PlaylistItem>,
    caption: Option<&str>,
    created_at: u64,
    source_app: Option<&str>,
) -> Option<CaptionMergeResult> {
    let key = caption_key(caption)?;
    let title = caption
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map_or_else(|| FALLBACK_TITLE.to_string(), str::to_string);

    let existing = existing_playlists
        .iter()
        .find(|p| p.caption_key.as_deref() == Some(key.as_str()));

    let mut kept_names: HashSet<String> = existing
        .map(|p| {
            p.items
                .iter()
                .map(|item| normalized_file_name(&item.original_display_name))
                .collect()
        })
        .unwrap_or_default();

    let mut unique_incoming = Vec::new();
    let mut duplicates = 0usize;
    for item in incoming_items {
        let name = normalized_file_name(&item.original_display_name);
        if kept_names.contains(&name) {
            duplicates += 1;
        } else {
            kept_names.insert(name);
            unique_incoming.push(item);
        }
    }

    if let Some(existing) = existing
        && unique_incoming.is_empty()
    {
        return Some(CaptionMergeResult {
            playlist: existing.clone(),
            added_count: 0,
            duplicate_count: duplicates,
            added_bytes: 0,
        });
    }

    let added_count = unique_incoming.len();
    let added_bytes: u64 = unique_incoming.iter().map(|item| item.bytes).sum();

    let mut merged_items: Vec<PlaylistItem> =
        existing.map(|p| p.items.clone()).unwrap_or_default();
    merged_items.extend(unique_incoming);
    merged_items.sort_by(natural_item_order);
    for (index, item) in merged_items.iter_mut().enumerate() {
        item.import_order_index = index;
    }

    let item_count = merged_items.len();
    let total_bytes: u64 = merged_items.iter().map(|item| item.bytes).sum();

    let playlist = match existing {
        Some(existing) => Playlist {
            title,
            updated_at: Some(created_at),
            source_app: source_app
                .map(str::to_string)
                .or_else(|| existing.source_app.clone()),
            caption_key: Some(key),
            item_count,
            total_bytes,
            items: merged_items,
            ..existing.clone()
        },
        None => Playlist {
            playlist_id: new_entity_id(),
            title,
            created_at,
            updated_at: None,
            source_app: source_app.map(str::to_string),
            caption_key: Some(key),
            item_count,
            total_bytes,
            items: merged_items,
        },
    };

    Some(CaptionMergeResult {
        playlist,
        added_count,
        duplicate_count: duplicates,
        added_bytes,
    })
}

fn normalized_file_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn natural_item_order(left: &PlaylistItem, right: &PlaylistItem) -> Ordering {
    compare_natural(
        &left.original_display_name.to_lowercase(),
        &right.original_display_name.to_lowercase(),
    )
    .then_with(|| left.import_order_index.cmp(&right.import_order_index))
}

/// Natural (numeric-aware) total order over strings.
///
/// Embedded digit runs compare numerically without overflow: first by
/// stripped length, then as digit strings, then by the original un-stripped
/// run length. Outside digit runs characters compare directly, and a strict
/// prefix orders before its extension.
#[must_use]
pub fn compare_natural(a: &str, b: &str) -> Ordering {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let mut i = 0;
    let mut j = 0;

    while i < a_chars.len() && j < b_chars.len() {
        let ca = a_chars[i];
        let cb = b_chars[j];

        if ca.is_ascii_digit() && cb.is_ascii_digit() {
            let i_end = digit_run_end(&a_chars, i);
            let j_end = digit_run_end(&b_chars, j);
            let na = stripped_digits(&a_chars[i..i_end]);
            let nb = stripped_digits(&b_chars[j..j_end]);

            let by_length = na.len().cmp(&nb.len());
            if by_length != Ordering::Equal {
                return by_length;
            }
            let by_number = na.cmp(&nb);
            if by_number != Ordering::Equal {
                return by_number;
            }
            let by_original_length = (i_end - i).cmp(&(j_end - j));
            if by_original_length != Ordering::Equal {
                return by_original_length;
            }
            i = i_end;
            j = j_end;
            continue;
        }

        if ca != cb {
            return ca.cmp(&cb);
        }
        i += 1;
        j += 1;
    }

    a_chars.len().cmp(&b_chars.len())
}

fn digit_run_end(chars: &[char], start: usize) -> usize {
    let mut index = start;
    while index < chars.len() && chars[index].is_ascii_digit() {
        index += 1;
    }
    index
}

fn stripped_digits(run: &[char]) -> String {
    let start = run.iter().position(|&c| c != '0').unwrap_or(run.len());
    run[start..].iter().collect()
}
