//! Reconciliation of persisted playlists against their backing storage.
//!
//! Loading can surface playlists whose items reference storage that no
//! longer exists. Reconciliation drops those items and re-establishes the
//! index/count/byte invariants. The same primitive powers explicit item
//! deletion, with a predicate that excludes the deleted id.

use crate::model::{Playlist, PlaylistItem};

/// Outcome of reconciling one playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// Every item survived and the playlist was already consistent; the
    /// caller can skip a redundant store write.
    Unchanged,
    /// Items were dropped or re-sequenced; the caller should persist the
    /// updated playlist.
    Updated(Playlist),
    /// No item survived; the caller must delete the playlist, which is
    /// never stored empty.
    Empty,
}

/// Drop items rejected by `exists` and re-sequence the survivors.
///
/// Pure: the input playlist is left untouched and the predicate is
/// consulted once per item, in the item list's current order. Survivors
/// keep their relative order (by current index) and receive fresh
/// contiguous indices; count and byte totals are recomputed.
pub fn reconcile<F>(playlist: &Playlist, exists: F) -> Reconciled
where
    F: Fn(&PlaylistItem) -> bool,
{
    let mut kept: Vec<PlaylistItem> = playlist
        .items
        .iter()
        .filter(|item| exists(item))
        .cloned()
        .collect();

    if kept.is_empty() {
        return Reconciled::Empty;
    }

    kept.sort_by_key(|item| item.import_order_index);
    for (index, item) in kept.iter_mut().enumerate() {
        item.import_order_index = index;
    }

    let item_count = kept.len();
    let total_bytes: u64 = kept.iter().map(|item| item.bytes).sum();

    let unchanged = item_count == playlist.item_count
        && total_bytes == playlist.total_bytes
        && kept == playlist.items;

    if unchanged {
        Reconciled::Unchanged
    } else {
        Reconciled::Updated(Playlist {
            item_count,
            total_bytes,
            items: kept,
            ..playlist.clone()
        })
    }
}
