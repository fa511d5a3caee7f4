//! Repository façade over the store, reconciler, merge policy and import
//! pipeline.
//!
//! Compound operations call the store's locked methods as separate
//! sections; there is no cross-call atomicity, so two concurrent callers
//! performing read-modify-write on the same playlist race last-write-wins
//! at whole-collection granularity. Callers needing stronger guarantees
//! serialize at a higher level.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use crate::error::Result;
use crate::import::{ImportPipeline, SharePayload};
use crate::merge::merge_into_caption_playlist;
use crate::model::{ImportResult, ImportSummary, ItemStatus, Playlist, PlaylistItem, new_entity_id};
use crate::reconcile::{Reconciled, reconcile};
use crate::storage_ref::StorageResolver;
use crate::store::PlaylistStore;
use crate::title::resolve_title;

/// High-level operations over the playlist collection.
pub struct PlaylistRepository {
    store: PlaylistStore,
    pipeline: Arc<dyn ImportPipeline>,
    resolver: Arc<dyn StorageResolver>,
}

impl PlaylistRepository {
    /// Compose a repository from its collaborators.
    #[must_use]
    pub fn new(
        store: PlaylistStore,
        pipeline: Arc<dyn ImportPipeline>,
        resolver: Arc<dyn StorageResolver>,
    ) -> Self {
        Self {
            store,
            pipeline,
            resolver,
        }
    }

    /// The underlying store, for collaborators that need playlist-scoped
    /// storage directories.
    #[must_use]
    pub fn store(&self) -> &PlaylistStore {
        &self.store
    }

    /// Whether an item's backing storage is currently reachable.
    #[must_use]
    pub fn item_exists(&self, item: &PlaylistItem) -> bool {
        self.resolver.exists(&item.local_path)
    }

    /// Load the collection, dropping references to unreachable media.
    ///
    /// Every load reconciles; the reconciled form is persisted only when it
    /// differs from what was read.
    ///
    /// # Errors
    ///
    /// Returns an error if a changed collection cannot be written back.
    pub async fn load_playlists(&self) -> Result<Vec<Playlist>> {
        let current = self.store.load().await;

        let mut reconciled = Vec::with_capacity(current.len());
        let mut changed = false;
        for playlist in &current {
            match reconcile(playlist, |item| self.resolver.exists(&item.local_path)) {
                Reconciled::Unchanged => reconciled.push(playlist.clone()),
                Reconciled::Updated(updated) => {
                    debug!(
                        "Reconciliation adjusted playlist {}: {} of {} items kept",
                        playlist.playlist_id,
                        updated.item_count,
                        playlist.items.len()
                    );
                    changed = true;
                    reconciled.push(updated);
                }
                Reconciled::Empty => {
                    info!(
                        "Dropping playlist {} with no reachable items",
                        playlist.playlist_id
                    );
                    changed = true;
                }
            }
        }

        if changed {
            self.store.replace(reconciled.clone()).await?;
        }
        Ok(reconciled)
    }

    /// Import a share payload, merging into an existing caption playlist or
    /// creating a new one.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting collection cannot be written.
    pub async fn import_payload(&self, payload: &SharePayload) -> Result<ImportResult> {
        let created_at = now_millis();
        let draft = self.pipeline.import_payload(payload);
        let title = resolve_title(
            payload.first_description.as_deref(),
            payload.caption.as_deref(),
            draft.first_display_name.as_deref(),
            created_at,
        );

        if draft.items.is_empty() {
            return Ok(ImportResult {
                playlist: None,
                summary: ImportSummary {
                    title,
                    imported_count: 0,
                    skipped_count: draft.skipped_count,
                    unsupported_count: draft.unsupported_count,
                    total_bytes: 0,
                },
            });
        }

        let existing = self.load_playlists().await?;
        if let Some(merged) = merge_into_caption_playlist(
            &existing,
            draft.items.clone(),
            payload.caption.as_deref(),
            created_at,
            payload.source_app.as_deref(),
        ) {
            if merged.added_count > 0 {
                self.store.upsert(merged.playlist.clone()).await?;
                info!(
                    "Merged {} items into caption playlist {}",
                    merged.added_count, merged.playlist.playlist_id
                );
            } else {
                debug!(
                    "Import into caption playlist {} added nothing new; skipping store write",
                    merged.playlist.playlist_id
                );
            }
            return Ok(ImportResult {
                summary: ImportSummary {
                    title,
                    imported_count: merged.added_count,
                    skipped_count: draft.skipped_count + merged.duplicate_count,
                    unsupported_count: draft.unsupported_count,
                    total_bytes: merged.added_bytes,
                },
                playlist: Some(merged.playlist),
            });
        }

        // No caption key: a standalone playlist from the draft.
        let mut items = draft.items;
        items.sort_by_key(|item| item.import_order_index);
        for (index, item) in items.iter_mut().enumerate() {
            item.import_order_index = index;
        }
        let total_bytes: u64 = items.iter().map(|item| item.bytes).sum();

        let playlist = Playlist {
            playlist_id: new_entity_id(),
            title: title.clone(),
            created_at,
            updated_at: None,
            source_app: payload.source_app.clone(),
            caption_key: None,
            item_count: items.len(),
            total_bytes,
            items,
        };
        self.store.upsert(playlist.clone()).await?;
        info!(
            "Imported {} items into new playlist {}",
            playlist.item_count, playlist.playlist_id
        );

        Ok(ImportResult {
            summary: ImportSummary {
                title,
                imported_count: draft.imported_count,
                skipped_count: draft.skipped_count,
                unsupported_count: draft.unsupported_count,
                total_bytes: draft.total_bytes,
            },
            playlist: Some(playlist),
        })
    }

    /// Delete a playlist; unknown ids are a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be written.
    pub async fn delete_playlist(&self, playlist_id: &str) -> Result<()> {
        self.store.remove(playlist_id).await
    }

    /// Delete one item, re-sequencing the survivors; a playlist emptied by
    /// the deletion is removed entirely. Unknown ids are a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be written.
    pub async fn delete_item(&self, playlist_id: &str, item_id: &str) -> Result<()> {
        let playlists = self.load_playlists().await?;
        let Some(playlist) = playlists.iter().find(|p| p.playlist_id == playlist_id) else {
            return Ok(());
        };

        match reconcile(playlist, |item| item.item_id != item_id) {
            Reconciled::Unchanged => Ok(()),
            Reconciled::Updated(updated) => self.store.upsert(updated).await,
            Reconciled::Empty => {
                info!(
                    "Deleting playlist {} emptied by item removal",
                    playlist_id
                );
                self.store.remove(playlist_id).await
            }
        }
    }

    /// Mark one item as failing to decode. Status only; no re-indexing.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be written.
    pub async fn mark_item_decode_failed(&self, playlist_id: &str, item_id: &str) -> Result<()> {
        let playlists = self.load_playlists().await?;
        let Some(mut target) = playlists
            .into_iter()
            .find(|p| p.playlist_id == playlist_id)
        else {
            return Ok(());
        };

        let mut modified = false;
        for item in &mut target.items {
            if item.item_id == item_id && item.status != ItemStatus::DecodeFailed {
                item.status = ItemStatus::DecodeFailed;
                modified = true;
            }
        }

        if modified {
            self.store.upsert(target).await
        } else {
            Ok(())
        }
    }

    /// Save probed durations for a playlist. Items absent from the map are
    /// left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be written.
    pub async fn save_durations(
        &self,
        playlist_id: &str,
        durations: &HashMap<String, u64>,
    ) -> Result<()> {
        let playlists = self.load_playlists().await?;
        let Some(mut target) = playlists
            .into_iter()
            .find(|p| p.playlist_id == playlist_id)
        else {
            return Ok(());
        };

        let mut modified = false;
        for item in &mut target.items {
            if let Some(&duration) = durations.get(&item.item_id)
                && item.duration_ms != Some(duration)
            {
                item.duration_ms = Some(duration);
                modified = true;
            }
        }

        if modified {
            self.store.upsert(target).await
        } else {
            Ok(())
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{ImportDraft, MockImportPipeline};
    use crate::storage_ref::{MockStorageResolver, StorageRef};
    use tempfile::TempDir;

    fn draft_item(id: &str, name: &str, order: usize, bytes: u64) -> PlaylistItem {
        PlaylistItem {
            item_id: id.to_string(),
            import_order_index: order,
            original_display_name: name.to_string(),
            mime_type: "video/mp4".to_string(),
            local_path: StorageRef::new(format!("content://media/{id}")),
            bytes,
            duration_ms: None,
            status: ItemStatus::Ready,
        }
    }

    fn always_exists() -> Arc<MockStorageResolver> {
        let mut resolver = MockStorageResolver::new();
        resolver.expect_exists().return_const(true);
        Arc::new(resolver)
    }

    fn pipeline_returning(draft: ImportDraft) -> Arc<MockImportPipeline> {
        let mut pipeline = MockImportPipeline::new();
        pipeline
            .expect_import_payload()
            .returning(move |_| draft.clone());
        Arc::new(pipeline)
    }

    fn repository(
        temp: &TempDir,
        pipeline: Arc<dyn ImportPipeline>,
        resolver: Arc<dyn StorageResolver>,
    ) -> PlaylistRepository {
        let store = PlaylistStore::new(temp.path()).expect("Should create store");
        PlaylistRepository::new(store, pipeline, resolver)
    }

    fn assert_invariants(playlist: &Playlist) {
        assert_eq!(playlist.item_count, playlist.items.len());
        assert_eq!(
            playlist.total_bytes,
            playlist.items.iter().map(|i| i.bytes).sum::<u64>()
        );
        let orders: Vec<usize> = playlist.items.iter().map(|i| i.import_order_index).collect();
        let expected: Vec<usize> = (0..playlist.items.len()).collect();
        assert_eq!(orders, expected);
        assert!(!playlist.items.is_empty());
    }

    #[tokio::test]
    async fn test_captionless_import_creates_standalone_playlist() {
        let temp = TempDir::new().expect("Should create temp dir");
        let draft = ImportDraft {
            items: vec![
                draft_item("b", "b.mp4", 1, 20),
                draft_item("a", "a.mp4", 0, 10),
            ],
            imported_count: 2,
            skipped_count: 1,
            unsupported_count: 1,
            total_bytes: 30,
            first_display_name: Some("a.mp4".to_string()),
        };
        let repo = repository(&temp, pipeline_returning(draft), always_exists());

        let payload = SharePayload::default();
        let result = repo.import_payload(&payload).await.expect("Should import");

        let playlist = result.playlist.expect("Should create playlist");
        assert_invariants(&playlist);
        assert_eq!(playlist.caption_key, None);
        let ids: Vec<&str> = playlist.items.iter().map(|i| i.item_id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);

        assert_eq!(result.summary.imported_count, 2);
        assert_eq!(result.summary.skipped_count, 1);
        assert_eq!(result.summary.unsupported_count, 1);
        assert_eq!(result.summary.total_bytes, 30);

        let persisted = repo.load_playlists().await.expect("Should load");
        assert_eq!(persisted.len(), 1);
        assert_invariants(&persisted[0]);
    }

    #[tokio::test]
    async fn test_captioned_imports_merge_into_one_playlist() {
        let temp = TempDir::new().expect("Should create temp dir");

        let first = ImportDraft {
            items: vec![
                draft_item("e1", "part1.mp4", 0, 10),
                draft_item("e2", "part2.mp4", 1, 20),
            ],
            imported_count: 2,
            skipped_count: 0,
            unsupported_count: 0,
            total_bytes: 30,
            first_display_name: Some("part1.mp4".to_string()),
        };
        let repo = repository(&temp, pipeline_returning(first), always_exists());
        let payload = SharePayload {
            caption: Some("My List".to_string()),
            ..Default::default()
        };
        let first_result = repo.import_payload(&payload).await.expect("Should import");
        let first_playlist = first_result.playlist.expect("Should create");
        assert_eq!(first_playlist.caption_key.as_deref(), Some("my list"));

        let second = ImportDraft {
            items: vec![
                draft_item("n1", "PART2.mp4", 0, 20),
                draft_item("n2", "part10.mp4", 1, 100),
                draft_item("n3", "part3.mp4", 2, 30),
            ],
            imported_count: 3,
            skipped_count: 0,
            unsupported_count: 0,
            total_bytes: 150,
            first_display_name: Some("PART2.mp4".to_string()),
        };
        let repo = repository(&temp, pipeline_returning(second), always_exists());
        let payload = SharePayload {
            caption: Some(" my   list ".to_string()),
            ..Default::default()
        };
        let second_result = repo.import_payload(&payload).await.expect("Should merge");

        assert_eq!(second_result.summary.imported_count, 2);
        assert_eq!(second_result.summary.skipped_count, 1);
        assert_eq!(second_result.summary.total_bytes, 130);

        let merged = second_result.playlist.expect("Should merge");
        assert_eq!(merged.playlist_id, first_playlist.playlist_id);
        assert_invariants(&merged);
        let names: Vec<&str> = merged
            .items
            .iter()
            .map(|i| i.original_display_name.as_str())
            .collect();
        assert_eq!(names, ["part1.mp4", "part2.mp4", "part3.mp4", "part10.mp4"]);

        let persisted = repo.load_playlists().await.expect("Should load");
        assert_eq!(persisted.len(), 1);
    }

    #[tokio::test]
    async fn test_all_duplicate_import_writes_nothing() {
        let temp = TempDir::new().expect("Should create temp dir");

        let first = ImportDraft {
            items: vec![draft_item("e1", "part1.mp4", 0, 10)],
            imported_count: 1,
            skipped_count: 0,
            unsupported_count: 0,
            total_bytes: 10,
            first_display_name: Some("part1.mp4".to_string()),
        };
        let repo = repository(&temp, pipeline_returning(first), always_exists());
        let payload = SharePayload {
            caption: Some("dups".to_string()),
            ..Default::default()
        };
        repo.import_payload(&payload).await.expect("Should import");
        let before = repo.store().load().await;

        let replay = ImportDraft {
            items: vec![draft_item("n1", "part1.mp4", 0, 10)],
            imported_count: 1,
            skipped_count: 0,
            unsupported_count: 0,
            total_bytes: 10,
            first_display_name: Some("part1.mp4".to_string()),
        };
        let repo = repository(&temp, pipeline_returning(replay), always_exists());
        let result = repo.import_payload(&payload).await.expect("Should no-op");

        assert_eq!(result.summary.imported_count, 0);
        assert_eq!(result.summary.skipped_count, 1);
        assert_eq!(result.summary.total_bytes, 0);

        let after = repo.store().load().await;
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_empty_draft_yields_no_playlist() {
        let temp = TempDir::new().expect("Should create temp dir");
        let draft = ImportDraft {
            items: Vec::new(),
            imported_count: 0,
            skipped_count: 2,
            unsupported_count: 1,
            total_bytes: 0,
            first_display_name: Some("skipped.txt".to_string()),
        };
        let repo = repository(&temp, pipeline_returning(draft), always_exists());

        let result = repo
            .import_payload(&SharePayload::default())
            .await
            .expect("Should import");

        assert!(result.playlist.is_none());
        assert_eq!(result.summary.imported_count, 0);
        assert_eq!(result.summary.skipped_count, 2);
        assert_eq!(result.summary.unsupported_count, 1);
        assert!(repo.load_playlists().await.expect("Should load").is_empty());
    }

    #[tokio::test]
    async fn test_load_prunes_unreachable_items_and_persists() {
        let temp = TempDir::new().expect("Should create temp dir");

        let draft = ImportDraft {
            items: vec![
                draft_item("keep", "a.mp4", 0, 10),
                draft_item("gone", "b.mp4", 1, 20),
            ],
            imported_count: 2,
            skipped_count: 0,
            unsupported_count: 0,
            total_bytes: 30,
            first_display_name: Some("a.mp4".to_string()),
        };
        let repo = repository(&temp, pipeline_returning(draft), always_exists());
        repo.import_payload(&SharePayload::default())
            .await
            .expect("Should import");

        let mut resolver = MockStorageResolver::new();
        resolver
            .expect_exists()
            .returning(|reference| !reference.as_str().contains("gone"));
        let repo = repository(&temp, Arc::new(MockImportPipeline::new()), Arc::new(resolver));

        let loaded = repo.load_playlists().await.expect("Should load");
        assert_eq!(loaded.len(), 1);
        assert_invariants(&loaded[0]);
        assert_eq!(loaded[0].items.len(), 1);
        assert_eq!(loaded[0].items[0].item_id, "keep");
        assert_eq!(loaded[0].total_bytes, 10);

        // The pruned form is what a direct store read now observes.
        let persisted = repo.store().load().await;
        assert_eq!(persisted[0].items.len(), 1);
    }

    #[tokio::test]
    async fn test_load_drops_playlist_with_no_reachable_items() {
        let temp = TempDir::new().expect("Should create temp dir");
        let draft = ImportDraft {
            items: vec![draft_item("only", "a.mp4", 0, 10)],
            imported_count: 1,
            skipped_count: 0,
            unsupported_count: 0,
            total_bytes: 10,
            first_display_name: Some("a.mp4".to_string()),
        };
        let repo = repository(&temp, pipeline_returning(draft), always_exists());
        repo.import_payload(&SharePayload::default())
            .await
            .expect("Should import");

        let mut resolver = MockStorageResolver::new();
        resolver.expect_exists().return_const(false);
        let repo = repository(&temp, Arc::new(MockImportPipeline::new()), Arc::new(resolver));

        assert!(repo.load_playlists().await.expect("Should load").is_empty());
        assert!(repo.store().load().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_item_reindexes_and_deletes_emptied_playlist() {
        let temp = TempDir::new().expect("Should create temp dir");
        let draft = ImportDraft {
            items: vec![
                draft_item("a", "a.mp4", 0, 10),
                draft_item("b", "b.mp4", 1, 20),
            ],
            imported_count: 2,
            skipped_count: 0,
            unsupported_count: 0,
            total_bytes: 30,
            first_display_name: Some("a.mp4".to_string()),
        };
        let repo = repository(&temp, pipeline_returning(draft), always_exists());
        let playlist = repo
            .import_payload(&SharePayload::default())
            .await
            .expect("Should import")
            .playlist
            .expect("Should create");

        repo.delete_item(&playlist.playlist_id, "a")
            .await
            .expect("Should delete");
        let loaded = repo.load_playlists().await.expect("Should load");
        assert_invariants(&loaded[0]);
        assert_eq!(loaded[0].items[0].item_id, "b");
        assert_eq!(loaded[0].items[0].import_order_index, 0);

        repo.delete_item(&playlist.playlist_id, "b")
            .await
            .expect("Should delete");
        assert!(repo.load_playlists().await.expect("Should load").is_empty());
    }

    #[tokio::test]
    async fn test_delete_item_with_unknown_ids_is_a_no_op() {
        let temp = TempDir::new().expect("Should create temp dir");
        let draft = ImportDraft {
            items: vec![draft_item("a", "a.mp4", 0, 10)],
            imported_count: 1,
            skipped_count: 0,
            unsupported_count: 0,
            total_bytes: 10,
            first_display_name: Some("a.mp4".to_string()),
        };
        let repo = repository(&temp, pipeline_returning(draft), always_exists());
        let playlist = repo
            .import_payload(&SharePayload::default())
            .await
            .expect("Should import")
            .playlist
            .expect("Should create");

        repo.delete_item("no-such-playlist", "a")
            .await
            .expect("Should no-op");
        repo.delete_item(&playlist.playlist_id, "no-such-item")
            .await
            .expect("Should no-op");

        let loaded = repo.load_playlists().await.expect("Should load");
        assert_eq!(loaded[0].items.len(), 1);
    }

    #[tokio::test]
    async fn test_mark_decode_failed_keeps_order_and_totals() {
        let temp = TempDir::new().expect("Should create temp dir");
        let draft = ImportDraft {
            items: vec![
                draft_item("a", "a.mp4", 0, 10),
                draft_item("b", "b.mp4", 1, 20),
            ],
            imported_count: 2,
            skipped_count: 0,
            unsupported_count: 0,
            total_bytes: 30,
            first_display_name: Some("a.mp4".to_string()),
        };
        let repo = repository(&temp, pipeline_returning(draft), always_exists());
        let playlist = repo
            .import_payload(&SharePayload::default())
            .await
            .expect("Should import")
            .playlist
            .expect("Should create");

        repo.mark_item_decode_failed(&playlist.playlist_id, "b")
            .await
            .expect("Should mark");

        let loaded = repo.load_playlists().await.expect("Should load");
        assert_invariants(&loaded[0]);
        let statuses: Vec<ItemStatus> = loaded[0].items.iter().map(|i| i.status).collect();
        assert_eq!(statuses, [ItemStatus::Ready, ItemStatus::DecodeFailed]);
    }

    #[tokio::test]
    async fn test_save_durations_updates_only_mapped_items() {
        let temp = TempDir::new().expect("Should create temp dir");
        let draft = ImportDraft {
            items: vec![
                draft_item("a", "a.mp4", 0, 10),
                draft_item("b", "b.mp4", 1, 20),
            ],
            imported_count: 2,
            skipped_count: 0,
            unsupported_count: 0,
            total_bytes: 30,
            first_display_name: Some("a.mp4".to_string()),
        };
        let repo = repository(&temp, pipeline_returning(draft), always_exists());
        let playlist = repo
            .import_payload(&SharePayload::default())
            .await
            .expect("Should import")
            .playlist
            .expect("Should create");

        let durations = HashMap::from([("a".to_string(), 90_000_u64)]);
        repo.save_durations(&playlist.playlist_id, &durations)
            .await
            .expect("Should save");

        let loaded = repo.load_playlists().await.expect("Should load");
        assert_invariants(&loaded[0]);
        assert_eq!(loaded[0].items[0].duration_ms, Some(90_000));
        assert_eq!(loaded[0].items[1].duration_ms, None);
    }

    #[tokio::test]
    async fn test_delete_playlist_removes_it_and_ignores_unknown_ids() {
        let temp = TempDir::new().expect("Should create temp dir");
        let draft = ImportDraft {
            items: vec![draft_item("a", "a.mp4", 0, 10)],
            imported_count: 1,
            skipped_count: 0,
            unsupported_count: 0,
            total_bytes: 10,
            first_display_name: Some("a.mp4".to_string()),
        };
        let repo = repository(&temp, pipeline_returning(draft), always_exists());
        let playlist = repo
            .import_payload(&SharePayload::default())
            .await
            .expect("Should import")
            .playlist
            .expect("Should create");

        repo.delete_playlist("unknown").await.expect("Should no-op");
        assert_eq!(repo.load_playlists().await.expect("Should load").len(), 1);

        repo.delete_playlist(&playlist.playlist_id)
            .await
            .expect("Should delete");
        assert!(repo.load_playlists().await.expect("Should load").is_empty());
    }
}
