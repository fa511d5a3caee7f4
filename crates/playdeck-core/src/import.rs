//! Import pipeline: turns a share payload into draft playlist items.
//!
//! The pipeline resolves display name, mime type and size for every source
//! and reports per-source skip and unsupported counts; failures on one
//! source never abort the batch. The core consumes the pipeline only
//! through the [`ImportPipeline`] trait.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, FileSystemError, Result};
use crate::media::{detect_supported_media, extract_display_name, sanitize_file_name};
use crate::model::{ItemStatus, PlaylistItem, new_entity_id};
use crate::storage_ref::StorageRef;

/// A share/selection payload handed to the import pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharePayload {
    /// Storage references (paths or URIs) to import, in arrival order.
    pub sources: Vec<String>,
    /// Caption attached to the share, if any.
    pub caption: Option<String>,
    /// Description attached to the first shared entry, if any.
    pub first_description: Option<String>,
    /// Normalized identifier of the sharing application.
    pub source_app: Option<String>,
}

/// Draft produced by an import pipeline: candidate items plus counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportDraft {
    /// Accepted candidate items, carrying batch-local order indices.
    pub items: Vec<PlaylistItem>,
    /// Number of accepted items.
    pub imported_count: usize,
    /// Number of sources skipped for any reason.
    pub skipped_count: usize,
    /// Number of sources skipped because the media is unsupported.
    pub unsupported_count: usize,
    /// Total bytes across accepted items.
    pub total_bytes: u64,
    /// Display name of the first source seen, supported or not.
    pub first_display_name: Option<String>,
}

/// Turns a share payload into candidate items with resolved name, mime type
/// and size.
#[cfg_attr(test, mockall::automock)]
pub trait ImportPipeline: Send + Sync {
    /// Produce a draft from the payload. Per-source failures become skip
    /// counters, never errors.
    fn import_payload(&self, payload: &SharePayload) -> ImportDraft;
}

/// Import pipeline over the local filesystem.
///
/// Directory sources expand to their direct children. In reference mode
/// (the default) accepted items point at the original file; with a copy
/// directory configured, each accepted file is copied there first and the
/// item references the copy, so a later deletion of the original does not
/// break the playlist.
#[derive(Debug, Clone, Default)]
pub struct FsImportPipeline {
    copy_dir: Option<PathBuf>,
}

impl FsImportPipeline {
    /// Create a reference-mode pipeline.
    #[must_use]
    pub const fn new() -> Self {
        Self { copy_dir: None }
    }

    /// Copy accepted files into `copy_dir` instead of referencing originals.
    #[must_use]
    pub fn with_copy_dir(mut self, copy_dir: impl Into<PathBuf>) -> Self {
        self.copy_dir = Some(copy_dir.into());
        self
    }

    fn expand_sources(sources: &[String]) -> Vec<PathBuf> {
        let mut expanded = Vec::new();
        for raw in sources {
            let path = source_path(raw);
            if path.is_dir() {
                for entry in WalkDir::new(&path)
                    .min_depth(1)
                    .max_depth(1)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(std::result::Result::ok)
                {
                    if entry.path().is_file() {
                        expanded.push(entry.path().to_path_buf());
                    }
                }
            } else {
                expanded.push(path);
            }
        }
        expanded
    }

    fn resolve_reference(&self, path: &Path, display_name: &str) -> Option<StorageRef> {
        let Some(copy_dir) = &self.copy_dir else {
            return Some(StorageRef::from_path(path));
        };
        match copy_into(copy_dir, path, display_name) {
            Ok(copy) => Some(StorageRef::from_path(&copy)),
            Err(e) => {
                warn!(
                    "Failed to copy {} into import storage: {e}. \
                     Skipping entry to avoid a broken reference",
                    path.display()
                );
                None
            }
        }
    }
}

impl ImportPipeline for FsImportPipeline {
    fn import_payload(&self, payload: &SharePayload) -> ImportDraft {
        let mut items = Vec::new();
        let mut skipped = 0usize;
        let mut unsupported = 0usize;
        let mut total_bytes = 0u64;
        let mut first_display_name: Option<String> = None;

        for (index, path) in Self::expand_sources(&payload.sources).into_iter().enumerate() {
            let display_name = extract_display_name(&path.to_string_lossy());
            if first_display_name.is_none() {
                first_display_name = Some(display_name.clone());
            }

            let validation = detect_supported_media(None, Some(display_name.as_str()));
            let is_supported = validation.is_supported;
            let Some(mime_type) = validation.mime_type.filter(|_| is_supported) else {
                skipped += 1;
                unsupported += 1;
                debug!("Skipping unsupported source {}", path.display());
                continue;
            };

            let bytes = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            if bytes == 0 {
                skipped += 1;
                debug!("Skipping empty or unreadable source {}", path.display());
                continue;
            }

            let Some(local_path) = self.resolve_reference(&path, &display_name) else {
                skipped += 1;
                continue;
            };

            total_bytes += bytes;
            items.push(PlaylistItem {
                item_id: new_entity_id(),
                import_order_index: index,
                original_display_name: display_name,
                mime_type,
                local_path,
                bytes,
                duration_ms: None,
                status: ItemStatus::Ready,
            });
        }

        let imported_count = items.len();
        ImportDraft {
            items,
            imported_count,
            skipped_count: skipped,
            unsupported_count: unsupported,
            total_bytes,
            first_display_name,
        }
    }
}

fn source_path(raw: &str) -> PathBuf {
    PathBuf::from(raw.strip_prefix("file://").unwrap_or(raw))
}

fn copy_into(copy_dir: &Path, source: &Path, display_name: &str) -> Result<PathBuf> {
    if !copy_dir.exists() {
        fs::create_dir_all(copy_dir).map_err(|e| {
            Error::FileSystem(FileSystemError::CreateDirFailed {
                path: copy_dir.to_path_buf(),
                reason: e.to_string(),
            })
        })?;
    }

    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64);
    let safe_name = sanitize_file_name(display_name);
    let target = copy_dir.join(format!("{millis}-{}-{safe_name}", new_entity_id()));

    fs::copy(source, &target).map_err(|e| {
        let _ = fs::remove_file(&target);
        Error::FileSystem(FileSystemError::CopyFailed {
            source_path: source.to_path_buf(),
            destination: target.clone(),
            reason: e.to_string(),
        })
    })?;

    Ok(target)
}
