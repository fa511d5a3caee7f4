//! Resolution of a human-readable playlist title from import context.

use chrono::{Local, TimeZone};

use crate::media::file_name_without_extension;

/// Label prefix used when nothing better than a timestamp is available.
const FALLBACK_TITLE_PREFIX: &str = "Imported playlist";

/// Pick a playlist title.
///
/// Priority order: the first shared entry's description, then the caption,
/// then the first file name without its extension, then a timestamp label.
#[must_use]
pub fn resolve_title(
    first_description: Option<&str>,
    caption: Option<&str>,
    first_file_name: Option<&str>,
    created_at_ms: u64,
) -> String {
    if let Some(description) = non_blank(first_description) {
        return description.to_string();
    }
    if let Some(caption) = non_blank(caption) {
        return caption.to_string();
    }
    if let Some(stem) = first_file_name
        .map(file_name_without_extension)
        .and_then(|stem| non_blank(Some(stem)))
    {
        return stem.to_string();
    }
    format!("{FALLBACK_TITLE_PREFIX} {}", format_timestamp(created_at_ms))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn format_timestamp(created_at_ms: u64) -> String {
    let millis = i64::try_from(created_at_ms).unwrap_or(i64::MAX);
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map_or_else(|| created_at_ms.to_string(), |stamp| stamp.format("%Y-%m-%d %H:%M").to_string())
}
