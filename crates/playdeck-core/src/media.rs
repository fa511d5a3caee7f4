//! Supported-media detection and file name helpers.

use std::path::Path;

/// Container extensions the player can decode.
const SUPPORTED_EXTENSIONS: [&str; 5] = ["mp3", "mp4", "mkv", "mov", "webm"];

/// Known mime types mapped to their canonical extension.
const SUPPORTED_MIMES: [(&str, &str); 6] = [
    ("audio/mpeg", "mp3"),
    ("audio/mp3", "mp3"),
    ("video/mp4", "mp4"),
    ("video/x-matroska", "mkv"),
    ("video/quicktime", "mov"),
    ("video/webm", "webm"),
];

/// Fallback display name when a source yields no usable basename.
const FALLBACK_DISPLAY_NAME: &str = "Media file";

/// Verdict of media support detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaValidation {
    /// Whether the media is in a supported container.
    pub is_supported: bool,
    /// Resolved mime type, from the hint or inferred from the extension.
    pub mime_type: Option<String>,
    /// Resolved container extension.
    pub extension: Option<String>,
}

/// Decide whether media is supported, from a mime hint and/or a file name.
///
/// The mime hint wins when present; otherwise the extension is taken from
/// the file name and the mime type inferred back from it.
#[must_use]
pub fn detect_supported_media(mime_type: Option<&str>, file_name: Option<&str>) -> MediaValidation {
    let normalized_mime = mime_type.map(str::to_lowercase);
    let ext_from_mime = normalized_mime.as_deref().and_then(|mime| {
        SUPPORTED_MIMES
            .iter()
            .find(|(known, _)| *known == mime)
            .map(|(_, ext)| (*ext).to_string())
    });
    let ext_from_name = normalize_extension(file_name);

    let chosen_ext = ext_from_mime.or(ext_from_name);
    let is_supported = chosen_ext
        .as_deref()
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext));

    let resolved_mime = normalized_mime.or_else(|| {
        chosen_ext.as_deref().and_then(|ext| {
            SUPPORTED_MIMES
                .iter()
                .find(|(_, known)| *known == ext)
                .map(|(mime, _)| (*mime).to_string())
        })
    });

    MediaValidation {
        is_supported,
        mime_type: resolved_mime,
        extension: chosen_ext,
    }
}

/// Strip the extension from a file name; hidden files keep their name.
#[must_use]
pub fn file_name_without_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(index) => &name[..index],
    }
}

/// Lowercased extension of a file name, if it has one.
#[must_use]
pub fn normalize_extension(file_name: Option<&str>) -> Option<String> {
    let name = file_name?.trim();
    if name.is_empty() {
        return None;
    }
    name.rfind('.')
        .map(|index| &name[index + 1..])
        .filter(|ext| !ext.trim().is_empty())
        .map(str::to_lowercase)
}

/// Basename of a path or URI, with a generic fallback.
#[must_use]
pub fn extract_display_name(path_or_name: &str) -> String {
    Path::new(path_or_name)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_DISPLAY_NAME.to_string())
}

/// Replace characters unsafe for file names and cap the length.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let invalid_chars = ['/', '\\', ':', '*', '?', '"', '<', '>', '|', '\0'];

    let sanitized: String = name
        .chars()
        .map(|c| if invalid_chars.contains(&c) { '_' } else { c })
        .collect();

    let trimmed = sanitized.trim().trim_matches('.');
    let capped: String = trimmed.chars().take(200).collect();

    if capped.is_empty() {
        "imported-media".to_string()
    } else {
        capped
    }
}

/// Human-readable size, e.g. `3.4 MB`.
#[must_use]
pub fn readable_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let units = ["KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit_index = 0;
    value /= 1024.0;
    while value >= 1024.0 && unit_index < units.len() - 1 {
        value /= 1024.0;
        unit_index += 1;
    }
    format!("{value:.1} {}", units[unit_index])
}

/// Playback position as `m:ss`.
#[must_use]
pub fn duration_text(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes}:{seconds:02}")
}
