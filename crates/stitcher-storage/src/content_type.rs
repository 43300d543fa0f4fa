//! Content type and extension helpers for object keys.

use std::path::Path;

/// Extension used when a key carries none.
pub const DEFAULT_AUDIO_EXTENSION: &str = "mp3";

/// MIME type for a key or file name, falling back to `application/octet-stream`.
pub fn content_type_for(name: &str) -> String {
    mime_guess::from_path(name)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}

/// Lower-cased extension of an object key, or `default` when there is none.
pub fn extension_or(key: &str, default: &str) -> String {
    let file_name = key.rsplit('/').next().unwrap_or(key);
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| default.to_string())
}
