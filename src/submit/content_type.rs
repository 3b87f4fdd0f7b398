//! Content-type detection from the file extension.
//!
//! The service uses the declared `Content-Type` to route the payload to the
//! right parser, so a wrong value degrades extraction quality rather than
//! failing the request. Unknown extensions fall back to
//! `application/octet-stream` and let the server sniff.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;

/// Fallback for unknown extensions.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

static CONTENT_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (
            "docx",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ),
        ("doc", "application/msword"),
        ("pdf", "application/pdf"),
        ("txt", "text/plain"),
        ("md", "text/markdown"),
        ("csv", "text/csv"),
        ("json", "application/json"),
        ("html", "text/html"),
        ("rtf", "application/rtf"),
        (
            "xlsx",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ),
        ("xls", "application/vnd.ms-excel"),
        ("png", "image/png"),
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
    ])
});

/// Detect the MIME type for a path from its extension (case-insensitive).
pub fn detect(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .and_then(|ext| CONTENT_TYPES.get(ext.as_str()).copied())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}
