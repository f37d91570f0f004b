//! Path utilities for detecting file types by extension.
//!
//! These are used by the watcher to decide which files enter the ingestion
//! queue and by the serving layer to decide which caption files may be
//! delivered.

use std::path::Path;

/// Media container extensions accepted into the ingestion queue by default.
const MEDIA_EXTENSIONS: &[&str] = &["mp4", "webm", "avi", "mkv", "mov", "flv", "wmv"];

/// Caption formats listed in the subtitle cache and served to players.
const CAPTION_EXTENSIONS: &[&str] = &["srt", "vtt"];

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Check if a path has a supported media extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use cinecache_common::paths::is_media_file;
///
/// assert!(is_media_file(Path::new("movie.mkv")));
/// assert!(is_media_file(Path::new("/path/to/video.MP4")));
/// assert!(!is_media_file(Path::new("subtitle.srt")));
/// ```
pub fn is_media_file(path: &Path) -> bool {
    has_extension(path, MEDIA_EXTENSIONS)
}

/// Check if a path has a servable caption extension (`srt` or `vtt`).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use cinecache_common::paths::is_caption_file;
///
/// assert!(is_caption_file(Path::new("movie.srt")));
/// assert!(is_caption_file(Path::new("movie.VTT")));
/// assert!(!is_caption_file(Path::new("movie.ass")));
/// ```
pub fn is_caption_file(path: &Path) -> bool {
    has_extension(path, CAPTION_EXTENSIONS)
}

/// Check a path against an arbitrary extension list (case-insensitive,
/// entries given without the leading dot).
pub fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    lowercase_extension(path)
        .map(|ext| {
            extensions
                .iter()
                .any(|e| e.as_ref().trim_start_matches('.').eq_ignore_ascii_case(&ext))
        })
        .unwrap_or(false)
}

/// Get the default list of media extensions.
#[must_use]
pub fn media_extensions() -> &'static [&'static str] {
    MEDIA_EXTENSIONS
}

/// Get the list of caption extensions.
#[must_use]
pub fn caption_extensions() -> &'static [&'static str] {
    CAPTION_EXTENSIONS
}

/// MIME type for a caption file, if it is a servable caption format.
pub fn caption_content_type(path: &Path) -> Option<&'static str> {
    match lowercase_extension(path)?.as_str() {
        "srt" => Some("text/srt"),
        "vtt" => Some("text/vtt"),
        _ => None,
    }
}
