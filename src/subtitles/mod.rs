//! Caption acquisition and delivery.
//!
//! - [`archive`] -- [`SubtitleArchive`] trait and the SubDL client.
//! - [`transcribe`] -- [`Transcriber`] trait and the whisper.cpp fallback.
//! - [`source`] -- [`SubtitleSource`], the acquisition policy.
//!
//! The helpers here map media files to subtitle directories and caption
//! files to the records served by the API.

pub mod archive;
pub mod source;
pub mod transcribe;

pub use archive::{ArchiveItem, ArchiveQuery, SubdlArchive, SubtitleArchive};
pub use source::{Acquisition, AcquisitionRequest, SubtitleSource};
pub use transcribe::{Transcriber, WhisperTranscriber};

use std::path::{Component, Path, PathBuf};

use cinecache_common::paths::{caption_extensions, has_extension};
use cinecache_common::{Error, Result};

use crate::library::SubtitleRecord;

/// Subtitle directory for a media file: the file's location relative to the
/// media root, mirrored under the subtitle root, plus one directory per file.
///
/// `movies/Show/Show.S01E01.mkv` -> `subs/Show/Show.S01E01/`
pub fn subtitle_dir_for(media_root: &Path, subtitles_root: &Path, media: &Path) -> PathBuf {
    let stem = media.file_stem().unwrap_or(media.as_os_str());
    let relative_parent = media
        .strip_prefix(media_root)
        .ok()
        .and_then(Path::parent)
        .unwrap_or(Path::new(""));

    subtitles_root.join(relative_parent).join(stem)
}

/// Build API records for caption files.
pub fn records_for(files: &[PathBuf], lang: &str, public_url: &str) -> Vec<SubtitleRecord> {
    files
        .iter()
        .map(|path| SubtitleRecord {
            id: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            lang: lang.to_string(),
            url: format!(
                "{}/api/subtitle-file?path={}",
                public_url.trim_end_matches('/'),
                urlencoding::encode(&path.to_string_lossy())
            ),
        })
        .collect()
}

/// Validate a requested caption file path before serving it.
///
/// Checked in order: existence, caption extension, containment in
/// `subtitles_root`.
pub fn resolve_caption_file(subtitles_root: &Path, requested: &str) -> Result<PathBuf> {
    let path = Path::new(requested);
    if requested.is_empty() || !path.is_file() {
        return Err(Error::not_found(requested));
    }

    if !has_extension(path, caption_extensions()) {
        return Err(Error::invalid_input(format!(
            "unsupported caption format: {requested}"
        )));
    }

    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(Error::forbidden(requested));
    }

    let canonical = path.canonicalize()?;
    let root = subtitles_root
        .canonicalize()
        .map_err(|_| Error::forbidden(requested))?;
    if !canonical.starts_with(&root) {
        return Err(Error::forbidden(requested));
    }

    Ok(canonical)
}
