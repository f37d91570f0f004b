//! Caption acquisition policy: archive first, transcription second.
//!
//! Progress is recorded in a marker file inside the title's subtitle
//! directory so an interrupted acquisition resumes where it stopped instead
//! of being skipped because the directory is non-empty.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cinecache_common::paths::is_caption_file;
use cinecache_common::{CacheId, EpisodeRef};
use cinecache_subtitles::Segmenter;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::archive::{ArchiveQuery, SubtitleArchive};
use super::transcribe::Transcriber;
use crate::error::IngestError;
use crate::library::AcquisitionStatus;

/// File recording acquisition progress for a subtitle directory.
pub const MARKER_FILE: &str = ".cinecache-acquisition.json";

/// Everything the source needs to acquire captions for one title.
#[derive(Debug, Clone)]
pub struct AcquisitionRequest {
    pub cache_id: CacheId,
    pub catalog_id: Option<String>,
    pub episode: Option<EpisodeRef>,
    pub media_path: PathBuf,
    pub dir: PathBuf,
}

impl AcquisitionRequest {
    /// Where a transcript for this title is written.
    pub fn transcript_path(&self) -> PathBuf {
        self.dir.join(format!("{}_ai.srt", self.cache_id.file_safe()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Acquisition {
    pub status: AcquisitionStatus,
    /// Caption files in the directory after acquisition, sorted by name.
    pub files: Vec<PathBuf>,
    /// Non-fatal failures encountered along the way.
    pub errors: Vec<IngestError>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Marker {
    status: AcquisitionStatus,
}

/// Combines the optional archive and transcriber with the segmenter.
#[derive(Clone)]
pub struct SubtitleSource {
    archive: Option<Arc<dyn SubtitleArchive>>,
    transcriber: Option<Arc<dyn Transcriber>>,
    segmenter: Segmenter,
    languages: String,
}

impl SubtitleSource {
    pub fn new(
        archive: Option<Arc<dyn SubtitleArchive>>,
        transcriber: Option<Arc<dyn Transcriber>>,
        segmenter: Segmenter,
        languages: impl Into<String>,
    ) -> Self {
        Self {
            archive,
            transcriber,
            segmenter,
            languages: languages.into(),
        }
    }

    /// Run the acquisition state machine from the persisted status to `Done`
    /// (or as far as the available sources allow).
    pub async fn obtain(&self, request: &AcquisitionRequest) -> Acquisition {
        let dir = &request.dir;
        let mut errors = Vec::new();

        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!(dir = %dir.display(), error = %e, "Failed to create subtitle directory");
            errors.push(IngestError::SubtitleFetch(format!("create {}: {e}", dir.display())));
            return Acquisition {
                status: AcquisitionStatus::NotStarted,
                files: Vec::new(),
                errors,
            };
        }

        let mut status = read_marker(dir).await;
        debug!(id = %request.cache_id, status = ?status, "Starting acquisition");

        if status == AcquisitionStatus::NotStarted && !list_caption_files(dir).await.is_empty() {
            debug!(id = %request.cache_id, "Captions already present, skipping acquisition");
            status = AcquisitionStatus::Done;
            write_marker(dir, status).await;
        }

        if status == AcquisitionStatus::NotStarted {
            self.try_archive(request, &mut errors).await;
            status = AcquisitionStatus::ArchiveTried;
            write_marker(dir, status).await;
        }

        if status == AcquisitionStatus::ArchiveTried {
            if !list_caption_files(dir).await.is_empty() {
                status = AcquisitionStatus::Done;
            } else if self.try_transcribe(request, &mut errors).await {
                status = AcquisitionStatus::Transcribed;
            }
            write_marker(dir, status).await;
        }

        if status == AcquisitionStatus::Transcribed
            && self.segment_transcript(request, &mut errors).await
        {
            status = AcquisitionStatus::Done;
            write_marker(dir, status).await;
        }

        let files = list_caption_files(dir).await;
        info!(
            id = %request.cache_id,
            status = ?status,
            files = files.len(),
            "Acquisition finished"
        );

        Acquisition {
            status,
            files,
            errors,
        }
    }

    async fn try_archive(&self, request: &AcquisitionRequest, errors: &mut Vec<IngestError>) {
        let (Some(archive), Some(catalog_id)) = (&self.archive, &request.catalog_id) else {
            return;
        };

        let query = ArchiveQuery {
            catalog_id: catalog_id.clone(),
            episode: request.episode,
            languages: self.languages.clone(),
        };

        let items = match archive.search(&query).await {
            Ok(items) => items,
            Err(e) => {
                let err = IngestError::SubtitleFetch(IngestError::chain(&e));
                warn!(id = %request.cache_id, archive = archive.name(), "{err}");
                errors.push(err);
                return;
            }
        };

        for item in &items {
            match archive.download_into(item, &request.dir).await {
                Ok(count) => debug!(item = %item.name, count, "Extracted archive"),
                Err(e) => {
                    let err = IngestError::Extraction(format!("{}: {}", item.url, IngestError::chain(&e)));
                    warn!(id = %request.cache_id, "{err}");
                    errors.push(err);
                }
            }
        }
    }

    async fn try_transcribe(&self, request: &AcquisitionRequest, errors: &mut Vec<IngestError>) -> bool {
        let Some(transcriber) = &self.transcriber else {
            return false;
        };

        match transcriber
            .transcribe(&request.media_path, &request.transcript_path())
            .await
        {
            Ok(_) => true,
            Err(e) => {
                let err = IngestError::Transcription(IngestError::chain(&e));
                warn!(id = %request.cache_id, transcriber = transcriber.name(), "{err}");
                errors.push(err);
                false
            }
        }
    }

    async fn segment_transcript(&self, request: &AcquisitionRequest, errors: &mut Vec<IngestError>) -> bool {
        let path = request.transcript_path();
        let segmenter = self.segmenter.clone();
        let result = tokio::task::spawn_blocking(move || {
            cinecache_subtitles::rewrite_srt_file(&path, &segmenter)
        })
        .await;

        match result {
            Ok(Ok(count)) => {
                debug!(id = %request.cache_id, segments = count, "Segmented transcript");
                true
            }
            Ok(Err(e)) => {
                let err = IngestError::Transcription(format!("segmentation: {e}"));
                warn!(id = %request.cache_id, "{err}");
                errors.push(err);
                false
            }
            Err(e) => {
                errors.push(IngestError::Transcription(format!("segmentation task: {e}")));
                false
            }
        }
    }
}

async fn read_marker(dir: &Path) -> AcquisitionStatus {
    match tokio::fs::read(dir.join(MARKER_FILE)).await {
        Ok(bytes) => serde_json::from_slice::<Marker>(&bytes)
            .map(|m| m.status)
            .unwrap_or_default(),
        Err(_) => AcquisitionStatus::NotStarted,
    }
}

async fn write_marker(dir: &Path, status: AcquisitionStatus) {
    let body = match serde_json::to_vec(&Marker { status }) {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "Failed to encode acquisition marker");
            return;
        }
    };
    if let Err(e) = tokio::fs::write(dir.join(MARKER_FILE), body).await {
        warn!(dir = %dir.display(), error = %e, "Failed to write acquisition marker");
    }
}

/// Caption files directly inside `dir`, sorted by file name.
pub async fn list_caption_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return files;
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if is_caption_file(&path) && path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    files
}
