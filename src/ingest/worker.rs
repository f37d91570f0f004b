use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use cinecache_common::CacheId;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use super::queue::{Generations, QueueItem};
use super::IngestSettings;
use crate::error::IngestError;
use crate::library::{AcquisitionStatus, Library, LibraryEvent, MovieEntry, SubtitleEntry};
use crate::metadata::Identifier;
use crate::subtitles::{records_for, subtitle_dir_for, AcquisitionRequest, SubtitleSource};

/// Why a queued path produced no commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The un-suffixed cache id already has an entry.
    Duplicate(CacheId),
    /// The path was evicted after it was queued.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Committed {
        id: CacheId,
        /// `None` when the title already had a subtitle entry.
        subtitles: Option<AcquisitionStatus>,
    },
    Skipped(SkipReason),
}

#[derive(Clone)]
pub(crate) struct Worker {
    pub(crate) library: Arc<Library>,
    pub(crate) identifier: Identifier,
    pub(crate) source: SubtitleSource,
    pub(crate) settings: Arc<IngestSettings>,
    pub(crate) generations: Generations,
    pub(crate) events: broadcast::Sender<LibraryEvent>,
}

/// Drain the queue one path at a time until every sender is dropped.
pub(crate) async fn run(mut receiver: mpsc::UnboundedReceiver<QueueItem>, worker: Worker) {
    info!("Ingestion worker started");

    while let Some(item) = receiver.recv().await {
        let (path, generation) = match item {
            QueueItem::Flush(done) => {
                let _ = done.send(());
                continue;
            }
            QueueItem::Path { path, generation } => (path, generation),
        };

        // Run each item in its own task so a panic only loses that item.
        let task_worker = worker.clone();
        let task_path = path.clone();
        let result =
            tokio::spawn(async move { task_worker.process(&task_path, generation).await }).await;

        let error = match result {
            Ok(Ok(outcome)) => {
                debug!(path = %path.display(), outcome = ?outcome, "Processed");
                continue;
            }
            Ok(Err(e)) => e,
            Err(join) => IngestError::QueueItem {
                path: path.display().to_string(),
                reason: join.to_string(),
            },
        };
        warn!("{error}; continuing with next path");
    }

    info!("Ingestion worker stopped (channel closed)");
}

impl Worker {
    fn is_stale(&self, path: &Path, generation: u64) -> bool {
        self.generations.current(path) != generation
    }

    /// Insert `entry`, then withdraw it if the path was evicted meanwhile.
    fn commit_movie(&self, entry: MovieEntry, path: &Path, generation: u64) -> bool {
        let id = entry.id.clone();
        self.library.insert_movie(entry);
        if self.is_stale(path, generation) {
            self.library.remove_movie_for_path(&id, path);
            return false;
        }
        true
    }

    pub(crate) async fn process(
        &self,
        path: &Path,
        generation: u64,
    ) -> Result<ProcessOutcome, IngestError> {
        if self.is_stale(path, generation) {
            debug!(path = %path.display(), "Path evicted before processing");
            return Ok(ProcessOutcome::Skipped(SkipReason::Stale));
        }

        let raw_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| IngestError::QueueItem {
                path: path.display().to_string(),
                reason: "file name is not valid UTF-8".to_string(),
            })?;

        let parsed = cinecache_parser::parse(raw_name);
        info!(path = %path.display(), title = %parsed.title, "Identifying");

        let identification = self.identifier.identify(&parsed).await;

        let base_id = CacheId::derive(identification.catalog_id.as_deref(), path);
        if self.library.contains(base_id.as_str()) {
            debug!(id = %base_id, path = %path.display(), "Already cached, skipping");
            return Ok(ProcessOutcome::Skipped(SkipReason::Duplicate(base_id)));
        }

        let cache_id = match (identification.is_identified(), parsed.episode) {
            (true, Some(episode)) => base_id.with_episode(episode),
            _ => base_id,
        };

        if self.is_stale(path, generation) {
            info!(id = %cache_id, path = %path.display(), "Path evicted during identification, dropping result");
            return Ok(ProcessOutcome::Skipped(SkipReason::Stale));
        }

        let entry = MovieEntry {
            id: cache_id.clone(),
            title: parsed.title.clone(),
            catalog_id: identification.catalog_id.clone(),
            media_type: identification.media_type,
            path: path.to_path_buf(),
            season: parsed.episode.map(|e| e.season),
            episode: parsed.episode.map(|e| e.episode),
            meta: identification.meta,
            added_at: Utc::now(),
        };
        if !self.commit_movie(entry, path, generation) {
            info!(id = %cache_id, path = %path.display(), "Path evicted while committing, entry withdrawn");
            return Ok(ProcessOutcome::Skipped(SkipReason::Stale));
        }
        let _ = self.events.send(LibraryEvent::TitleAdded {
            id: cache_id.clone(),
            title: parsed.title.clone(),
        });
        info!(id = %cache_id, path = %path.display(), "Committed title");

        if self.library.has_subtitles(cache_id.as_str()) {
            return Ok(ProcessOutcome::Committed {
                id: cache_id,
                subtitles: None,
            });
        }

        let request = AcquisitionRequest {
            cache_id: cache_id.clone(),
            catalog_id: identification.catalog_id,
            episode: parsed.episode,
            media_path: path.to_path_buf(),
            dir: subtitle_dir_for(&self.settings.media_dir, &self.settings.subtitles_dir, path),
        };
        let acquisition = self.source.obtain(&request).await;

        if self.is_stale(path, generation) {
            info!(id = %cache_id, path = %path.display(), "Path evicted during acquisition, dropping subtitles");
            return Ok(ProcessOutcome::Skipped(SkipReason::Stale));
        }

        let records = records_for(
            &acquisition.files,
            &self.settings.language,
            &self.settings.public_url,
        );
        let count = records.len();
        self.library.insert_subtitles(
            cache_id.clone(),
            SubtitleEntry {
                status: acquisition.status,
                records,
            },
        );
        let _ = self.events.send(LibraryEvent::SubtitlesReady {
            id: cache_id.clone(),
            count,
        });

        Ok(ProcessOutcome::Committed {
            id: cache_id,
            subtitles: Some(acquisition.status),
        })
    }
}
