//! Ingestion pipeline.
//!
//! File events enter through an [`IngestHandle`]. Supported media paths are
//! pushed onto an unbounded FIFO channel drained by a single worker task, so
//! at most one path is ever mid-pipeline. For each path the worker:
//!
//! 1. normalizes the file name and identifies it against the catalog,
//! 2. skips the path when the un-suffixed cache id is already present,
//! 3. appends the `:season:episode` suffix for identified episodes and
//!    commits the movie entry,
//! 4. acquires captions (archive, then transcription) unless the title
//!    already has a subtitle entry, and commits the subtitle entry.
//!
//! `unlink` and `change` evict immediately and bump a per-path generation;
//! the worker drops any commit for a path whose generation moved since it
//! was enqueued.

mod queue;
mod scan;
mod worker;

pub use queue::IngestHandle;
pub use scan::initial_scan;
pub use worker::{ProcessOutcome, SkipReason};

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::library::{Library, LibraryEvent};
use crate::metadata::Identifier;
use crate::subtitles::SubtitleSource;

/// Pipeline settings derived from the configuration.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub media_dir: PathBuf,
    pub subtitles_dir: PathBuf,
    pub extensions: Vec<String>,
    /// Language reported on subtitle records.
    pub language: String,
    /// Prefix for subtitle file URLs.
    pub public_url: String,
}

impl IngestSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            media_dir: config.library.media_dir.clone(),
            subtitles_dir: config.library.subtitles_dir.clone(),
            extensions: config.library.extensions.clone(),
            language: config.subtitles.language.clone(),
            public_url: config.server.public_url.clone(),
        }
    }
}

/// Start the ingestion worker, returning the handle used to feed it.
///
/// The worker runs until every handle is dropped.
pub fn spawn_pipeline(
    library: Arc<Library>,
    identifier: Identifier,
    source: SubtitleSource,
    settings: IngestSettings,
    events: broadcast::Sender<LibraryEvent>,
) -> (IngestHandle, JoinHandle<()>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let generations = queue::Generations::default();

    let handle = IngestHandle::new(
        sender,
        library.clone(),
        generations.clone(),
        settings.extensions.clone(),
        events.clone(),
    );

    let worker = worker::Worker {
        library,
        identifier,
        source,
        settings: Arc::new(settings),
        generations,
        events,
    };
    let task = tokio::spawn(worker::run(receiver, worker));

    (handle, task)
}
