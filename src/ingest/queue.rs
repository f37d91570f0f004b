use std::path::{Path, PathBuf};
use std::sync::Arc;

use cinecache_common::paths::has_extension;
use cinecache_common::CacheId;
use dashmap::DashMap;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::library::{Library, LibraryEvent};
use crate::watch::{FileEvent, FileEventKind};

pub(crate) enum QueueItem {
    Path { path: PathBuf, generation: u64 },
    Flush(oneshot::Sender<()>),
}

/// Per-path counters bumped on every eviction.
#[derive(Debug, Clone, Default)]
pub(crate) struct Generations(Arc<DashMap<PathBuf, u64>>);

impl Generations {
    pub(crate) fn current(&self, path: &Path) -> u64 {
        self.0.get(path).map(|g| *g).unwrap_or(0)
    }

    /// Bump `path` and every tracked path beneath it.
    pub(crate) fn bump(&self, path: &Path) {
        for mut entry in self.0.iter_mut() {
            if entry.key().starts_with(path) && entry.key() != path {
                *entry += 1;
            }
        }
        *self.0.entry(path.to_path_buf()).or_insert(0) += 1;
    }
}

/// Cheaply cloneable entry point into the ingestion queue.
#[derive(Clone)]
pub struct IngestHandle {
    sender: mpsc::UnboundedSender<QueueItem>,
    library: Arc<Library>,
    generations: Generations,
    extensions: Arc<[String]>,
    events: broadcast::Sender<LibraryEvent>,
}

impl IngestHandle {
    pub(crate) fn new(
        sender: mpsc::UnboundedSender<QueueItem>,
        library: Arc<Library>,
        generations: Generations,
        extensions: Vec<String>,
        events: broadcast::Sender<LibraryEvent>,
    ) -> Self {
        Self {
            sender,
            library,
            generations,
            extensions: extensions.into(),
            events,
        }
    }

    pub fn is_supported(&self, path: &Path) -> bool {
        has_extension(path, &self.extensions[..])
    }

    /// Apply a file event: `add` enqueues, `change` evicts then enqueues,
    /// `unlink` evicts.
    pub fn handle_event(&self, event: FileEvent) {
        match event.kind {
            FileEventKind::Add => {
                self.enqueue(event.path);
            }
            FileEventKind::Change => {
                if self.is_supported(&event.path) {
                    self.evict(&event.path);
                    self.enqueue(event.path);
                }
            }
            FileEventKind::Unlink => {
                self.evict(&event.path);
            }
        }
    }

    /// Queue a path for processing. Returns `false` for unsupported files.
    pub fn enqueue(&self, path: PathBuf) -> bool {
        if !self.is_supported(&path) {
            debug!(path = %path.display(), "Ignoring unsupported file");
            return false;
        }

        let generation = self.generations.current(&path);
        debug!(path = %path.display(), generation, "Queued");
        if self.sender.send(QueueItem::Path { path, generation }).is_err() {
            warn!("Ingestion queue is closed");
            return false;
        }
        true
    }

    /// Remove cache entries for `path` and invalidate in-flight work on it.
    pub fn evict(&self, path: &Path) -> Vec<CacheId> {
        self.generations.bump(path);
        let removed = self.library.evict_path(path);

        for id in &removed {
            info!(id = %id, path = %path.display(), "Evicted title");
            let _ = self.events.send(LibraryEvent::TitleRemoved { id: id.clone() });
        }
        removed
    }

    /// Wait until every path queued before this call has been processed.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.sender.send(QueueItem::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }
}
