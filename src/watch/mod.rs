pub mod settle;

pub use settle::FileSettleTracker;

use crate::config::LibraryConfig;
use crate::ingest::IngestHandle;
use anyhow::{Context, Result};
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

/// Kind of change observed for a library path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    Add,
    Change,
    Unlink,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub kind: FileEventKind,
    pub path: PathBuf,
}

impl FileEvent {
    pub fn new(kind: FileEventKind, path: PathBuf) -> Self {
        Self { kind, path }
    }

    pub fn add(path: impl Into<PathBuf>) -> Self {
        Self::new(FileEventKind::Add, path.into())
    }

    pub fn change(path: impl Into<PathBuf>) -> Self {
        Self::new(FileEventKind::Change, path.into())
    }

    pub fn unlink(path: impl Into<PathBuf>) -> Self {
        Self::new(FileEventKind::Unlink, path.into())
    }
}

/// Map a raw notify event to library events.
pub fn classify(event: &Event) -> Vec<FileEvent> {
    let paths = event.paths.iter().cloned();
    match event.kind {
        EventKind::Create(_) => paths.map(FileEvent::add).collect(),
        EventKind::Remove(_) => paths.map(FileEvent::unlink).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => paths.map(FileEvent::unlink).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => paths.map(FileEvent::add).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.as_slice() {
            [from, to] => vec![FileEvent::unlink(from.clone()), FileEvent::add(to.clone())],
            _ => Vec::new(),
        },
        // FSEvents reports renames without a direction
        EventKind::Modify(ModifyKind::Name(_)) => paths
            .map(|path| {
                if path.exists() {
                    FileEvent::add(path)
                } else {
                    FileEvent::unlink(path)
                }
            })
            .collect(),
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(_) => paths.map(FileEvent::change).collect(),
        _ => Vec::new(),
    }
}

/// File watcher that forwards media library changes to the ingestion queue
pub struct FileWatcher {
    config: LibraryConfig,
    ingest: IngestHandle,
    watcher: Option<RecommendedWatcher>,
}

impl FileWatcher {
    pub fn new(config: LibraryConfig, ingest: IngestHandle) -> Self {
        Self {
            config,
            ingest,
            watcher: None,
        }
    }

    /// Start watching the media directory
    pub async fn start(&mut self) -> Result<()> {
        if !self.config.watch {
            tracing::info!("File watcher is disabled");
            return Ok(());
        }

        let root = &self.config.media_dir;
        if !root.exists() {
            tracing::warn!("Media directory does not exist, not watching: {:?}", root);
            return Ok(());
        }

        let (event_tx, mut event_rx) = mpsc::channel::<FileEvent>(100);

        let mut settle_tracker = FileSettleTracker::new(self.config.settle_time_secs);

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    for file_event in classify(&event) {
                        let _ = event_tx.blocking_send(file_event);
                    }
                }
                Err(e) => tracing::warn!("File watch error: {}", e),
            },
            Config::default(),
        )
        .context("Failed to create file watcher")?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch path: {:?}", root))?;
        tracing::info!("Watching directory: {:?}", root);

        self.watcher = Some(watcher);

        let ingest = self.ingest.clone();
        tokio::spawn(async move {
            let mut check_interval = tokio::time::interval(Duration::from_millis(500));

            loop {
                tokio::select! {
                    Some(event) = event_rx.recv() => {
                        tracing::trace!(kind = ?event.kind, path = %event.path.display(), "File event");
                        match event.kind {
                            // Removals skip the settle delay
                            FileEventKind::Unlink => {
                                settle_tracker.remove(&event.path);
                                ingest.handle_event(event);
                            }
                            kind => settle_tracker.file_changed(event.path, kind),
                        }
                    }

                    _ = check_interval.tick() => {
                        for event in settle_tracker.check_settled() {
                            if event.path.is_file() {
                                ingest.handle_event(event);
                            }
                        }
                    }
                }
            }
        });

        Ok(())
    }

    /// Stop watching
    pub fn stop(&mut self) {
        self.watcher = None;
        tracing::info!("File watcher stopped");
    }
}
