use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::{FileEvent, FileEventKind};

/// Tracks files and determines when they've "settled" (stopped changing)
pub struct FileSettleTracker {
    /// Pending event kind and last modification time per path
    pending: HashMap<PathBuf, (FileEventKind, Instant)>,
    /// How long a file must be unchanged to be considered settled
    settle_duration: Duration,
}

impl FileSettleTracker {
    pub fn new(settle_secs: u64) -> Self {
        Self {
            pending: HashMap::new(),
            settle_duration: Duration::from_secs(settle_secs),
        }
    }

    /// Record that a file was created or modified.
    ///
    /// A file still pending as `Add` stays an `Add` when it keeps changing.
    pub fn file_changed(&mut self, path: PathBuf, kind: FileEventKind) {
        let kind = match self.pending.get(&path) {
            Some((FileEventKind::Add, _)) => FileEventKind::Add,
            _ => kind,
        };
        self.pending.insert(path, (kind, Instant::now()));
    }

    /// Take every file that has been quiet for the settle duration.
    pub fn check_settled(&mut self) -> Vec<FileEvent> {
        let now = Instant::now();
        let settled: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, (_, last_change))| now.duration_since(*last_change) >= self.settle_duration)
            .map(|(path, _)| path.clone())
            .collect();

        settled
            .into_iter()
            .filter_map(|path| {
                let (kind, _) = self.pending.remove(&path)?;
                let event = FileEvent::new(kind, path);
                tracing::debug!(kind = ?event.kind, path = %event.path.display(), "File settled");
                Some(event)
            })
            .collect()
    }

    /// Remove a file from tracking (e.g., if deleted)
    pub fn remove(&mut self, path: &Path) {
        self.pending.remove(path);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settles_after_quiet_period() {
        let mut tracker = FileSettleTracker::new(0);

        tracker.file_changed(PathBuf::from("/m/a.mkv"), FileEventKind::Add);
        tracker.file_changed(PathBuf::from("/m/a.mkv"), FileEventKind::Change);
        assert_eq!(tracker.pending_len(), 1);

        let settled = tracker.check_settled();
        assert_eq!(
            settled,
            vec![FileEvent::new(FileEventKind::Add, PathBuf::from("/m/a.mkv"))]
        );
        assert_eq!(tracker.pending_len(), 0);
    }

    #[test]
    fn unsettled_files_are_held() {
        let mut tracker = FileSettleTracker::new(3600);

        tracker.file_changed(PathBuf::from("/m/a.mkv"), FileEventKind::Change);
        assert!(tracker.check_settled().is_empty());
        assert_eq!(tracker.pending_len(), 1);

        tracker.remove(Path::new("/m/a.mkv"));
        assert_eq!(tracker.pending_len(), 0);
    }

    #[test]
    fn large_batch_settles_in_one_pass() {
        let mut tracker = FileSettleTracker::new(0);
        for episode in 0..250 {
            tracker.file_changed(
                PathBuf::from(format!("/m/Show/S01E{episode:03}.mkv")),
                FileEventKind::Add,
            );
        }

        let settled = tracker.check_settled();
        assert_eq!(settled.len(), 250);
        assert!(settled.iter().all(|e| e.kind == FileEventKind::Add));
        assert_eq!(tracker.pending_len(), 0);
    }
}
