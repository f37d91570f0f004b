use std::path::Path;

use tracing::{info, warn};
use walkdir::WalkDir;

use super::IngestHandle;

/// Walk `root` and enqueue every supported media file, as if each had
/// produced an `add` event. Returns the number of files queued.
pub fn initial_scan(handle: &IngestHandle, root: &Path) -> usize {
    if !root.exists() {
        warn!("Media directory does not exist: {:?}", root);
        return 0;
    }

    let queued = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Failed to read library entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| handle.enqueue(entry.path().to_path_buf()))
        .count();

    info!(root = %root.display(), queued, "Initial library scan complete");
    queued
}
