//! In-memory movie and subtitle caches.
//!
//! [`Library`] owns both caches. The ingestion worker is the only writer; the
//! serving layer reads through the [`LibraryView`] trait.

mod events;

pub use events::LibraryEvent;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use cinecache_common::{CacheId, MediaType};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::metadata::Metadata;

/// One identified (or unidentified) title in the movie cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieEntry {
    pub id: CacheId,
    /// Normalized title the file was identified by.
    pub title: String,
    pub catalog_id: Option<String>,
    pub media_type: MediaType,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<u16>,
    pub meta: Metadata,
    pub added_at: DateTime<Utc>,
}

/// A caption file listed for a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleRecord {
    /// File name of the caption file.
    pub id: String,
    pub lang: String,
    pub url: String,
}

/// Progress of caption acquisition for a title.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionStatus {
    #[default]
    NotStarted,
    /// The archive step ran (or was skipped for lack of a catalog id).
    ArchiveTried,
    /// A transcript exists but has not been segmented yet.
    Transcribed,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleEntry {
    pub status: AcquisitionStatus,
    pub records: Vec<SubtitleRecord>,
}

/// Read-only access to the caches.
pub trait LibraryView: Send + Sync {
    /// All movie entries, oldest first.
    fn movies(&self) -> Vec<MovieEntry>;

    fn movie(&self, id: &str) -> Option<MovieEntry>;

    fn subtitles(&self, id: &str) -> Option<SubtitleEntry>;
}

#[derive(Debug, Default)]
pub struct Library {
    movies: DashMap<CacheId, MovieEntry>,
    subtitles: DashMap<CacheId, SubtitleEntry>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.movies.contains_key(id)
    }

    pub fn has_subtitles(&self, id: &str) -> bool {
        self.subtitles.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Insert or wholesale replace the entry for `entry.id`.
    pub fn insert_movie(&self, entry: MovieEntry) -> Option<MovieEntry> {
        self.movies.insert(entry.id.clone(), entry)
    }

    pub fn insert_subtitles(&self, id: CacheId, entry: SubtitleEntry) {
        self.subtitles.insert(id, entry);
    }

    /// Remove the entry for `id` if it still belongs to `path`, with its
    /// subtitle entry. Returns whether anything was removed.
    pub fn remove_movie_for_path(&self, id: &CacheId, path: &Path) -> bool {
        let removed = self.movies.remove_if(id, |_, entry| entry.path == path).is_some();
        if removed {
            self.subtitles.remove(id);
        }
        removed
    }

    /// Remove every entry whose library path is `path` or lies under it (a
    /// removed directory), returning their ids.
    ///
    /// Matching is on the stored path, so an entry whose id collides with
    /// another file's derived id is only removed by its own path.
    pub fn evict_path(&self, path: &Path) -> Vec<CacheId> {
        let ids: Vec<CacheId> = self
            .movies
            .iter()
            .filter(|entry| entry.path.starts_with(path))
            .map(|entry| entry.key().clone())
            .collect();

        for id in &ids {
            self.movies.remove(id);
            self.subtitles.remove(id);
        }

        ids
    }
}

impl LibraryView for Library {
    fn movies(&self) -> Vec<MovieEntry> {
        let mut entries: Vec<MovieEntry> = self.movies.iter().map(|e| e.value().clone()).collect();
        entries.sort_by(|a, b| a.added_at.cmp(&b.added_at).then_with(|| a.id.cmp(&b.id)));
        entries
    }

    fn movie(&self, id: &str) -> Option<MovieEntry> {
        self.movies.get(id).map(|e| e.value().clone())
    }

    fn subtitles(&self, id: &str) -> Option<SubtitleEntry> {
        self.subtitles.get(id).map(|e| e.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, path: &str) -> MovieEntry {
        MovieEntry {
            id: CacheId::from(id),
            title: id.to_string(),
            catalog_id: None,
            media_type: MediaType::Movie,
            path: PathBuf::from(path),
            season: None,
            episode: None,
            meta: Metadata::placeholder(id),
            added_at: Utc::now(),
        }
    }

    #[test]
    fn insert_replaces_wholesale() {
        let library = Library::new();
        assert!(library.insert_movie(entry("tt1", "/m/a.mkv")).is_none());
        let old = library.insert_movie(entry("tt1", "/m/b.mkv")).unwrap();
        assert_eq!(old.path, PathBuf::from("/m/a.mkv"));
        assert_eq!(library.len(), 1);
        assert_eq!(library.movie("tt1").unwrap().path, PathBuf::from("/m/b.mkv"));
    }

    #[test]
    fn evict_path_removes_only_matching_entry() {
        let library = Library::new();
        library.insert_movie(entry("tt1", "/m/a.mkv"));
        library.insert_movie(entry("tt2", "/m/b.mkv"));
        library.insert_subtitles(
            CacheId::from("tt1"),
            SubtitleEntry {
                status: AcquisitionStatus::Done,
                records: vec![],
            },
        );

        let removed = library.evict_path(Path::new("/m/a.mkv"));
        assert_eq!(removed, vec![CacheId::from("tt1")]);
        assert!(!library.contains("tt1"));
        assert!(!library.has_subtitles("tt1"));
        assert!(library.contains("tt2"));
    }

    #[test]
    fn evict_directory_removes_contents() {
        let library = Library::new();
        library.insert_movie(entry("tt1", "/m/show/e1.mkv"));
        library.insert_movie(entry("tt2", "/m/show/e2.mkv"));
        library.insert_movie(entry("tt3", "/m/showtime.mkv"));

        let mut removed = library.evict_path(Path::new("/m/show"));
        removed.sort();
        assert_eq!(removed, vec![CacheId::from("tt1"), CacheId::from("tt2")]);
        assert!(library.contains("tt3"));
    }

    #[test]
    fn remove_for_path_ignores_entry_from_other_file() {
        let library = Library::new();
        library.insert_movie(entry("tt1", "/m/a.mkv"));

        assert!(!library.remove_movie_for_path(&CacheId::from("tt1"), Path::new("/m/b.mkv")));
        assert!(library.contains("tt1"));

        assert!(library.remove_movie_for_path(&CacheId::from("tt1"), Path::new("/m/a.mkv")));
        assert!(library.is_empty());
    }

    #[test]
    fn evict_unknown_path_is_noop() {
        let library = Library::new();
        library.insert_movie(entry("tt1", "/m/a.mkv"));
        assert!(library.evict_path(Path::new("/m/zzz.mkv")).is_empty());
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn entry_serializes_episode_fields_only_when_present() {
        let mut e = entry("tt1:1:2", "/m/s.mkv");
        let json = serde_json::to_value(&e).unwrap();
        assert!(json.get("season").is_none());

        e.season = Some(1);
        e.episode = Some(2);
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["season"], 1);
        assert_eq!(json["id"], "tt1:1:2");
    }

    #[test]
    fn acquisition_status_is_snake_case() {
        assert_eq!(
            serde_json::to_string(&AcquisitionStatus::ArchiveTried).unwrap(),
            "\"archive_tried\""
        );
    }
}
