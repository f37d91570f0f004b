//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates a temporary media/subtitle tree,
//! default config, an in-memory [`Library`] and a full [`AppContext`]. The
//! [`TestHarness::with_server`] constructor starts Axum on a random port for
//! HTTP-level testing, and [`TestHarness::pipeline`] wires the ingestion
//! worker to stub collaborators.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tempfile::TempDir;
use tokio::sync::broadcast;

use cinecache::config::Config;
use cinecache::ingest::{self, IngestHandle, IngestSettings};
use cinecache::library::{Library, LibraryEvent, LibraryView, MovieEntry};
use cinecache::metadata::{Identifier, Metadata, MetadataCatalog, NameResolver};
use cinecache::server::{create_router, AppContext};
use cinecache::subtitles::{ArchiveItem, ArchiveQuery, SubtitleArchive, SubtitleSource};
use cinecache_common::{CacheId, MediaType};
use cinecache_subtitles::Segmenter;

/// Resolves titles from a fixed table.
#[derive(Default)]
pub struct StubResolver {
    ids: HashMap<String, String>,
}

impl StubResolver {
    pub fn with(mut self, title: &str, id: &str) -> Self {
        self.ids.insert(title.to_string(), id.to_string());
        self
    }
}

#[async_trait]
impl NameResolver for StubResolver {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn resolve(&self, title: &str, _kind: MediaType) -> anyhow::Result<Option<String>> {
        Ok(self.ids.get(title).cloned())
    }
}

/// Returns a minimal record for every id.
pub struct StubCatalog;

#[async_trait]
impl MetadataCatalog for StubCatalog {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn fetch_meta(&self, id: &str, kind: MediaType) -> anyhow::Result<Option<Metadata>> {
        Ok(Some(Metadata {
            name: format!("Meta {id}"),
            media_type: kind,
            description: "A test title".to_string(),
            poster: String::new(),
            background: String::new(),
            logo: String::new(),
            extra: serde_json::Map::new(),
        }))
    }
}

/// Archive that "downloads" one English caption file per search and counts
/// how often it was searched.
#[derive(Default)]
pub struct StubArchive {
    searches: AtomicUsize,
}

impl StubArchive {
    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubtitleArchive for StubArchive {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn search(&self, query: &ArchiveQuery) -> anyhow::Result<Vec<ArchiveItem>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        Ok(vec![ArchiveItem {
            name: query.catalog_id.clone(),
            url: format!("/subtitle/{}.zip", query.catalog_id),
        }])
    }

    async fn download_into(&self, item: &ArchiveItem, dir: &Path) -> anyhow::Result<usize> {
        let file = dir.join(format!("{}.en.srt", item.name.replace(':', "_")));
        tokio::fs::write(&file, "1\n00:00:01,000 --> 00:00:02,000\nHello.\n").await?;
        Ok(1)
    }
}

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory library and a temporary directory tree.
pub struct TestHarness {
    pub ctx: AppContext,
    pub library: Arc<Library>,
    pub events: broadcast::Sender<LibraryEvent>,
    pub root: TempDir,
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration. The media and
    /// subtitle directories are always redirected into a temporary root.
    pub fn with_config(mut config: Config) -> Self {
        let root = tempfile::tempdir().expect("failed to create temp dir");
        config.library.media_dir = root.path().join("movies");
        config.library.subtitles_dir = root.path().join("subs");
        std::fs::create_dir_all(&config.library.media_dir).expect("create media dir");
        std::fs::create_dir_all(&config.library.subtitles_dir).expect("create subs dir");

        let library = Arc::new(Library::new());
        let (events, _) = broadcast::channel(64);
        let view: Arc<dyn LibraryView> = library.clone();
        let ctx = AppContext::new(view, config, events.clone());

        Self {
            ctx,
            library,
            events,
            root,
        }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Config::default()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = create_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    pub fn media_dir(&self) -> &Path {
        &self.ctx.config.library.media_dir
    }

    pub fn subtitles_dir(&self) -> &Path {
        &self.ctx.config.library.subtitles_dir
    }

    /// Write a file below the media directory, creating parents.
    pub fn write_media(&self, relative: &str, contents: &[u8]) -> PathBuf {
        write_file(&self.media_dir().join(relative), contents)
    }

    /// Write a file below the subtitle directory, creating parents.
    pub fn write_subtitle(&self, relative: &str, contents: &str) -> PathBuf {
        write_file(&self.subtitles_dir().join(relative), contents.as_bytes())
    }

    /// Insert a movie entry directly into the library.
    pub fn add_movie(&self, id: &str, path: &Path) {
        self.library.insert_movie(MovieEntry {
            id: CacheId::from(id),
            title: id.to_string(),
            catalog_id: Some(id.to_string()),
            media_type: MediaType::Movie,
            path: path.to_path_buf(),
            season: None,
            episode: None,
            meta: Metadata::placeholder(id),
            added_at: Utc::now(),
        });
    }

    /// Start the ingestion worker against this harness's library using stub
    /// identification and the given archive. Transcription is disabled.
    pub fn pipeline(&self, resolver: StubResolver, archive: Arc<StubArchive>) -> IngestHandle {
        let identifier = Identifier::new(Arc::new(resolver), Arc::new(StubCatalog));
        let archive: Arc<dyn SubtitleArchive> = archive;
        let source = SubtitleSource::new(Some(archive), None, Segmenter::default(), "en");
        let (handle, _worker) = ingest::spawn_pipeline(
            self.library.clone(),
            identifier,
            source,
            IngestSettings::from_config(&self.ctx.config),
            self.events.clone(),
        );
        handle
    }
}

fn write_file(path: &Path, contents: &[u8]) -> PathBuf {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
    std::fs::write(path, contents).expect("write file");
    path.to_path_buf()
}
