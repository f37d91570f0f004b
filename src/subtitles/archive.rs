//! Subtitle archive search and download (SubDL).

use std::io::{Cursor, Read, Seek};
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use cinecache_common::paths::is_caption_file;
use cinecache_common::EpisodeRef;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::http::ApiClient;

/// What to search the archive for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveQuery {
    pub catalog_id: String,
    pub episode: Option<EpisodeRef>,
    /// Comma-separated language codes.
    pub languages: String,
}

/// A downloadable subtitle archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveItem {
    pub name: String,
    /// Download path as returned by the search API.
    pub url: String,
}

#[async_trait]
pub trait SubtitleArchive: Send + Sync {
    fn name(&self) -> &'static str;

    /// Collect all result pages for `query`.
    async fn search(&self, query: &ArchiveQuery) -> anyhow::Result<Vec<ArchiveItem>>;

    /// Download `item` and extract its caption files into `dir`, returning
    /// how many were written.
    async fn download_into(&self, item: &ArchiveItem, dir: &Path) -> anyhow::Result<usize>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    status: bool,
    #[serde(default)]
    subtitles: Vec<SearchSubtitle>,
    #[serde(default, rename = "totalPages")]
    total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct SearchSubtitle {
    #[serde(default)]
    release_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    url: String,
}

pub struct SubdlArchive {
    api: ApiClient,
    api_key: String,
    api_url: String,
    download_url: String,
    per_page: u32,
    download_timeout: Duration,
}

impl SubdlArchive {
    pub fn new(
        api_key: impl Into<String>,
        api_url: impl Into<String>,
        download_url: impl Into<String>,
        per_page: u32,
        download_timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            api: ApiClient::new("subdl", Duration::from_secs(30), 2)?,
            api_key: api_key.into(),
            api_url: api_url.into(),
            download_url: download_url.into().trim_end_matches('/').to_string(),
            per_page,
            download_timeout,
        })
    }

    fn search_url(&self, query: &ArchiveQuery, page: u32) -> anyhow::Result<reqwest::Url> {
        let mut params = vec![
            ("api_key", self.api_key.clone()),
            ("imdb_id", query.catalog_id.clone()),
            ("languages", query.languages.clone()),
            ("subs_per_page", self.per_page.to_string()),
            ("page", page.to_string()),
        ];
        if let Some(ep) = query.episode {
            params.push(("type", "tv".to_string()));
            params.push(("season_number", ep.season.to_string()));
            params.push(("episode_number", ep.episode.to_string()));
        }

        reqwest::Url::parse_with_params(&self.api_url, &params)
            .with_context(|| format!("Invalid archive API URL: {}", self.api_url))
    }
}

#[async_trait]
impl SubtitleArchive for SubdlArchive {
    fn name(&self) -> &'static str {
        "subdl"
    }

    async fn search(&self, query: &ArchiveQuery) -> anyhow::Result<Vec<ArchiveItem>> {
        let mut items = Vec::new();
        let mut page = 1u32;
        let mut total_pages = 1u32;

        while page <= total_pages {
            let url = self.search_url(query, page)?;
            let resp: SearchResponse = self
                .api
                .get(url.as_str())
                .await?
                .json()
                .await
                .context("Failed to parse SubDL search response")?;

            if !resp.status || resp.subtitles.is_empty() {
                break;
            }

            total_pages = resp.total_pages;
            items.extend(resp.subtitles.into_iter().map(|s| ArchiveItem {
                name: s.release_name.or(s.name).unwrap_or_default(),
                url: s.url,
            }));
            page += 1;
        }

        debug!(catalog_id = %query.catalog_id, found = items.len(), "Archive search finished");
        Ok(items)
    }

    async fn download_into(&self, item: &ArchiveItem, dir: &Path) -> anyhow::Result<usize> {
        let url = format!("{}{}", self.download_url, item.url);
        let bytes = self
            .api
            .get_with_timeout(&url, Some(self.download_timeout))
            .await?
            .bytes()
            .await
            .with_context(|| format!("Failed to read archive body: {url}"))?;

        let dir = dir.to_path_buf();
        tokio::task::spawn_blocking(move || extract_captions(Cursor::new(bytes), &dir))
            .await
            .context("Extraction task panicked")?
    }
}

/// Extract caption entries from a zip archive into `dir`.
///
/// Entry paths are flattened to their file name; entries that try to escape
/// (`..`, absolute paths) and non-caption files are skipped.
pub fn extract_captions<R: Read + Seek>(reader: R, dir: &Path) -> anyhow::Result<usize> {
    let mut zip = zip::ZipArchive::new(reader).context("Not a zip archive")?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create subtitle dir: {:?}", dir))?;

    let mut written = 0;
    for i in 0..zip.len() {
        let mut file = zip.by_index(i).context("Failed to read zip entry")?;
        if file.is_dir() {
            continue;
        }

        let name = file.name().replace('\\', "/");
        if name.starts_with('/') || name.split('/').any(|p| p == "..") {
            warn!(entry = %name, "Skipping unsafe archive entry");
            continue;
        }
        let Some(file_name) = name.rsplit('/').next().filter(|n| !n.is_empty()) else {
            continue;
        };
        let out_path = dir.join(file_name);
        if !is_caption_file(&out_path) {
            continue;
        }

        let mut out = std::fs::File::create(&out_path)
            .with_context(|| format!("Failed to create {:?}", out_path))?;
        std::io::copy(&mut file, &mut out)
            .with_context(|| format!("Failed to extract {:?}", out_path))?;
        written += 1;
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default();
            for (name, content) in entries {
                writer.start_file(*name, options).unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        buf.into_inner()
    }

    fn archive(server: &MockServer) -> SubdlArchive {
        SubdlArchive::new(
            "key",
            format!("{}/api/v1/subtitles", server.uri()),
            server.uri(),
            30,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn extract_flattens_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = zip_bytes(&[
            ("Show/Show.S01E01.en.srt", "1\n00:00:01,000 --> 00:00:02,000\nHi\n"),
            ("readme.txt", "ignore me"),
            ("../escape.srt", "nope"),
            ("extra.vtt", "WEBVTT\n"),
        ]);

        let written = extract_captions(Cursor::new(bytes), dir.path()).unwrap();
        assert_eq!(written, 2);
        assert!(dir.path().join("Show.S01E01.en.srt").exists());
        assert!(dir.path().join("extra.vtt").exists());
        assert!(!dir.path().join("readme.txt").exists());
        assert!(!dir.path().parent().unwrap().join("escape.srt").exists());
    }

    #[test]
    fn extract_rejects_non_zip() {
        let dir = tempfile::tempdir().unwrap();
        assert!(extract_captions(Cursor::new(b"not a zip".to_vec()), dir.path()).is_err());
    }

    #[tokio::test]
    async fn search_paginates_until_total_pages() {
        let server = MockServer::start().await;
        for page in ["1", "2"] {
            Mock::given(method("GET"))
                .and(path("/api/v1/subtitles"))
                .and(query_param("imdb_id", "tt123"))
                .and(query_param("page", page))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "status": true,
                    "totalPages": 2,
                    "subtitles": [{"release_name": format!("rel{page}"), "url": format!("/subtitle/{page}.zip")}]
                })))
                .expect(1)
                .mount(&server)
                .await;
        }

        let items = archive(&server)
            .search(&ArchiveQuery {
                catalog_id: "tt123".into(),
                episode: None,
                languages: "en".into(),
            })
            .await
            .unwrap();

        let urls: Vec<_> = items.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, vec!["/subtitle/1.zip", "/subtitle/2.zip"]);
        assert_eq!(items[0].name, "rel1");
    }

    #[tokio::test]
    async fn search_stops_on_false_status_and_passes_episode() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/subtitles"))
            .and(query_param("season_number", "1"))
            .and(query_param("episode_number", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": false,
                "error": "not found"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let items = archive(&server)
            .search(&ArchiveQuery {
                catalog_id: "tt123".into(),
                episode: Some(EpisodeRef::new(1, 2)),
                languages: "en".into(),
            })
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn download_extracts_into_dir() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subtitle/1.zip"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(zip_bytes(&[("movie.en.srt", "1\n00:00:00,000 --> 00:00:01,000\nx\n")])),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let item = ArchiveItem {
            name: "movie".into(),
            url: "/subtitle/1.zip".into(),
        };
        let written = archive(&server).download_into(&item, dir.path()).await.unwrap();
        assert_eq!(written, 1);
        assert!(dir.path().join("movie.en.srt").exists());
    }
}
