use cinecache_common::paths::media_extensions;
use cinecache_subtitles::SegmentationPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub transcription: TranscriptionConfig,

    #[serde(default)]
    pub subtitles: SubtitlesConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL prepended to subtitle file links (empty = relative links)
    #[serde(default)]
    pub public_url: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    1338
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Require an access code on every API request
    #[serde(default)]
    pub enabled: bool,

    /// Shared code accepted as `?code=` or `Authorization: Bearer`
    #[serde(default)]
    pub access_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,

    #[serde(default = "default_subtitles_dir")]
    pub subtitles_dir: PathBuf,

    /// Accepted media extensions, without the leading dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Watch `media_dir` for changes after the initial scan
    #[serde(default = "default_true")]
    pub watch: bool,

    #[serde(default = "default_settle_time")]
    pub settle_time_secs: u64,
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("./movies")
}
fn default_subtitles_dir() -> PathBuf {
    PathBuf::from("./subs")
}
fn default_extensions() -> Vec<String> {
    media_extensions().iter().map(|s| s.to_string()).collect()
}
fn default_true() -> bool {
    true
}
fn default_settle_time() -> u64 {
    2
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            media_dir: default_media_dir(),
            subtitles_dir: default_subtitles_dir(),
            extensions: default_extensions(),
            watch: true,
            settle_time_secs: default_settle_time(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// IMDb suggestion endpoint used to resolve titles to catalog ids
    #[serde(default = "default_suggest_url")]
    pub suggest_url: String,

    /// Cinemeta base URL for metadata lookups
    #[serde(default = "default_cinemeta_url")]
    pub cinemeta_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,
}

fn default_suggest_url() -> String {
    "https://v3.sg.media-imdb.com/suggestion".to_string()
}
fn default_cinemeta_url() -> String {
    "https://v3-cinemeta.strem.io".to_string()
}
fn default_timeout() -> u64 {
    10
}
fn default_rate_limit() -> u32 {
    4
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            suggest_url: default_suggest_url(),
            cinemeta_url: default_cinemeta_url(),
            timeout_secs: default_timeout(),
            requests_per_second: default_rate_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArchiveConfig {
    #[serde(default)]
    pub enabled: bool,

    /// SubDL API key
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_archive_api_url")]
    pub api_url: String,

    #[serde(default = "default_archive_download_url")]
    pub download_url: String,

    /// Comma-separated language codes
    #[serde(default = "default_language")]
    pub languages: String,

    #[serde(default = "default_per_page")]
    pub per_page: u32,

    #[serde(default = "default_timeout")]
    pub download_timeout_secs: u64,
}

fn default_archive_api_url() -> String {
    "https://api.subdl.com/api/v1/subtitles".to_string()
}
fn default_archive_download_url() -> String {
    "https://dl.subdl.com".to_string()
}
fn default_language() -> String {
    "en".to_string()
}
fn default_per_page() -> u32 {
    30
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            api_url: default_archive_api_url(),
            download_url: default_archive_download_url(),
            languages: default_language(),
            per_page: default_per_page(),
            download_timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscriptionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// whisper.cpp CLI binary (defaults to `whisper-cli` on PATH)
    #[serde(default)]
    pub whisper_path: Option<PathBuf>,

    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// ggml model file passed to whisper
    #[serde(default = "default_model")]
    pub model: PathBuf,

    /// Translate speech to English
    #[serde(default = "default_true")]
    pub translate: bool,

    #[serde(default)]
    pub threads: Option<u32>,
}

fn default_model() -> PathBuf {
    PathBuf::from("./models/ggml-base.bin")
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            whisper_path: None,
            ffmpeg_path: None,
            model: default_model(),
            translate: true,
            threads: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubtitlesConfig {
    /// Language tag reported for every caption file
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_max_gap")]
    pub max_gap_ms: u64,

    #[serde(default = "default_max_duration")]
    pub max_duration_ms: u64,

    #[serde(default = "default_max_words")]
    pub max_words: usize,

    #[serde(default = "default_min_duration")]
    pub min_duration_ms: u64,
}

fn default_max_gap() -> u64 {
    1_000
}
fn default_max_duration() -> u64 {
    7_000
}
fn default_max_words() -> usize {
    20
}
fn default_min_duration() -> u64 {
    1_000
}

impl Default for SubtitlesConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            max_gap_ms: default_max_gap(),
            max_duration_ms: default_max_duration(),
            max_words: default_max_words(),
            min_duration_ms: default_min_duration(),
        }
    }
}

impl SubtitlesConfig {
    pub fn policy(&self) -> SegmentationPolicy {
        SegmentationPolicy {
            max_gap_ms: self.max_gap_ms,
            max_duration_ms: self.max_duration_ms,
            max_words: self.max_words,
            min_duration_ms: self.min_duration_ms,
            ..SegmentationPolicy::default()
        }
    }
}
