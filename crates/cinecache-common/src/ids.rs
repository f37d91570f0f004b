//! The cache key shared by the movie and subtitle caches.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::path::Path;

use crate::EpisodeRef;

/// Stable key identifying a title in both caches.
///
/// The catalog id when one is known, otherwise derived from the file name.
/// Identified episodic content carries a `:season:episode` suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheId(String);

impl CacheId {
    /// Use an external catalog id as the key.
    pub fn from_catalog(catalog_id: impl Into<String>) -> Self {
        Self(catalog_id.into())
    }

    /// Derive a key from the file name of a library path (stem without extension).
    pub fn from_path(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self(stem)
    }

    /// Catalog id when known, filename-derived otherwise.
    pub fn derive(catalog_id: Option<&str>, path: &Path) -> Self {
        match catalog_id {
            Some(id) => Self::from_catalog(id),
            None => Self::from_path(path),
        }
    }

    /// Append the `:season:episode` suffix (numbers without padding).
    #[must_use]
    pub fn with_episode(&self, episode: EpisodeRef) -> Self {
        Self(format!("{}:{}:{}", self.0, episode.season, episode.episode))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A variant safe to use as part of a file name (`:` replaced by `_`).
    pub fn file_safe(&self) -> String {
        self.0
            .chars()
            .map(|c| match c {
                ':' | '/' | '\\' => '_',
                other => other,
            })
            .collect()
    }
}

impl fmt::Display for CacheId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CacheId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for CacheId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CacheId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_derive_prefers_catalog_id() {
        let path = PathBuf::from("/movies/The.Matrix.1999.1080p.mkv");
        assert_eq!(CacheId::derive(Some("tt0133093"), &path).as_str(), "tt0133093");
        assert_eq!(
            CacheId::derive(None, &path).as_str(),
            "The.Matrix.1999.1080p"
        );
    }

    #[test]
    fn test_episode_suffix_is_unpadded() {
        let id = CacheId::from_catalog("tt123").with_episode(EpisodeRef::new(2, 5));
        assert_eq!(id.as_str(), "tt123:2:5");
    }

    #[test]
    fn test_file_safe() {
        let id = CacheId::from("tt123:1:1");
        assert_eq!(id.file_safe(), "tt123_1_1");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = CacheId::from("tt1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"tt1\"");
    }
}
