//! # cinecache-parser
//!
//! Turns raw media file names into clean, human titles suitable for catalog
//! lookups, and detects `SxxExx` episode markers.
//!
//! ## Quick Start
//!
//! ```
//! use cinecache_parser::{normalize, parse};
//!
//! assert_eq!(normalize("The.Matrix.1999.1080p.BluRay.x264-GROUP"), "The Matrix 1999");
//!
//! let parsed = parse("Show.S02E05.720p.HDTV.x264-GRP");
//! assert_eq!(parsed.title, "Show");
//! let episode = parsed.episode.unwrap();
//! assert_eq!((episode.season, episode.episode), (2, 5));
//! ```

mod episode;
mod normalize;

pub use episode::detect_episode;
pub use normalize::normalize;

use cinecache_common::EpisodeRef;

/// Result of parsing a raw file name.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParsedName {
    /// Clean title produced by [`normalize`].
    pub title: String,
    /// Episode marker found in the raw name, if any.
    pub episode: Option<EpisodeRef>,
}

impl ParsedName {
    /// Whether the name carries an episode marker.
    pub fn is_episode(&self) -> bool {
        self.episode.is_some()
    }
}

/// Parse a raw file name (usually a file stem) into a clean title and an
/// optional episode marker.
///
/// ```
/// use cinecache_parser::parse;
///
/// let parsed = parse("Inception.2010.REMASTERED.2160p.UHD.BluRay.x265-TERMiNAL");
/// assert_eq!(parsed.title, "Inception 2010");
/// assert!(parsed.episode.is_none());
/// ```
pub fn parse(raw: &str) -> ParsedName {
    ParsedName {
        title: normalize(raw),
        episode: detect_episode(raw),
    }
}
