use std::sync::LazyLock;

use cinecache_common::EpisodeRef;
use regex::Regex;

static EPISODE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bS(\d{2})E(\d{2})").unwrap());

/// Detect an `SxxExx` marker (two-digit season and episode, case-insensitive).
///
/// ```
/// use cinecache_parser::detect_episode;
///
/// let ep = detect_episode("Title.S02E05.x264").unwrap();
/// assert_eq!((ep.season, ep.episode), (2, 5));
/// assert!(detect_episode("Title.2019.1080p").is_none());
/// ```
pub fn detect_episode(name: &str) -> Option<EpisodeRef> {
    let caps = EPISODE_MARKER.captures(name)?;
    let season = caps.get(1)?.as_str().parse().ok()?;
    let episode = caps.get(2)?.as_str().parse().ok()?;
    Some(EpisodeRef::new(season, episode))
}
