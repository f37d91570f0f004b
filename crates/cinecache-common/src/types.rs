//! Core type definitions shared by the identification pipeline and the
//! serving layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Content type used for catalog lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// A feature film or any title without an episode marker.
    #[default]
    Movie,
    /// An episode of a TV series.
    Series,
}

impl MediaType {
    /// Lowercase name as used in catalog URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Season and episode numbers parsed from an `SxxExx` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EpisodeRef {
    pub season: u16,
    pub episode: u16,
}

impl EpisodeRef {
    pub fn new(season: u16, episode: u16) -> Self {
        Self { season, episode }
    }
}

impl fmt::Display for EpisodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{:02}E{:02}", self.season, self.episode)
    }
}
