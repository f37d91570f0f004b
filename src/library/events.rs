use cinecache_common::CacheId;
use serde::{Deserialize, Serialize};

/// Change notifications broadcast to `/api/events` subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum LibraryEvent {
    /// A title was committed to the movie cache.
    TitleAdded { id: CacheId, title: String },
    /// A title was evicted after its file changed or disappeared.
    TitleRemoved { id: CacheId },
    /// The subtitle list for a title was committed.
    SubtitlesReady { id: CacheId, count: usize },
}

impl LibraryEvent {
    /// Name used as the SSE `event:` field.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TitleAdded { .. } => "title_added",
            Self::TitleRemoved { .. } => "title_removed",
            Self::SubtitlesReady { .. } => "subtitles_ready",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_event_type_tag() {
        let event = LibraryEvent::SubtitlesReady {
            id: CacheId::from("tt1"),
            count: 2,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "subtitles_ready");
        assert_eq!(json["id"], "tt1");
        assert_eq!(json["count"], 2);
        assert_eq!(event.name(), "subtitles_ready");
    }
}
