//! Caption units before and after segmentation.

use serde::{Deserialize, Serialize};

/// A raw timestamped caption unit, as produced by a transcriber or parsed
/// from a caption file. Timestamps are in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionLine {
    pub start: u64,
    pub end: u64,
    pub text: String,
}

impl CaptionLine {
    pub fn new(start: u64, end: u64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    pub fn duration(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }
}

/// A display-ready unit produced by merging one or more caption lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// 1-based position in the output sequence.
    pub id: usize,
    pub start: u64,
    pub end: u64,
    pub text: String,
}

impl Segment {
    pub fn duration(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

impl From<&Segment> for CaptionLine {
    fn from(segment: &Segment) -> Self {
        CaptionLine::new(segment.start, segment.end, segment.text.clone())
    }
}
