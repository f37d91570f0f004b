//! Display segmentation.
//!
//! Raw transcription output tends to arrive as many short, fragmentary lines.
//! The [`Segmenter`] drops filler-only lines, then folds the remainder left to
//! right into [`Segment`]s, starting a new segment whenever a gap, duration,
//! word or punctuation boundary is hit.

use crate::caption::{CaptionLine, Segment};

/// Thresholds controlling how lines are merged into segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentationPolicy {
    /// A silence longer than this (ms) starts a new segment.
    pub max_gap_ms: u64,
    /// A segment may not span more than this (ms) after absorbing a line.
    pub max_duration_ms: u64,
    /// A segment holding this many words accepts no further lines.
    pub max_words: usize,
    /// Shorter segments are extended to this duration (ms).
    pub min_duration_ms: u64,
    /// Duration (ms) given to lines whose end does not follow their start.
    pub fallback_duration_ms: u64,
    /// Lines made up solely of these words are dropped.
    pub noise_words: Vec<String>,
}

impl Default for SegmentationPolicy {
    fn default() -> Self {
        Self {
            max_gap_ms: 1_000,
            max_duration_ms: 7_000,
            max_words: 20,
            min_duration_ms: 1_000,
            fallback_duration_ms: 1_000,
            noise_words: ["uh", "um", "ah", "er", "hmm"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Merges caption lines into display segments according to a policy.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    policy: SegmentationPolicy,
}

/// Segment lines with the default policy.
pub fn segment(lines: &[CaptionLine]) -> Vec<Segment> {
    Segmenter::default().segment(lines)
}

struct Group {
    start: u64,
    end: u64,
    text: String,
}

impl Segmenter {
    pub fn new(policy: SegmentationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SegmentationPolicy {
        &self.policy
    }

    /// Produce display segments from raw lines.
    ///
    /// Output segments are non-overlapping in input order, numbered from 1,
    /// and each lasts at least `min_duration_ms`.
    pub fn segment(&self, lines: &[CaptionLine]) -> Vec<Segment> {
        let mut groups: Vec<Group> = Vec::new();
        let mut current: Option<Group> = None;

        for line in lines.iter().filter(|line| !self.is_noise(&line.text)) {
            let start = line.start;
            let end = if line.end <= line.start {
                line.start.saturating_add(self.policy.fallback_duration_ms)
            } else {
                line.end
            };
            let text = line.text.trim();

            match current.as_mut() {
                Some(group) if !self.should_split(group, start, end) => {
                    group.end = end;
                    group.text.push(' ');
                    group.text.push_str(text);
                }
                _ => {
                    if let Some(done) = current.take() {
                        groups.push(done);
                    }
                    current = Some(Group {
                        start,
                        end,
                        text: text.to_string(),
                    });
                }
            }
        }

        if let Some(last) = current {
            if !last.text.trim().is_empty() {
                groups.push(last);
            }
        }

        groups
            .into_iter()
            .enumerate()
            .map(|(index, group)| Segment {
                id: index + 1,
                start: group.start,
                end: group.end.max(group.start.saturating_add(self.policy.min_duration_ms)),
                text: group.text.split_whitespace().collect::<Vec<_>>().join(" "),
            })
            .collect()
    }

    /// Checked in order: gap, duration, word count, terminal punctuation.
    fn should_split(&self, group: &Group, start: u64, end: u64) -> bool {
        if start.saturating_sub(group.end) > self.policy.max_gap_ms {
            return true;
        }
        if end.saturating_sub(group.start) > self.policy.max_duration_ms {
            return true;
        }
        if group.text.split_whitespace().count() >= self.policy.max_words {
            return true;
        }
        group.text.trim_end().ends_with(['.', '!', '?'])
    }

    fn is_noise(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        let mut words = lowered.split_whitespace().peekable();
        if words.peek().is_none() {
            return true;
        }
        words.all(|word| {
            let bare: String = word
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '_')
                .collect();
            self.policy.noise_words.iter().any(|noise| *noise == bare)
        })
    }
}

/// Convert segments back to plain caption lines.
pub fn to_lines(segments: &[Segment]) -> Vec<CaptionLine> {
    segments.iter().map(CaptionLine::from).collect()
}
