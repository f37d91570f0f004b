//! Caption handling for cinecache.
//!
//! - [`caption`]: raw [`CaptionLine`]s and display [`Segment`]s
//! - [`srt`]: SubRip parsing and formatting
//! - [`segment`]: the segmentation engine that merges raw transcription lines
//!   into readable, bounded display segments
//!
//! ```
//! use cinecache_subtitles::{segment, srt};
//!
//! let raw = "1\n00:00:00,000 --> 00:00:00,400\nhello\n\n2\n00:00:00,500 --> 00:00:01,200\nthere.\n";
//! let lines = srt::parse(raw).unwrap();
//! let segments = segment::segment(&lines);
//! assert_eq!(segments.len(), 1);
//! assert_eq!(segments[0].text, "hello there.");
//! ```

pub mod caption;
pub mod segment;
pub mod srt;

pub use caption::{CaptionLine, Segment};
pub use segment::{SegmentationPolicy, Segmenter};
pub use srt::SrtError;

use std::path::Path;

/// Errors raised while rewriting a caption file.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("failed to access caption file: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Srt(#[from] SrtError),
}

/// Re-segment an SRT file in place, returning the number of segments written.
pub fn rewrite_srt_file(path: &Path, segmenter: &Segmenter) -> Result<usize, RewriteError> {
    let content = std::fs::read_to_string(path)?;
    let lines = srt::parse(&content)?;
    let segments = segmenter.segment(&lines);

    tracing::debug!(
        path = %path.display(),
        lines = lines.len(),
        segments = segments.len(),
        "Re-segmented caption file"
    );

    std::fs::write(path, srt::format_segments(&segments))?;
    Ok(segments.len())
}
