//! SubRip (`.srt`) parsing and formatting.
//!
//! Parsing is lenient about layout (CRLF line endings, a UTF-8 BOM, missing
//! cue numbers, `.` instead of `,` before the milliseconds) but strict about
//! the timestamps themselves.

use crate::caption::{CaptionLine, Segment};

const ARROW: &str = "-->";

/// Errors raised while parsing SRT content.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SrtError {
    #[error("invalid timestamp {value:?} in cue {cue}")]
    InvalidTimestamp { cue: usize, value: String },
}

/// Parse SRT text into caption lines, preserving cue order.
///
/// Blocks without a timing line are skipped. Multi-line cue text is kept
/// with `\n` separators.
pub fn parse(content: &str) -> Result<Vec<CaptionLine>, SrtError> {
    let content = content.trim_start_matches('\u{feff}').replace("\r\n", "\n");
    let mut lines = Vec::new();

    for (index, block) in content.split("\n\n").enumerate() {
        let cue = index + 1;
        let mut rows = block.lines().skip_while(|row| row.trim().is_empty());

        let Some(first) = rows.next() else {
            continue;
        };
        let timing = if first.contains(ARROW) {
            first
        } else {
            match rows.next() {
                Some(row) if row.contains(ARROW) => row,
                _ => {
                    tracing::debug!(cue, "Skipping SRT block without timing line");
                    continue;
                }
            }
        };

        let (start, end) = parse_timing(timing, cue)?;
        let text = rows.collect::<Vec<_>>().join("\n");
        lines.push(CaptionLine::new(start, end, text.trim()));
    }

    Ok(lines)
}

fn parse_timing(row: &str, cue: usize) -> Result<(u64, u64), SrtError> {
    let (start, rest) = row.split_once(ARROW).unwrap_or((row, ""));
    // Cue settings may follow the end timestamp.
    let end = rest.split_whitespace().next().unwrap_or("");
    Ok((parse_timestamp(start.trim(), cue)?, parse_timestamp(end, cue)?))
}

fn parse_timestamp(value: &str, cue: usize) -> Result<u64, SrtError> {
    let invalid = || SrtError::InvalidTimestamp {
        cue,
        value: value.to_string(),
    };

    let (clock, millis) = value
        .rsplit_once([',', '.'])
        .ok_or_else(invalid)?;
    let millis: u64 = millis.parse().map_err(|_| invalid())?;
    if millis >= 1_000 {
        return Err(invalid());
    }

    let fields = clock
        .split(':')
        .map(|f| f.parse::<u64>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>, _>>()?;
    let (hours, minutes, seconds) = match fields.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [m, s] => (0, *m, *s),
        _ => return Err(invalid()),
    };
    if minutes >= 60 || seconds >= 60 {
        return Err(invalid());
    }

    hours
        .checked_mul(3_600_000)
        .and_then(|ms| ms.checked_add(minutes * 60_000 + seconds * 1_000 + millis))
        .ok_or_else(invalid)
}

/// Format milliseconds as an SRT timestamp (`HH:MM:SS,mmm`).
pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

fn format_cue(out: &mut String, id: usize, start: u64, end: u64, text: &str) {
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(&format!(
        "{id}\n{} {ARROW} {}\n{text}\n",
        format_timestamp(start),
        format_timestamp(end)
    ));
}

/// Format caption lines as SRT, numbering cues from 1.
pub fn format(lines: &[CaptionLine]) -> String {
    let mut out = String::new();
    for (index, line) in lines.iter().enumerate() {
        format_cue(&mut out, index + 1, line.start, line.end, &line.text);
    }
    out
}

/// Format segments as SRT using their own ids as cue numbers.
pub fn format_segments(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        format_cue(&mut out, segment.id, segment.start, segment.end, &segment.text);
    }
    out
}
