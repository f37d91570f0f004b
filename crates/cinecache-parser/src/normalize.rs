//! Regex-driven release-name cleanup.
//!
//! The rules run in a fixed order. Broad technical-token removal must happen
//! before the trailing release-group strip, otherwise a leftover token such
//! as `x264` would be taken for the group signature.

use std::sync::LazyLock;

use regex::Regex;

/// A single cleanup step: every match of `pattern` is replaced by `replacement`.
struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

impl Rule {
    fn strip(pattern: &str) -> Self {
        Self::replace(pattern, "")
    }

    fn replace(pattern: &str, replacement: &'static str) -> Self {
        Self {
            pattern: Regex::new(pattern).unwrap(),
            replacement,
        }
    }
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        // Underscores act as separators; `\b` would treat them as word characters
        Rule::replace(r"_", " "),
        // Bracketed and parenthesized annotations
        Rule::strip(r"\[.*?\]"),
        Rule::strip(r"\(.*?\)"),
        // Episode marker and everything after it (the marker is parsed separately)
        Rule::strip(r"(?i)\bS\d{2}E\d{2}.*$"),
        // Date stamps, standalone years are kept
        Rule::strip(r"\b\d{4}\.\d{2}\.\d{2}\b"),
        Rule::strip(r"\b\d{2}\.\d{2}\.\d{4}\b"),
        // Specific technical tokens first
        Rule::strip(r"(?i)\bH\.?264\b"),
        Rule::strip(r"(?i)\b(?:DD|AAC|DTS)?5\.1\b"),
        Rule::strip(r"(?i)\bAAC\d*\b"),
        Rule::strip(r"(?i)\bMVGroup\b"),
        // Resolution and source
        Rule::strip(
            r"(?i)\b(?:\d{3,4}[pi]|HDTV|HD|UHD|BRRip|BluRay|WEBRip|WEB-DL|DVDRip|DVDR|DVD|WEB|Blu-Ray)\b",
        ),
        // Codecs, optionally followed by a dotted qualifier
        Rule::strip(
            r"(?i)\b(?:x264|x265|HEVC|XviD|DivX|MP4|AC3|DTS|DDP?5\.1|10bit)\b(?:\.[A-Za-z0-9]+)?",
        ),
        // Remaster and edition tags
        Rule::strip(r"(?i)\b(?:REMASTERED|EXTENDED|UNRATED|PROPER|REPACK|IMAX)\b"),
        // File size annotations
        Rule::strip(r"(?i)\b\d+(?:\.\d+)?(?:MB|GB)\b"),
        // Quality indicators
        Rule::strip(r"(?i)\b(?:HQ|HDR|SDR)\b"),
        // Container extensions left in the name
        Rule::strip(r"(?i)\.(?:mkv|avi|mp4|mov|wmv|flv|webm|m4v|mpg|mpeg)\b"),
        // Trailing release-group signature
        Rule::strip(r"-[A-Za-z0-9]+$"),
        // Separators
        Rule::replace(r"\.", " "),
        Rule::replace(r"\s*-\s*", " "),
        Rule::replace(r"\s*,\s*", " "),
        Rule::replace(r"\s+", " "),
    ]
});

/// Clean a raw file name into a human title.
///
/// Pure and total: input that no rule matches comes back with only its
/// whitespace normalized.
///
/// ```
/// use cinecache_parser::normalize;
///
/// assert_eq!(normalize("Heat.1995.[Director's.Cut].720p.BRRip.XviD.AC3-VLiS"), "Heat 1995");
/// assert_eq!(normalize("  Plain   Title "), "Plain Title");
/// ```
pub fn normalize(raw: &str) -> String {
    let mut name = raw.to_string();
    for rule in RULES.iter() {
        name = rule.pattern.replace_all(&name, rule.replacement).into_owned();
    }
    name.trim().to_string()
}
