use std::fmt::Display;

use regex::Captures;

use crate::my_regex::get_range_re;

/// The clip name prefix used when none is given
pub const DEFAULT_PREFIX: &str = "clip";

/// One trim instruction, parsed from a `M:SS-M:SS` line.
///
/// `start_seconds < end_seconds` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipRequest {
    pub start_seconds: u64,
    pub end_seconds: u64,
    pub start_label: String,
    pub end_label: String,
    pub name_stem: String,
}

impl ClipRequest {
    pub fn duration(&self) -> u64 {
        self.end_seconds - self.start_seconds
    }
}

impl Display for ClipRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start_label, self.end_label)
    }
}

/// Parse every clip range of the text, one per line.
///
/// Lines that are not a range, or whose start is not strictly before the end,
/// are skipped. The order of the lines is kept.
pub fn parse_clip_requests(text: &str, prefix: &str) -> Vec<ClipRequest> {
    let name_stem = normalize_prefix(prefix);

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let cap = get_range_re().captures(line)?;
            let (start_seconds, end_seconds) = range_from_captures(&cap)?;

            Some(ClipRequest {
                start_seconds,
                end_seconds,
                start_label: format!("{}:{}", &cap["start_min"], &cap["start_sec"]),
                end_label: format!("{}:{}", &cap["end_min"], &cap["end_sec"]),
                name_stem: name_stem.clone(),
            })
        })
        .collect()
}

/// Parse a single `M:SS-M:SS` line into a `(start, end)` pair of seconds.
pub fn parse_range_line(line: &str) -> Option<(u64, u64)> {
    let cap = get_range_re().captures(line.trim())?;
    range_from_captures(&cap)
}

/// Convert seconds into a `M:SS` label
pub fn seconds_to_label(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// An empty prefix becomes [`DEFAULT_PREFIX`].
/// Path separators are replaced so that the name stays inside the output directory.
pub fn normalize_prefix(prefix: &str) -> String {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        DEFAULT_PREFIX.to_owned()
    } else {
        prefix.replace(['/', '\\'], "_")
    }
}

fn range_from_captures(cap: &Captures<'_>) -> Option<(u64, u64)> {
    let start = to_seconds(&cap["start_min"], &cap["start_sec"])?;
    let end = to_seconds(&cap["end_min"], &cap["end_sec"])?;

    (start < end).then_some((start, end))
}

fn to_seconds(minutes: &str, seconds: &str) -> Option<u64> {
    let minutes: u64 = minutes.parse().ok()?;
    let seconds: u64 = seconds.parse().ok()?;
    minutes.checked_mul(60)?.checked_add(seconds)
}
