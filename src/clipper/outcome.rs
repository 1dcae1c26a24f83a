use std::{fmt::Display, path::PathBuf};

use crate::{
    result::Error,
    types::{truncate_chars, Quality},
};

use super::Strategy;

/// Everything needed to produce one clip file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    /// URL of the video page
    pub source: String,
    pub start_seconds: u64,
    pub end_seconds: u64,
    pub quality: Quality,
    pub crop_to_vertical: bool,
    pub strategy: Strategy,
    pub output: PathBuf,
}

/// A clip file that was produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedClip {
    pub path: PathBuf,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    SearchFailed,
    NoResults,
    InvalidRange,
    NoVideoSelected,
    NoValidTimestamps,
    FetchFailed,
    FilterFailed,
    Timeout,
    OutputMissing,
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureKind::SearchFailed => "search failed",
            FailureKind::NoResults => "no results",
            FailureKind::InvalidRange => "invalid range",
            FailureKind::NoVideoSelected => "no video selected",
            FailureKind::NoValidTimestamps => "no valid timestamps",
            FailureKind::FetchFailed => "fetch failed",
            FailureKind::FilterFailed => "filter failed",
            FailureKind::Timeout => "timeout",
            FailureKind::OutputMissing => "output missing",
        };
        write!(f, "{name}")
    }
}

/// Why a step failed, with a message short enough to be shown as-is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new<M: Into<String>>(kind: FailureKind, message: M) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Convert an external tool error.
    ///
    /// A timeout keeps its own kind whatever the step, other errors get `kind`.
    /// The message is cut to `max_len` characters.
    pub fn from_tool_error(kind: FailureKind, err: &Error, max_len: usize) -> Self {
        let kind = if err.is_timeout() {
            FailureKind::Timeout
        } else {
            kind
        };

        let message = match err {
            Error::UnavailableStream => "video unavailable".to_owned(),
            err => err.to_string(),
        };

        Self::new(kind, truncate_message(&message, max_len))
    }
}

impl Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.kind, self.message)
    }
}

pub type ExtractionResult = std::result::Result<ExtractedClip, Failure>;

/// Flatten the message on one line and cut it to `max_len` characters,
/// marking the cut with an ellipsis
pub fn truncate_message(message: &str, max_len: usize) -> String {
    let flat = message.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_len {
        flat
    } else {
        format!("{}…", truncate_chars(&flat, max_len.saturating_sub(1)))
    }
}
