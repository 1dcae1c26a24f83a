use std::fmt::Display;

use super::format::{format_duration, format_view_count};

const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";
const MAX_TITLE_CHARS: usize = 100;
const MAX_UPLOADER_CHARS: usize = 50;

/// A video found by a search
#[derive(Debug, Clone, PartialEq)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    /// The url given by the provider until the video is selected,
    /// the canonical watch url afterwards
    pub url: String,
    pub duration_seconds: Option<f64>,
    pub view_count: Option<u64>,
    pub uploader: String,
    pub thumbnail_url: Option<String>,
}

impl VideoRecord {
    pub fn new(
        id: Option<String>,
        title: Option<String>,
        url: Option<String>,
        duration_seconds: Option<f64>,
        view_count: Option<u64>,
        uploader: Option<String>,
        thumbnail_url: Option<String>,
    ) -> Self {
        Self {
            id: id.unwrap_or_default(),
            title: truncate_chars(title.as_deref().unwrap_or("No title"), MAX_TITLE_CHARS),
            url: url.unwrap_or_default(),
            duration_seconds,
            view_count,
            uploader: truncate_chars(uploader.as_deref().unwrap_or("Unknown"), MAX_UPLOADER_CHARS),
            thumbnail_url,
        }
    }

    /// Build a record out of a video ID or URL given by the user
    pub fn from_locator(locator: &str) -> Self {
        let locator = locator.trim();
        let (id, url) = if locator.contains("://") {
            (None, Some(locator.to_owned()))
        } else {
            (Some(locator.to_owned()), None)
        };

        let mut video = Self::new(id, Some(locator.to_owned()), url, None, None, None, None);
        video.resolve_watch_url();
        video
    }

    /// The canonical watch url when the ID is known, the provider url otherwise
    pub fn watch_url(&self) -> String {
        if self.id.is_empty() {
            self.url.clone()
        } else {
            format!("{WATCH_URL_PREFIX}{}", self.id)
        }
    }

    /// Replace the provider url with the canonical watch url
    pub fn resolve_watch_url(&mut self) {
        self.url = self.watch_url();
    }
}

impl Display for VideoRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}, {} views, by {})",
            self.title,
            format_duration(self.duration_seconds),
            format_view_count(self.view_count),
            self.uploader
        )
    }
}

/// Keep at most `max` characters of the text
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_owned(),
        None => text.to_owned(),
    }
}
