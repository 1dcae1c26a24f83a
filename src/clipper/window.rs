use std::fmt::Display;

use crate::types::seconds_to_label;

/// A time range fetched around a clip, with the position of the clip inside it.
///
/// The fetched file starts at `start`, so the clip must be cut at
/// `clip_offset`, not at its absolute start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaddedWindow {
    /// Absolute start of the window in the source, never below zero
    pub start: u64,
    /// Absolute end of the window in the source
    pub end: u64,
    /// Start of the clip relative to the window start
    pub clip_offset: u64,
    pub clip_duration: u64,
}

impl PaddedWindow {
    /// The window `[max(0, start - pad), end + pad]` around the clip `[start, end)`.
    ///
    /// `start` must be before `end`.
    pub fn around(start: u64, end: u64, pad: u64) -> Self {
        debug_assert!(start < end);

        let window_start = start.saturating_sub(pad);
        Self {
            start: window_start,
            end: end.saturating_add(pad),
            clip_offset: start - window_start,
            clip_duration: end - start,
        }
    }

    pub fn duration(&self) -> u64 {
        self.end - self.start
    }

    /// The clip position inside the window
    pub fn clip_range(&self) -> RelativeRange {
        RelativeRange {
            start: self.clip_offset,
            end: self.clip_offset + self.clip_duration,
        }
    }
}

/// A range of seconds relative to the start of a fetched window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativeRange {
    pub start: u64,
    pub end: u64,
}

impl RelativeRange {
    pub fn duration(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Whether the range is non-empty and contained in a window of `len` seconds
    pub fn fits_in(&self, len: u64) -> bool {
        self.start < self.end && self.end <= len
    }
}

impl Display for RelativeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}",
            seconds_to_label(self.start),
            seconds_to_label(self.end)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_offset_is_relative_to_the_window() {
        let window = PaddedWindow::around(130, 145, 10);
        assert_eq!(window.start, 120);
        assert_eq!(window.end, 155);
        assert_eq!(window.clip_offset, 10);
        assert_eq!(window.clip_duration, 15);
        assert_eq!(window.duration(), 35);
    }

    #[test]
    fn window_is_clamped_at_zero() {
        let window = PaddedWindow::around(3, 8, 10);
        assert_eq!(window.start, 0);
        assert_eq!(window.clip_offset, 3);
        assert_eq!(window.clip_duration, 5);
    }

    #[test]
    fn clip_range_in_window() {
        let range = PaddedWindow::around(60, 70, 5).clip_range();
        assert_eq!(range, RelativeRange { start: 5, end: 15 });
        assert_eq!(range.to_string(), "0:05-0:15");
        assert!(range.fits_in(20));
        assert!(!RelativeRange { start: 5, end: 21 }.fits_in(20));
        assert!(!RelativeRange { start: 5, end: 5 }.fits_in(20));
    }
}
