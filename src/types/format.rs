//! Human readable renderings of durations, view counts and file sizes.

const UNKNOWN: &str = "Unknown";

/// Render a duration as `M:SS`, or "Unknown" when missing or zero
pub fn format_duration(seconds: Option<f64>) -> String {
    match seconds {
        Some(seconds) if seconds > 0.0 => {
            let seconds = seconds.floor() as u64;
            format!("{}:{:02}", seconds / 60, seconds % 60)
        }
        _ => UNKNOWN.to_owned(),
    }
}

/// Render a view count, abbreviated from the thousands on
pub fn format_view_count(count: Option<u64>) -> String {
    match count {
        None | Some(0) => UNKNOWN.to_owned(),
        Some(count) if count >= 1_000_000 => format!("{:.1}M", count as f64 / 1_000_000.0),
        Some(count) if count >= 1_000 => format!("{:.1}K", count as f64 / 1_000.0),
        Some(count) => count.to_string(),
    }
}

pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let size = bytes as f64;
    if size >= MB {
        format!("{:.1} MB", size / MB)
    } else if size >= KB {
        format!("{:.1} KB", size / KB)
    } else {
        format!("{bytes} B")
    }
}
