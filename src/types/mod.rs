mod bitrate;
mod extension;
mod format;
mod quality;
mod timestamp;
mod video;

pub use bitrate::Bitrate;
pub use extension::Extension;
pub use format::{format_duration, format_size, format_view_count};
pub use quality::Quality;
pub use timestamp::{
    parse_clip_requests, parse_range_line, seconds_to_label, ClipRequest, DEFAULT_PREFIX,
};
pub use video::{truncate_chars, VideoRecord};
