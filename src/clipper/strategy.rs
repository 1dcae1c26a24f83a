use std::fmt::Display;

use clap::ValueEnum;

/// The ways of turning a time range of a video into a clip file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Strategy {
    /// Copy the streams of the direct media URL. Fastest, cuts on keyframes, no crop
    #[value(name = "copy")]
    StreamCopyDirect,

    /// Re-encode from the direct media URL. Exact, slowest
    #[value(name = "precise")]
    PreciseReencode,

    /// Fetch a padded window without re-encoding, then re-encode only the clip. Exact
    #[default]
    #[value(name = "hybrid")]
    PaddedHybrid,

    /// Fetch a padded preview to review and adjust, then re-encode the adjusted range. Exact
    #[value(name = "preview")]
    PreviewThenTrim,
}

impl Strategy {
    /// Whether the strategy can apply a video filter
    pub fn supports_crop(self) -> bool {
        !matches!(self, Strategy::StreamCopyDirect)
    }

    /// The strategy actually used for the request.
    /// A stream copy cannot crop, so cropping falls back to a precise re-encode.
    pub fn effective(self, crop_to_vertical: bool) -> Self {
        if crop_to_vertical && !self.supports_crop() {
            Strategy::PreciseReencode
        } else {
            self
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Strategy::StreamCopyDirect => "stream copy",
            Strategy::PreciseReencode => "precise re-encode",
            Strategy::PaddedHybrid => "padded hybrid",
            Strategy::PreviewThenTrim => "preview then trim",
        };
        write!(f, "{name}")
    }
}
