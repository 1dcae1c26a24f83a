use std::fmt::Display;

use clap::ValueEnum;

/// The maximum vertical resolution requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Quality {
    #[value(name = "480")]
    P480,
    #[default]
    #[value(name = "720")]
    P720,
    #[value(name = "1080")]
    P1080,
}

impl Quality {
    pub fn height(self) -> u32 {
        match self {
            Quality::P480 => 480,
            Quality::P720 => 720,
            Quality::P1080 => 1080,
        }
    }

    /// The `yt-dlp` format selector of the best streams not taller than the ceiling
    pub fn format_selector(self) -> String {
        let h = self.height();
        format!("bestvideo[height<={h}]+bestaudio/best[height<={h}]")
    }
}

impl Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}p", self.height())
    }
}
