use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, Environment, File};
use miette::{Context, IntoDiagnostic, Result};
use serde::Deserialize;

use crate::types::Bitrate;

/// Settings file read from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "ytclip.toml";

/// Prefix of the environment variables overriding the settings file,
/// e.g. `YTCLIP__TIMEOUTS__ENCODE=600`
const ENV_PREFIX: &str = "YTCLIP";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub search: SearchSettings,
    pub clip: ClipSettings,
    pub encode: EncodeSettings,
    pub timeouts: Timeouts,

    /// Netscape cookies file handed to `yt-dlp`
    pub cookies: Option<PathBuf>,

    /// Where to create the session scratch directory.
    /// Defaults to the system temporary directory.
    pub scratch_parent: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub max_results: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { max_results: 15 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClipSettings {
    /// Seconds fetched around the clip before the precise trim of the hybrid strategy
    pub padding: u64,
    /// Seconds shown around the clip in a preview
    pub preview_padding: u64,
    /// Maximum length of the tool diagnostics shown in a report
    pub max_message_len: usize,
}

impl Default for ClipSettings {
    fn default() -> Self {
        Self {
            padding: 10,
            preview_padding: 5,
            max_message_len: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EncodeSettings {
    pub crf: u8,
    pub preset: String,
    pub audio_bitrate: Bitrate,
    pub vertical_width: u32,
    pub vertical_height: u32,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            crf: 23,
            preset: "veryfast".to_owned(),
            audio_bitrate: Bitrate::default(),
            vertical_width: 1080,
            vertical_height: 1920,
        }
    }
}

/// Wall-clock limits of the external tools, in seconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub search: u64,
    pub resolve: u64,
    pub fetch: u64,
    pub copy: u64,
    pub encode: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            search: 60,
            resolve: 60,
            fetch: 300,
            copy: 120,
            encode: 300,
        }
    }
}

impl Timeouts {
    pub fn search(&self) -> Duration {
        Duration::from_secs(self.search)
    }

    pub fn resolve(&self) -> Duration {
        Duration::from_secs(self.resolve)
    }

    pub fn fetch(&self) -> Duration {
        Duration::from_secs(self.fetch)
    }

    pub fn copy(&self) -> Duration {
        Duration::from_secs(self.copy)
    }

    pub fn encode(&self) -> Duration {
        Duration::from_secs(self.encode)
    }
}

impl Settings {
    /// Load the settings.
    ///
    /// The given file must exist. Without one, [`DEFAULT_CONFIG_FILE`] is read if present.
    /// Environment variables take precedence over the file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Self::from_builder(Config::builder().add_source(file))
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .into_diagnostic()
            .wrap_err("Could not read the settings")?
            .try_deserialize()
            .into_diagnostic()
            .wrap_err("Invalid settings")
    }
}
