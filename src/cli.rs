use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::Level;

use crate::{
    clipper::Strategy,
    types::{Extension, Quality, DEFAULT_PREFIX},
};

macro_rules! arg_env {
    ($v:literal) => {
        concat!("YTCLIP_", $v)
    };
}

/// Wrapper-tool around `yt-dlp` and `ffmpeg` to find videos and cut clips out of them.
/// Search, pick a video, give the time ranges, get the clip files.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// The settings file. Defaults to `ytclip.toml` in the working directory, if present.
    ///
    /// Any setting can be overridden by an environment variable,
    /// e.g. `YTCLIP__CLIP__PADDING=15`
    #[arg(long, global = true, env = arg_env!("CONFIG"))]
    pub config: Option<PathBuf>,

    /// The maximum level of the log messages, written on stderr
    #[arg(long, global = true, default_value_t = Level::INFO, env = arg_env!("LOG_LEVEL"))]
    pub log_level: Level,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search videos and list the results
    Search {
        /// The search terms
        query: String,

        /// The number of results to list. Defaults to the `search.max_results` setting
        #[arg(long, env = arg_env!("MAX_RESULTS"))]
        max_results: Option<usize>,
    },

    /// Cut clips out of one video
    Clip {
        /// The video: its ID or its URL
        video: String,

        /// A clip time range, `M:SS-M:SS`.
        /// The option can be set multiple times, resulting in multiple clips.
        #[arg(short, long = "timestamps", value_name = "RANGE")]
        timestamps: Vec<String>,

        /// A file of time ranges, one per line. Lines that are not a range are skipped.
        #[arg(long)]
        from_file: Option<PathBuf>,

        #[command(flatten)]
        output: ClipOptions,
    },

    /// Search, pick and clip interactively, until the end of the input
    Session {
        #[command(flatten)]
        output: ClipOptions,
    },
}

/// How the clips are produced and where they go
#[derive(ClapArgs, Debug, Clone)]
pub struct ClipOptions {
    /// The clip files are named `{prefix}_{n}`
    #[arg(long, default_value = DEFAULT_PREFIX, env = arg_env!("PREFIX"))]
    pub prefix: String,

    /// The maximum video height to fetch
    #[arg(long, value_enum, default_value_t = Quality::default(), env = arg_env!("QUALITY"))]
    pub quality: Quality,

    /// Crop the clips to a vertical 9:16 frame.
    /// A stream copy cannot crop: a precise re-encode is used instead.
    #[arg(long, env = arg_env!("CROP"))]
    pub crop: bool,

    /// How the clips are cut out of the video
    #[arg(long, value_enum, default_value_t = Strategy::default(), env = arg_env!("STRATEGY"))]
    pub strategy: Strategy,

    /// The file extension to use for the clips. Defines the file container format to use
    #[arg(long, value_enum, default_value_t = Extension::default(), env = arg_env!("EXT"))]
    pub ext: Extension,

    /// The path to the output directory
    #[arg(long, default_value = ".", env = arg_env!("OUT"))]
    pub out: PathBuf,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn clip_with_defaults() {
        let args = Args::parse_from(["ytclip", "clip", "abc123", "-t", "1:00-1:10", "-t", "2:00-2:30"]);

        let Command::Clip {
            video,
            timestamps,
            from_file,
            output,
        } = args.command
        else {
            panic!("expected the clip command");
        };
        assert_eq!(video, "abc123");
        assert_eq!(timestamps, vec!["1:00-1:10", "2:00-2:30"]);
        assert!(from_file.is_none());
        assert_eq!(output.prefix, DEFAULT_PREFIX);
        assert_eq!(output.quality, Quality::P720);
        assert_eq!(output.strategy, Strategy::PaddedHybrid);
        assert_eq!(output.ext, Extension::Mp4);
        assert!(!output.crop);
        assert_eq!(args.log_level, Level::INFO);
    }

    #[test]
    fn session_options() {
        let args = Args::parse_from([
            "ytclip",
            "session",
            "--strategy",
            "copy",
            "--quality",
            "1080",
            "--crop",
            "--log-level",
            "debug",
        ]);

        let Command::Session { output } = args.command else {
            panic!("expected the session command");
        };
        assert_eq!(output.strategy, Strategy::StreamCopyDirect);
        assert_eq!(output.quality, Quality::P1080);
        assert!(output.crop);
        assert_eq!(args.log_level, Level::DEBUG);
    }
}
