use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::{Command, Output},
    time::Duration,
};

use miette::{Context, IntoDiagnostic};
use serde::Deserialize;

use super::{
    command::{assert_success_command, run_command, Capture, YT_DL, YT_DLP},
    MediaSource,
};
use crate::{
    clipper::PaddedWindow,
    config::{Settings, Timeouts},
    result::{bail, Error, Result},
    types::{Extension, Quality, VideoRecord},
};

/// Interface for searching videos
pub trait VideoSearcher: Sync {
    /// Search videos matching the query, in the provider relevance order.
    fn search(&self, query: &str, max_results: usize) -> Result<Vec<VideoRecord>>;
}

/// Interface for locating and fetching the streams of a video
pub trait StreamResolver: Sync {
    /// Resolve the directly fetchable URLs of the best streams
    /// that are not taller than the quality ceiling.
    fn resolve_media(&self, source: &str, quality: Quality) -> Result<MediaSource>;

    /// Download the padded window of the video into `output`, without re-encoding.
    fn fetch_section(
        &self,
        source: &str,
        quality: Quality,
        window: &PaddedWindow,
        output: &Path,
    ) -> Result<()>;
}

/// Interface for the [yt-dlp](https://github.com/yt-dlp/yt-dlp) program
/// and its [youtube-dl](https://github.com/ytdl-org/youtube-dl) ancestor
#[derive(Debug)]
pub struct Ytdl {
    program: &'static str,
    cookies: Option<PathBuf>,
    timeouts: Timeouts,
}

/// The part of a flat search output we care about
#[derive(Debug, Deserialize)]
struct SearchOutput {
    #[serde(default)]
    entries: Vec<Option<SearchEntry>>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    id: Option<String>,
    title: Option<String>,
    url: Option<String>,
    duration: Option<f64>,
    view_count: Option<u64>,
    uploader: Option<String>,
    channel: Option<String>,
    thumbnail: Option<String>,
    #[serde(default)]
    thumbnails: Vec<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl From<SearchEntry> for VideoRecord {
    fn from(entry: SearchEntry) -> Self {
        // Flat entries only list thumbnails, the last one being the largest
        let thumbnail = entry
            .thumbnail
            .or_else(|| entry.thumbnails.into_iter().last().map(|t| t.url));

        VideoRecord::new(
            entry.id,
            entry.title,
            entry.url,
            entry.duration,
            entry.view_count,
            entry.uploader.or(entry.channel),
            thumbnail,
        )
    }
}

impl Ytdl {
    /// Verify that the `yt-dlp` or `youtube-dl` binaries are reachable
    pub fn new(settings: &Settings) -> Result<Self> {
        let version_timeout = Some(settings.timeouts.resolve());

        let program = if assert_success_command(YT_DLP, |cmd| cmd.arg("--version"), version_timeout)
            .is_ok()
        {
            YT_DLP
        } else if assert_success_command(YT_DL, |cmd| cmd.arg("--version"), version_timeout)
            .is_ok()
        {
            YT_DL
        } else {
            return bail("Neither yt-dlp nor youtube-dl found");
        };

        Ok(Self {
            program,
            cookies: settings.cookies.clone(),
            timeouts: settings.timeouts.clone(),
        })
    }

    /// Run the command and check if it failed with saying the stream is unavailable.
    /// In that case, return [`Error::UnavailableStream`].
    ///
    /// If it otherwise failed, return [`Error::Unsuccessful`] with its stderr.
    pub fn run_check_availability<F>(
        &self,
        f: F,
        capture: Capture,
        timeout: Duration,
    ) -> Result<Output>
    where
        F: FnOnce(&mut Command) -> &mut Command,
    {
        let res = run_command(
            self.program,
            |cmd| f(self.common_args(cmd)),
            capture | Capture::STDERR,
            Some(timeout),
        )?;

        let stderr = String::from_utf8_lossy(&res.stderr);
        let is_unavailable = stderr
            .lines()
            .any(|line| line.starts_with("ERROR:") && line.to_lowercase().contains("unavailable"));
        if is_unavailable {
            Err(Error::UnavailableStream)
        } else if !res.status.success() {
            Err(Error::Unsuccessful {
                program: self.program.to_owned(),
                stderr: stderr.into_owned(),
            })
        } else {
            Ok(res)
        }
    }

    /// Arguments placed before the ones of every invocation
    fn common_args<'c>(&self, cmd: &'c mut Command) -> &'c mut Command {
        let cmd = cmd.arg("-q").arg("--no-warnings");
        match &self.cookies {
            Some(cookies) => cmd.args([OsStr::new("--cookies"), cookies.as_os_str()]),
            None => cmd,
        }
    }
}

impl VideoSearcher for Ytdl {
    fn search(&self, query: &str, max_results: usize) -> Result<Vec<VideoRecord>> {
        let res = self.run_check_availability(
            |cmd| {
                cmd.arg("--flat-playlist")
                    .arg("-J")
                    .arg("--")
                    .arg(format!("ytsearch{max_results}:{query}"))
            },
            Capture::STDOUT,
            self.timeouts.search(),
        )?;

        parse_search_output(&String::from_utf8_lossy(&res.stdout))
    }
}

impl StreamResolver for Ytdl {
    fn resolve_media(&self, source: &str, quality: Quality) -> Result<MediaSource> {
        let res = self.run_check_availability(
            |cmd| {
                cmd.arg("-g")
                    .args(["-f", quality.format_selector().as_str()])
                    .arg("--")
                    .arg(source)
            },
            Capture::STDOUT,
            self.timeouts.resolve(),
        )?;

        parse_media_urls(&String::from_utf8_lossy(&res.stdout))
    }

    fn fetch_section(
        &self,
        source: &str,
        quality: Quality,
        window: &PaddedWindow,
        output: &Path,
    ) -> Result<()> {
        let container = Extension::from_path(output).unwrap_or_default();

        self.run_check_availability(
            |cmd| {
                cmd.args(["-f", quality.format_selector().as_str()])
                    .args([
                        "--download-sections",
                        format!("*{}-{}", window.start, window.end).as_str(),
                    ])
                    .args(["--merge-output-format", container.with_no_dot()])
                    // The temporary file already exists, and would else be reused
                    .arg("--force-overwrites")
                    .arg("--no-continue")
                    .args([OsStr::new("-o"), output.as_os_str()])
                    .arg("--")
                    .arg(source)
            },
            Capture::empty(),
            self.timeouts.fetch(),
        )?;

        Ok(())
    }
}

fn parse_search_output(stdout: &str) -> Result<Vec<VideoRecord>> {
    let output: SearchOutput = serde_json::from_str(stdout)
        .into_diagnostic()
        .wrap_err("Could not parse search JSON")?;

    Ok(output
        .entries
        .into_iter()
        .flatten()
        .map(VideoRecord::from)
        .collect())
}

/// `yt-dlp -g` prints one URL per selected format:
/// a single one for a muxed format, the video then the audio one otherwise
fn parse_media_urls(stdout: &str) -> Result<MediaSource> {
    let mut urls = stdout.lines().map(str::trim).filter(|l| !l.is_empty());

    match (urls.next(), urls.next()) {
        (Some(video), audio) => Ok(MediaSource::remote(video, audio)),
        (None, _) => bail("No media URL returned"),
    }
}
