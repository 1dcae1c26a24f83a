use std::{
    ffi::{OsStr, OsString},
    fmt::Debug,
    path::Path,
};

use super::{
    command::{assert_success_command, FFMPEG, FFXXX_DEFAULT_ARGS},
    MediaSource,
};
use crate::{
    config::{EncodeSettings, Settings, Timeouts},
    result::Result,
    types::Bitrate,
};

/// One trim of a media source
#[derive(Debug, Clone, Copy)]
pub struct TrimJob<'a> {
    pub input: &'a MediaSource,
    /// Seconds skipped from the start of the input
    pub seek: u64,
    /// Length of the clip in seconds
    pub duration: u64,
    pub output: &'a Path,
}

/// How a re-encode is done
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    pub crf: u8,
    pub preset: String,
    pub audio_bitrate: Bitrate,
    /// Output size of the vertical crop, if cropping
    pub crop: Option<(u32, u32)>,
}

impl EncodeOptions {
    pub fn new(settings: &EncodeSettings, crop_to_vertical: bool) -> Self {
        Self {
            crf: settings.crf,
            preset: settings.preset.clone(),
            audio_bitrate: settings.audio_bitrate,
            crop: crop_to_vertical.then_some((settings.vertical_width, settings.vertical_height)),
        }
    }

    /// Scale to cover the target size then crop the overflow, keeping the center
    pub fn crop_filter(&self) -> Option<String> {
        self.crop.map(|(w, h)| {
            format!("scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h}")
        })
    }
}

pub trait StreamTransformer: Sync + Debug {
    /// Copy the streams between `seek` and `seek + duration` without re-encoding them.
    ///
    /// Cuts land on keyframes, so the clip may start a little early.
    fn stream_copy(&self, job: &TrimJob<'_>) -> Result<()>;

    /// Decode and encode again the streams between `seek` and `seek + duration`,
    /// cutting exactly and applying the crop if requested.
    fn reencode(&self, job: &TrimJob<'_>, options: &EncodeOptions) -> Result<()>;
}

/// Interface for the [ffmpeg](https://ffmpeg.org) program
#[derive(Debug)]
pub struct Ffmpeg {
    timeouts: Timeouts,
}

impl Ffmpeg {
    /// Verify that the `ffmpeg` binary is reachable
    pub fn new(settings: &Settings) -> Result<Self> {
        assert_success_command(
            FFMPEG,
            |cmd| cmd.arg("-version"),
            Some(settings.timeouts.resolve()),
        )?;

        Ok(Self {
            timeouts: settings.timeouts.clone(),
        })
    }
}

impl StreamTransformer for Ffmpeg {
    fn stream_copy(&self, job: &TrimJob<'_>) -> Result<()> {
        assert_success_command(
            FFMPEG,
            |cmd| cmd.args(copy_args(job)),
            Some(self.timeouts.copy()),
        )
    }

    fn reencode(&self, job: &TrimJob<'_>, options: &EncodeOptions) -> Result<()> {
        assert_success_command(
            FFMPEG,
            |cmd| cmd.args(reencode_args(job, options)),
            Some(self.timeouts.encode()),
        )
    }
}

fn copy_args(job: &TrimJob<'_>) -> Vec<OsString> {
    let mut args = input_args(job);
    args.extend(["-c", "copy"].map(OsString::from));
    args.extend(output_args(job));
    args
}

fn reencode_args(job: &TrimJob<'_>, options: &EncodeOptions) -> Vec<OsString> {
    let mut args = input_args(job);

    if let Some(filter) = options.crop_filter() {
        args.push(OsString::from("-vf"));
        args.push(OsString::from(filter));
    }

    let crf = options.crf.to_string();
    let audio_bitrate = options.audio_bitrate.to_string();
    args.extend(
        [
            "-c:v",
            "libx264",
            "-preset",
            options.preset.as_str(),
            "-crf",
            crf.as_str(),
            "-pix_fmt",
            "yuv420p",
            "-c:a",
            "aac",
            "-b:a",
            audio_bitrate.as_str(),
        ]
        .map(OsString::from),
    );
    args.extend(output_args(job));
    args
}

/// Seek every input before opening it, then limit the duration
fn input_args(job: &TrimJob<'_>) -> Vec<OsString> {
    let mut args: Vec<OsString> = FFXXX_DEFAULT_ARGS.map(OsString::from).to_vec();
    args.push("-y".into());

    let seek = job.seek.to_string();
    for input in job.input.inputs() {
        args.extend(
            [OsStr::new("-ss"), OsStr::new(&seek), OsStr::new("-i"), input.as_os_str()]
                .map(OsString::from),
        );
    }

    args.push(OsString::from("-t"));
    args.push(OsString::from(job.duration.to_string()));

    // Separate video and audio streams, take each from its own input
    if job.input.inputs().len() > 1 {
        args.extend(["-map", "0:v:0", "-map", "1:a:0"].map(OsString::from));
    }

    args
}

fn output_args(job: &TrimJob<'_>) -> Vec<OsString> {
    vec![
        OsString::from("-avoid_negative_ts"),
        OsString::from("make_zero"),
        job.output.as_os_str().to_os_string(),
    ]
}
