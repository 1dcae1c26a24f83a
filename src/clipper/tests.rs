use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use super::*;
use crate::{
    config::{ClipSettings, EncodeSettings},
    outside::{EncodeOptions, MediaSource, StreamResolver, StreamTransformer, TrimJob},
    result::{Error, Result},
    types::Quality,
};

/// Resolves every source to separate remote streams, failing on the n-th call if asked
#[derive(Debug, Default)]
pub struct FakeResolver {
    pub fail_on_call: Option<usize>,
    calls: AtomicUsize,
    pub sections: Mutex<Vec<(PaddedWindow, PathBuf)>>,
}

impl FakeResolver {
    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl StreamResolver for FakeResolver {
    fn resolve_media(&self, _source: &str, _quality: Quality) -> Result<MediaSource> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(call) {
            return Err(Error::Unsuccessful {
                program: "yt-dlp".to_owned(),
                stderr: "ERROR: Sign in to confirm you're not a bot".to_owned(),
            });
        }

        Ok(MediaSource::remote(
            "https://media.example/video",
            Some("https://media.example/audio"),
        ))
    }

    fn fetch_section(
        &self,
        _source: &str,
        _quality: Quality,
        window: &PaddedWindow,
        output: &Path,
    ) -> Result<()> {
        self.sections
            .lock()
            .unwrap()
            .push((*window, output.to_path_buf()));
        std::fs::write(output, b"padded")?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Copy {
        inputs: Vec<OsString>,
        seek: u64,
        duration: u64,
    },
    Reencode {
        inputs: Vec<OsString>,
        seek: u64,
        duration: u64,
        crop: Option<(u32, u32)>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Behavior {
    #[default]
    Write,
    SkipWrite,
    FailReencode,
    TimeoutReencode,
}

/// Records the trims and writes a small file in place of the clip
#[derive(Debug, Default)]
pub struct FakeTransformer {
    pub behavior: Behavior,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeTransformer {
    pub fn with(behavior: Behavior) -> Self {
        Self {
            behavior,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn write(&self, output: &Path) -> Result<()> {
        if self.behavior != Behavior::SkipWrite {
            std::fs::write(output, b"clip")?;
        }
        Ok(())
    }
}

impl StreamTransformer for FakeTransformer {
    fn stream_copy(&self, job: &TrimJob<'_>) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Copy {
            inputs: job.input.inputs().to_vec(),
            seek: job.seek,
            duration: job.duration,
        });
        self.write(job.output)
    }

    fn reencode(&self, job: &TrimJob<'_>, options: &EncodeOptions) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Reencode {
            inputs: job.input.inputs().to_vec(),
            seek: job.seek,
            duration: job.duration,
            crop: options.crop,
        });

        match self.behavior {
            Behavior::FailReencode => Err(Error::Unsuccessful {
                program: "ffmpeg".to_owned(),
                stderr: "Conversion failed!".to_owned(),
            }),
            Behavior::TimeoutReencode => Err(Error::Timeout {
                program: "ffmpeg".to_owned(),
                after: Duration::from_secs(300),
            }),
            _ => self.write(job.output),
        }
    }
}

pub fn clipper<'a>(
    resolver: &'a FakeResolver,
    transformer: &'a FakeTransformer,
    reviewer: &'a dyn PreviewReviewer,
    scratch: &Path,
) -> Clipper<'a> {
    Clipper::new(
        resolver,
        transformer,
        reviewer,
        ClipSettings::default(),
        EncodeSettings::default(),
        scratch,
    )
}

fn request(strategy: Strategy, crop: bool, output: PathBuf) -> ExtractionRequest {
    ExtractionRequest {
        source: "https://www.youtube.com/watch?v=abc123".to_owned(),
        start_seconds: 130,
        end_seconds: 145,
        quality: Quality::P720,
        crop_to_vertical: crop,
        strategy,
        output,
    }
}

/// Scratch and output directories, apart so that leftovers are easy to spot
fn dirs() -> (tempfile::TempDir, tempfile::TempDir) {
    (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap())
}

fn is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

#[test]
fn stream_copy_seeks_to_absolute_start() {
    let (scratch, out) = dirs();
    let (resolver, transformer) = (FakeResolver::default(), FakeTransformer::default());
    let clipper = clipper(&resolver, &transformer, &AcceptSuggested, scratch.path());

    let output = out.path().join("clip_1.mp4");
    let clip = clipper
        .extract(&request(Strategy::StreamCopyDirect, false, output.clone()))
        .unwrap();

    assert_eq!(clip.path, output);
    assert_eq!(clip.size_bytes, 4);
    assert_eq!(
        transformer.calls(),
        vec![Call::Copy {
            inputs: vec![
                OsString::from("https://media.example/video"),
                OsString::from("https://media.example/audio")
            ],
            seek: 130,
            duration: 15,
        }]
    );
}

#[test]
fn crop_forces_reencode_instead_of_copy() {
    let (scratch, out) = dirs();
    let (resolver, transformer) = (FakeResolver::default(), FakeTransformer::default());
    let clipper = clipper(&resolver, &transformer, &AcceptSuggested, scratch.path());

    clipper
        .extract(&request(
            Strategy::StreamCopyDirect,
            true,
            out.path().join("clip_1.mp4"),
        ))
        .unwrap();

    let calls = transformer.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(
        calls[0],
        Call::Reencode {
            seek: 130,
            duration: 15,
            crop: Some((1080, 1920)),
            ..
        }
    ));
}

#[test]
fn invalid_range_touches_nothing() {
    let (scratch, out) = dirs();
    let (resolver, transformer) = (FakeResolver::default(), FakeTransformer::default());
    let clipper = clipper(&resolver, &transformer, &AcceptSuggested, scratch.path());

    let mut req = request(Strategy::PreciseReencode, false, out.path().join("c.mp4"));
    req.end_seconds = req.start_seconds;

    let failure = clipper.extract(&req).unwrap_err();
    assert_eq!(failure.kind, FailureKind::InvalidRange);
    assert_eq!(resolver.calls(), 0);
    assert!(transformer.calls().is_empty());
}

#[test]
fn resolve_failure_is_a_fetch_failure() {
    let (scratch, out) = dirs();
    let resolver = FakeResolver::failing_on(1);
    let transformer = FakeTransformer::default();
    let clipper = clipper(&resolver, &transformer, &AcceptSuggested, scratch.path());

    let failure = clipper
        .extract(&request(
            Strategy::PreciseReencode,
            false,
            out.path().join("c.mp4"),
        ))
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::FetchFailed);
    assert!(failure.message.contains("not a bot"));
    assert!(transformer.calls().is_empty());
}

#[test]
fn hybrid_trims_relative_to_the_padded_window() {
    let (scratch, out) = dirs();
    let (resolver, transformer) = (FakeResolver::default(), FakeTransformer::default());
    let clipper = clipper(&resolver, &transformer, &AcceptSuggested, scratch.path());

    clipper
        .extract(&request(
            Strategy::PaddedHybrid,
            false,
            out.path().join("clip_1.mp4"),
        ))
        .unwrap();

    let sections = resolver.sections.lock().unwrap().clone();
    assert_eq!(sections.len(), 1);
    let (window, padded) = &sections[0];
    assert_eq!((window.start, window.end), (120, 155));

    assert_eq!(
        transformer.calls(),
        vec![Call::Reencode {
            inputs: vec![padded.as_os_str().to_os_string()],
            seek: 10,
            duration: 15,
            crop: None,
        }]
    );
    assert!(!padded.exists());
    assert!(is_empty(scratch.path()));
}

#[test]
fn hybrid_removes_padded_file_on_failure() {
    let (scratch, out) = dirs();
    let resolver = FakeResolver::default();
    let transformer = FakeTransformer::with(Behavior::FailReencode);
    let clipper = clipper(&resolver, &transformer, &AcceptSuggested, scratch.path());

    let failure = clipper
        .extract(&request(
            Strategy::PaddedHybrid,
            true,
            out.path().join("clip_1.mp4"),
        ))
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::FilterFailed);
    assert_eq!(failure.message, "ffmpeg did run but was not successful: Conversion failed!");
    assert!(is_empty(scratch.path()));
}

#[test]
fn tool_timeout_is_reported_as_timeout() {
    let (scratch, out) = dirs();
    let resolver = FakeResolver::default();
    let transformer = FakeTransformer::with(Behavior::TimeoutReencode);
    let clipper = clipper(&resolver, &transformer, &AcceptSuggested, scratch.path());

    let failure = clipper
        .extract(&request(
            Strategy::PreciseReencode,
            false,
            out.path().join("c.mp4"),
        ))
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::Timeout);
}

#[test]
fn silent_tool_without_output_is_output_missing() {
    let (scratch, out) = dirs();
    let resolver = FakeResolver::default();
    let transformer = FakeTransformer::with(Behavior::SkipWrite);
    let clipper = clipper(&resolver, &transformer, &AcceptSuggested, scratch.path());

    let failure = clipper
        .extract(&request(
            Strategy::StreamCopyDirect,
            false,
            out.path().join("c.mp4"),
        ))
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::OutputMissing);
}

#[test]
fn leftover_output_is_not_taken_for_the_clip() {
    let (scratch, out) = dirs();
    let resolver = FakeResolver::default();
    let transformer = FakeTransformer::with(Behavior::SkipWrite);
    let clipper = clipper(&resolver, &transformer, &AcceptSuggested, scratch.path());

    let output = out.path().join("x_1.mp4");
    std::fs::write(&output, b"partial clip of an earlier batch").unwrap();

    let failure = clipper
        .extract(&request(Strategy::StreamCopyDirect, false, output.clone()))
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::OutputMissing);
    assert!(!output.exists());
}

#[test]
fn invalid_range_keeps_existing_output() {
    let (scratch, out) = dirs();
    let (resolver, transformer) = (FakeResolver::default(), FakeTransformer::default());
    let clipper = clipper(&resolver, &transformer, &AcceptSuggested, scratch.path());

    let output = out.path().join("x_1.mp4");
    std::fs::write(&output, b"kept").unwrap();

    let mut req = request(Strategy::StreamCopyDirect, false, output.clone());
    req.start_seconds = req.end_seconds + 1;
    clipper.extract(&req).unwrap_err();
    assert_eq!(std::fs::read(&output).unwrap(), b"kept");
}

#[test]
fn preview_accepted_as_suggested() {
    let (scratch, out) = dirs();
    let (resolver, transformer) = (FakeResolver::default(), FakeTransformer::default());
    let clipper = clipper(&resolver, &transformer, &AcceptSuggested, scratch.path());

    clipper
        .extract(&request(
            Strategy::PreviewThenTrim,
            false,
            out.path().join("clip_1.mp4"),
        ))
        .unwrap();

    let calls = transformer.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(
        calls[0],
        Call::Copy {
            seek: 125,
            duration: 25,
            ..
        }
    ));
    assert!(matches!(
        calls[1],
        Call::Reencode {
            seek: 5,
            duration: 15,
            ..
        }
    ));
    assert!(is_empty(scratch.path()));
}

struct Adjust(Option<RelativeRange>);

impl PreviewReviewer for Adjust {
    fn review(&self, preview: &Preview) -> Option<RelativeRange> {
        assert_eq!(preview.suggested(), RelativeRange { start: 5, end: 20 });
        assert!(preview.path().exists());
        self.0
    }
}

#[test]
fn preview_adjusted_by_the_reviewer() {
    let (scratch, out) = dirs();
    let (resolver, transformer) = (FakeResolver::default(), FakeTransformer::default());
    let reviewer = Adjust(Some(RelativeRange { start: 2, end: 20 }));
    let clipper = clipper(&resolver, &transformer, &reviewer, scratch.path());

    clipper
        .extract(&request(
            Strategy::PreviewThenTrim,
            true,
            out.path().join("clip_1.mp4"),
        ))
        .unwrap();

    assert!(matches!(
        transformer.calls()[1],
        Call::Reencode {
            seek: 2,
            duration: 18,
            crop: Some(_),
            ..
        }
    ));
}

#[test]
fn declined_preview_fails_and_cleans_up() {
    let (scratch, out) = dirs();
    let (resolver, transformer) = (FakeResolver::default(), FakeTransformer::default());
    let reviewer = Adjust(None);
    let clipper = clipper(&resolver, &transformer, &reviewer, scratch.path());

    let failure = clipper
        .extract(&request(
            Strategy::PreviewThenTrim,
            false,
            out.path().join("clip_1.mp4"),
        ))
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::InvalidRange);
    assert_eq!(transformer.calls().len(), 1);
    assert!(is_empty(scratch.path()));
}

#[test]
fn finishing_outside_the_preview_is_rejected() {
    let (scratch, out) = dirs();
    let (resolver, transformer) = (FakeResolver::default(), FakeTransformer::default());
    let clipper = clipper(&resolver, &transformer, &AcceptSuggested, scratch.path());

    let preview = clipper
        .preview(&request(
            Strategy::PreviewThenTrim,
            false,
            out.path().join("clip_1.mp4"),
        ))
        .unwrap();
    assert_eq!(preview.window.duration(), 25);

    let failure = clipper
        .finish_preview(
            preview,
            RelativeRange { start: 10, end: 26 },
            false,
            &out.path().join("clip_1.mp4"),
        )
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::InvalidRange);
    assert!(is_empty(scratch.path()));
}
