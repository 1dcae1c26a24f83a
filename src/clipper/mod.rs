mod outcome;
mod strategy;
mod window;

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

pub use outcome::{
    truncate_message, ExtractedClip, ExtractionRequest, ExtractionResult, Failure, FailureKind,
};
pub use strategy::Strategy;
pub use window::{PaddedWindow, RelativeRange};

use crate::{
    config::{ClipSettings, EncodeSettings},
    io::named_tempfile_in,
    outside::{EncodeOptions, MediaSource, StreamResolver, StreamTransformer, TrimJob},
    types::Extension,
};

/// A padded window fetched for review, kept until trimmed or dropped
#[derive(Debug)]
pub struct Preview {
    file: NamedTempFile,
    pub window: PaddedWindow,
}

impl Preview {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// The requested clip, relative to the preview start
    pub fn suggested(&self) -> RelativeRange {
        self.window.clip_range()
    }
}

/// Decides the final range of a preview.
///
/// Returning `None` declines the clip.
pub trait PreviewReviewer {
    fn review(&self, preview: &Preview) -> Option<RelativeRange>;
}

/// Confirm every preview as suggested
#[derive(Debug, Default)]
pub struct AcceptSuggested;

impl PreviewReviewer for AcceptSuggested {
    fn review(&self, preview: &Preview) -> Option<RelativeRange> {
        Some(preview.suggested())
    }
}

/// Produces clip files from time ranges of a video, using the external
/// resolver and transformer
pub struct Clipper<'a> {
    resolver: &'a dyn StreamResolver,
    transformer: &'a dyn StreamTransformer,
    reviewer: &'a dyn PreviewReviewer,
    clip: ClipSettings,
    encode: EncodeSettings,
    scratch_dir: PathBuf,
}

impl<'a> Clipper<'a> {
    pub fn new(
        resolver: &'a dyn StreamResolver,
        transformer: &'a dyn StreamTransformer,
        reviewer: &'a dyn PreviewReviewer,
        clip: ClipSettings,
        encode: EncodeSettings,
        scratch_dir: &Path,
    ) -> Self {
        Self {
            resolver,
            transformer,
            reviewer,
            clip,
            encode,
            scratch_dir: scratch_dir.to_path_buf(),
        }
    }

    /// Produce the clip file of the request, with the strategy it asks for.
    ///
    /// A crop request on a stream copy is re-encoded instead.
    /// Nothing is retried: the first failure is returned.
    pub fn extract(&self, request: &ExtractionRequest) -> ExtractionResult {
        if request.start_seconds >= request.end_seconds {
            return Err(Failure::new(
                FailureKind::InvalidRange,
                format!(
                    "start ({}s) must be before end ({}s)",
                    request.start_seconds, request.end_seconds
                ),
            ));
        }

        let strategy = request.strategy.effective(request.crop_to_vertical);
        if strategy != request.strategy {
            info!(
                "A {} cannot crop, using a {strategy} instead",
                request.strategy
            );
        }

        // A file left by an earlier run must not pass for this run output
        remove_stale_output(&request.output, self.clip.max_message_len)?;

        match strategy {
            Strategy::StreamCopyDirect => {
                let media = self.resolve(request)?;
                self.stream_copy_direct(request, &media)?;
            }
            Strategy::PreciseReencode => {
                let media = self.resolve(request)?;
                self.precise_reencode(request, &media)?;
            }
            Strategy::PaddedHybrid => {
                // Unavailable videos are reported before fetching anything
                self.resolve(request)?;
                self.padded_hybrid(request)?;
            }
            Strategy::PreviewThenTrim => {
                let preview = self.preview(request)?;
                let range = self.reviewer.review(&preview).ok_or_else(|| {
                    Failure::new(FailureKind::InvalidRange, "preview declined")
                })?;
                self.finish_preview(preview, range, request.crop_to_vertical, &request.output)?;
            }
        }

        finished_clip(&request.output)
    }

    /// Fetch the padded preview of the request, for a later [`Clipper::finish_preview`]
    pub fn preview(&self, request: &ExtractionRequest) -> Result<Preview, Failure> {
        if request.start_seconds >= request.end_seconds {
            return Err(Failure::new(
                FailureKind::InvalidRange,
                "start must be before end",
            ));
        }

        let media = self.resolve(request)?;
        self.preview_from(request, &media)
    }

    /// Re-encode the range of the preview, relative to its start, into `output`.
    ///
    /// The preview file is deleted whatever the outcome.
    pub fn finish_preview(
        &self,
        preview: Preview,
        range: RelativeRange,
        crop_to_vertical: bool,
        output: &Path,
    ) -> Result<(), Failure> {
        if !range.fits_in(preview.window.duration()) {
            return Err(Failure::new(
                FailureKind::InvalidRange,
                format!(
                    "{range} is not inside the {}s preview",
                    preview.window.duration()
                ),
            ));
        }

        let input = MediaSource::local(preview.path());
        let job = TrimJob {
            input: &input,
            seek: range.start,
            duration: range.duration(),
            output,
        };

        self.transformer
            .reencode(&job, &EncodeOptions::new(&self.encode, crop_to_vertical))
            .map_err(|err| self.tool_failure(FailureKind::FilterFailed, &err))
    }

    fn resolve(&self, request: &ExtractionRequest) -> Result<MediaSource, Failure> {
        let media = self
            .resolver
            .resolve_media(&request.source, request.quality)
            .map_err(|err| self.tool_failure(FailureKind::FetchFailed, &err))?;
        debug!("Resolved {} media input(s)", media.inputs().len());
        Ok(media)
    }

    fn stream_copy_direct(
        &self,
        request: &ExtractionRequest,
        media: &MediaSource,
    ) -> Result<(), Failure> {
        let job = TrimJob {
            input: media,
            seek: request.start_seconds,
            duration: request.end_seconds - request.start_seconds,
            output: &request.output,
        };

        self.transformer
            .stream_copy(&job)
            .map_err(|err| self.tool_failure(FailureKind::FilterFailed, &err))
    }

    fn precise_reencode(
        &self,
        request: &ExtractionRequest,
        media: &MediaSource,
    ) -> Result<(), Failure> {
        let job = TrimJob {
            input: media,
            seek: request.start_seconds,
            duration: request.end_seconds - request.start_seconds,
            output: &request.output,
        };

        self.transformer
            .reencode(&job, &self.encode_options(request))
            .map_err(|err| self.tool_failure(FailureKind::FilterFailed, &err))
    }

    /// Fetch the padded window with the fetch tool, then re-encode only the clip.
    /// The padded file is deleted when it goes out of scope, on success as on failure.
    fn padded_hybrid(&self, request: &ExtractionRequest) -> Result<(), Failure> {
        let window = PaddedWindow::around(
            request.start_seconds,
            request.end_seconds,
            self.clip.padding,
        );
        let padded = self.scratch_file(&request.output)?;

        debug!(
            "Fetching padded window {}s-{}s into {}",
            window.start,
            window.end,
            padded.path().display()
        );
        self.resolver
            .fetch_section(&request.source, request.quality, &window, padded.path())
            .map_err(|err| self.tool_failure(FailureKind::FetchFailed, &err))?;

        let input = MediaSource::local(padded.path());
        let job = TrimJob {
            input: &input,
            seek: window.clip_offset,
            duration: window.clip_duration,
            output: &request.output,
        };

        self.transformer
            .reencode(&job, &self.encode_options(request))
            .map_err(|err| self.tool_failure(FailureKind::FilterFailed, &err))
    }

    fn preview_from(
        &self,
        request: &ExtractionRequest,
        media: &MediaSource,
    ) -> Result<Preview, Failure> {
        let window = PaddedWindow::around(
            request.start_seconds,
            request.end_seconds,
            self.clip.preview_padding,
        );
        let file = self.scratch_file(&request.output)?;

        let job = TrimJob {
            input: media,
            seek: window.start,
            duration: window.duration(),
            output: file.path(),
        };
        self.transformer
            .stream_copy(&job)
            .map_err(|err| self.tool_failure(FailureKind::FetchFailed, &err))?;

        info!(
            "Preview ready at {}, clip at {} in it",
            file.path().display(),
            window.clip_range()
        );
        Ok(Preview { file, window })
    }

    fn encode_options(&self, request: &ExtractionRequest) -> EncodeOptions {
        EncodeOptions::new(&self.encode, request.crop_to_vertical)
    }

    /// A temporary file in the scratch directory, in the container of the output
    fn scratch_file(&self, output: &Path) -> Result<NamedTempFile, Failure> {
        let ext = Extension::from_path(output).unwrap_or_default();
        named_tempfile_in(&self.scratch_dir, ext).map_err(|err| {
            Failure::new(
                FailureKind::OutputMissing,
                truncate_message(
                    &format!("could not create a scratch file: {err}"),
                    self.clip.max_message_len,
                ),
            )
        })
    }

    fn tool_failure(&self, kind: FailureKind, err: &crate::result::Error) -> Failure {
        Failure::from_tool_error(kind, err, self.clip.max_message_len)
    }
}

fn remove_stale_output(output: &Path, max_len: usize) -> Result<(), Failure> {
    match std::fs::remove_file(output) {
        Ok(()) => {
            debug!("Removed the previous {}", output.display());
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(Failure::new(
            FailureKind::OutputMissing,
            truncate_message(
                &format!("could not remove the previous {}: {err}", output.display()),
                max_len,
            ),
        )),
    }
}

/// The produced clip, if the tool really wrote it
fn finished_clip(path: &Path) -> ExtractionResult {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(ExtractedClip {
            path: path.to_path_buf(),
            size_bytes: meta.len(),
        }),
        _ => Err(Failure::new(
            FailureKind::OutputMissing,
            "file not created",
        )),
    }
}

#[cfg(test)]
pub(crate) mod tests;
