use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use tracing::{info, warn};

use crate::{
    clipper::{Clipper, ExtractionRequest, FailureKind, Strategy},
    types::{format_size, ClipRequest, Extension, Quality, VideoRecord},
};

/// The choices applying to every clip of a batch
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub quality: Quality,
    pub crop_to_vertical: bool,
    pub strategy: Strategy,
    pub extension: Extension,
    /// Where the clips are written
    pub out_dir: PathBuf,
}

/// What happened to the clips of a batch
#[derive(Debug, Default)]
pub struct BatchReport {
    pub lines: Vec<String>,
    /// Produced files, in the clips order
    pub succeeded: Vec<PathBuf>,
    pub total: usize,
    /// Set when the batch stopped before extracting anything
    pub halted: Option<FailureKind>,
}

impl BatchReport {
    fn halt(kind: FailureKind, message: &str) -> Self {
        warn!("{message}");
        Self {
            lines: vec![message.to_owned()],
            halted: Some(kind),
            ..Default::default()
        }
    }

    fn push(&mut self, line: String) {
        info!("{line}");
        self.lines.push(line);
    }

    fn push_failed(&mut self, line: String) {
        warn!("{line}");
        self.lines.push(line);
    }
}

impl Display for BatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Run the clip requests of a video one after the other.
///
/// A failed clip is reported and does not stop the following ones.
pub struct Batch<'c, 'a> {
    clipper: &'c Clipper<'a>,
}

impl<'c, 'a> Batch<'c, 'a> {
    pub fn new(clipper: &'c Clipper<'a>) -> Self {
        Self { clipper }
    }

    pub fn run(
        &self,
        requests: &[ClipRequest],
        source: Option<&VideoRecord>,
        options: &BatchOptions,
    ) -> BatchReport {
        let Some(source) = source else {
            return BatchReport::halt(FailureKind::NoVideoSelected, "No video selected");
        };
        if requests.is_empty() {
            return BatchReport::halt(
                FailureKind::NoValidTimestamps,
                "No valid timestamps. Use format: 2:30-3:15 (one per line)",
            );
        }

        let total = requests.len();
        let mut report = BatchReport {
            total,
            ..Default::default()
        };
        report.push(format!("Processing {total} clips from:\n{}", source.title));

        for (i, clip) in requests.iter().enumerate() {
            let i = i + 1;
            let request = ExtractionRequest {
                source: source.url.clone(),
                start_seconds: clip.start_seconds,
                end_seconds: clip.end_seconds,
                quality: options.quality,
                crop_to_vertical: options.crop_to_vertical,
                strategy: options.strategy,
                output: output_path(&options.out_dir, &clip.name_stem, i, options.extension),
            };

            info!(
                "Clip {i}/{total}: extracting {clip} ({}s) with a {}",
                clip.duration(),
                options.strategy
            );
            match self.clipper.extract(&request) {
                Ok(extracted) => {
                    report.push(format!(
                        "Clip {i}/{total}: {clip}... OK ({})",
                        format_size(extracted.size_bytes)
                    ));
                    report.succeeded.push(extracted.path);
                }
                Err(failure) => {
                    report.push_failed(format!("Clip {i}/{total}: {clip}... FAILED {failure}"));
                }
            }
        }

        report.push(format!(
            "{}/{total} clips succeeded",
            report.succeeded.len()
        ));
        report
    }
}

/// `{stem}_{index}{ext}`, the index being 1-based
fn output_path(out_dir: &Path, stem: &str, index: usize, extension: Extension) -> PathBuf {
    out_dir.join(format!("{stem}_{index}{}", extension.with_dot()))
}
