use std::{
    cell::RefCell,
    io::{BufRead, Write},
    path::{Path, PathBuf},
};

use indoc::writedoc;
use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use tracing::{debug, warn};

use crate::{
    batch::{Batch, BatchOptions, BatchReport},
    cli::ClipOptions,
    clipper::{Clipper, Failure, FailureKind, Preview, PreviewReviewer, RelativeRange},
    config::Settings,
    io::move_into,
    outside::VideoSearcher,
    session::Session,
    types::{
        format_duration, format_view_count, parse_clip_requests, parse_range_line, truncate_chars,
        VideoRecord,
    },
};

const TABLE_TITLE_CHARS: usize = 50;
const TABLE_UPLOADER_CHARS: usize = 20;

/// Line based terminal: questions and reports on the output, answers from the input.
///
/// A command and the preview reviews running inside it read the same input,
/// so the terminal is shared through a [`RefCell`] and borrowed for one exchange at a time.
pub struct Terminal<R, W> {
    input: R,
    output: W,
    color: bool,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W, color: bool) -> Self {
        Self {
            input,
            output,
            color,
        }
    }

    /// Ask a question and return the trimmed answer, `None` at the end of the input
    pub fn prompt(&mut self, question: &str) -> Result<Option<String>> {
        let written = if self.color {
            write!(self.output, "{} ", question.bold())
        } else {
            write!(self.output, "{question} ")
        };
        written.into_diagnostic()?;
        self.output.flush().into_diagnostic()?;

        let mut line = String::new();
        if self.input.read_line(&mut line).into_diagnostic()? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_owned()))
    }

    /// Read lines until an empty one or the end of the input
    pub fn read_block(&mut self, question: &str) -> Result<String> {
        self.say(question)?;

        let mut block = String::new();
        loop {
            let mut line = String::new();
            if self.input.read_line(&mut line).into_diagnostic()? == 0 || line.trim().is_empty() {
                return Ok(block);
            }
            block.push_str(&line);
        }
    }

    pub fn say(&mut self, message: impl std::fmt::Display) -> Result<()> {
        writeln!(self.output, "{message}").into_diagnostic()
    }

    /// Print a status line, highlighted as an error when colors are on
    pub fn status_error(&mut self, message: impl std::fmt::Display) -> Result<()> {
        let written = if self.color {
            writeln!(self.output, "{}", message.to_string().red())
        } else {
            writeln!(self.output, "{message}")
        };
        written.into_diagnostic()
    }

    pub fn print_results(&mut self, results: &[VideoRecord]) -> Result<()> {
        let header = format!(
            "{:>3}  {:<title$}  {:>7}  {:>8}  {}",
            "#",
            "Title",
            "Views",
            "Duration",
            "Uploader",
            title = TABLE_TITLE_CHARS
        );
        let written = if self.color {
            writeln!(self.output, "{}", header.bold())
        } else {
            writeln!(self.output, "{header}")
        };
        written.into_diagnostic()?;

        for (i, video) in results.iter().enumerate() {
            writeln!(
                self.output,
                "{:>3}  {:<title$}  {:>7}  {:>8}  {}",
                i + 1,
                truncate_chars(&video.title, TABLE_TITLE_CHARS),
                format_view_count(video.view_count),
                format_duration(video.duration_seconds),
                truncate_chars(&video.uploader, TABLE_UPLOADER_CHARS),
                title = TABLE_TITLE_CHARS
            )
            .into_diagnostic()?;
        }
        Ok(())
    }

    pub fn print_video(&mut self, video: &VideoRecord) -> Result<()> {
        writedoc!(
            self.output,
            "

            Selected: {title}
              Uploader: {uploader}
              Duration: {duration}
              Views:    {views}
              URL:      {url}
            ",
            title = video.title,
            uploader = video.uploader,
            duration = format_duration(video.duration_seconds),
            views = format_view_count(video.view_count),
            url = video.url,
        )
        .into_diagnostic()
    }
}

/// What the user answered to a preview
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAnswer {
    Accept,
    Adjust(RelativeRange),
    Decline,
    Invalid,
}

impl ReviewAnswer {
    pub fn parse(answer: &str) -> Self {
        let answer = answer.trim();
        if answer.is_empty() {
            Self::Accept
        } else if answer.eq_ignore_ascii_case("n") {
            Self::Decline
        } else if let Some((start, end)) = parse_range_line(answer) {
            Self::Adjust(RelativeRange { start, end })
        } else {
            Self::Invalid
        }
    }
}

/// Asks the user to confirm or adjust every preview, on the terminal of the running command
pub struct TerminalReviewer<'t, R, W> {
    term: &'t RefCell<Terminal<R, W>>,
}

impl<'t, R, W> TerminalReviewer<'t, R, W> {
    pub fn new(term: &'t RefCell<Terminal<R, W>>) -> Self {
        Self { term }
    }
}

impl<R: BufRead, W: Write> PreviewReviewer for TerminalReviewer<'_, R, W> {
    fn review(&self, preview: &Preview) -> Option<RelativeRange> {
        let Ok(mut term) = self.term.try_borrow_mut() else {
            warn!("The terminal is busy, the preview cannot be reviewed");
            return None;
        };
        review_with(&mut term, preview)
    }
}

fn review_with<R: BufRead, W: Write>(
    term: &mut Terminal<R, W>,
    preview: &Preview,
) -> Option<RelativeRange> {
    let suggested = preview.suggested();
    let intro = term.say(format_args!(
        "Preview ready: {}\nThe clip is at {suggested} in the preview ({}s long)",
        preview.path().display(),
        preview.window.duration()
    ));
    if let Err(err) = intro {
        warn!("Could not show the preview: {err}");
        return None;
    }

    loop {
        let answer = match term.prompt("Enter to confirm, M:SS-M:SS to adjust, n to skip:") {
            Ok(Some(answer)) => answer,
            Ok(None) => return None,
            Err(err) => {
                warn!("Could not read the review: {err}");
                return None;
            }
        };

        match ReviewAnswer::parse(&answer) {
            ReviewAnswer::Accept => return Some(suggested),
            ReviewAnswer::Adjust(range) => return Some(range),
            ReviewAnswer::Decline => return None,
            ReviewAnswer::Invalid => debug!("Not a review answer: {answer:?}"),
        }
    }
}

/// Search videos. Finding none is a failure too.
pub fn find_videos(
    searcher: &dyn VideoSearcher,
    query: &str,
    settings: &Settings,
) -> std::result::Result<Vec<VideoRecord>, Failure> {
    let results = searcher
        .search(query, settings.search.max_results)
        .map_err(|err| {
            Failure::from_tool_error(FailureKind::SearchFailed, &err, settings.clip.max_message_len)
        })?;

    if results.is_empty() {
        return Err(Failure::new(
            FailureKind::NoResults,
            format!("nothing found for {query:?}"),
        ));
    }
    Ok(results)
}

/// Run the search and show how it went. The results are returned, not printed.
pub fn search_and_report<R: BufRead, W: Write>(
    term: &RefCell<Terminal<R, W>>,
    searcher: &dyn VideoSearcher,
    query: &str,
    settings: &Settings,
) -> Result<Option<Vec<VideoRecord>>> {
    term.borrow_mut()
        .say(format_args!("Searching for: {query}"))?;

    match find_videos(searcher, query, settings) {
        Ok(results) => {
            term.borrow_mut()
                .say(format_args!("Found {} videos", results.len()))?;
            Ok(Some(results))
        }
        Err(failure) => {
            match failure.kind {
                FailureKind::NoResults => term.borrow_mut().say(&failure)?,
                _ => term.borrow_mut().status_error(&failure)?,
            }
            Ok(None)
        }
    }
}

/// Run the batch, show its report and move the clips into the output directory.
///
/// The terminal is not borrowed while the batch runs, so that previews can be reviewed on it.
pub fn run_and_deliver<R: BufRead, W: Write>(
    term: &RefCell<Terminal<R, W>>,
    clipper: &Clipper<'_>,
    text: &str,
    video: Option<&VideoRecord>,
    options: &ClipOptions,
    scratch_out: &Path,
) -> Result<Vec<PathBuf>> {
    let requests = parse_clip_requests(text, &options.prefix);
    let batch_options = BatchOptions {
        quality: options.quality,
        crop_to_vertical: options.crop,
        strategy: options.strategy,
        extension: options.ext,
        out_dir: scratch_out.to_path_buf(),
    };

    let report = Batch::new(clipper).run(&requests, video, &batch_options);

    let mut term = term.borrow_mut();
    show_report(&mut term, &report)?;
    deliver(&mut term, &report, &options.out)
}

fn show_report<R: BufRead, W: Write>(term: &mut Terminal<R, W>, report: &BatchReport) -> Result<()> {
    if report.halted.is_some() {
        term.status_error(report)
    } else {
        term.say(report)
    }
}

fn deliver<R: BufRead, W: Write>(
    term: &mut Terminal<R, W>,
    report: &BatchReport,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    if report.succeeded.is_empty() {
        return Ok(Vec::new());
    }
    std::fs::create_dir_all(out_dir).into_diagnostic()?;

    let mut delivered = Vec::with_capacity(report.succeeded.len());
    for clip in &report.succeeded {
        match move_into(clip, out_dir) {
            Ok(path) => {
                term.say(format_args!("Saved {}", path.display()))?;
                delivered.push(path);
            }
            Err(err) => term.status_error(format_args!(
                "Could not save {}: {err}",
                clip.display()
            ))?,
        }
    }
    Ok(delivered)
}

/// The search, pick and clip loop. Returns at the end of the input or on an empty search.
pub fn run_session<R: BufRead, W: Write>(
    term: &RefCell<Terminal<R, W>>,
    searcher: &dyn VideoSearcher,
    clipper: &Clipper<'_>,
    session: &mut Session,
    options: &ClipOptions,
    settings: &Settings,
) -> Result<()> {
    loop {
        let query = term.borrow_mut().prompt("Search (empty to quit):")?;
        let Some(query) = query.filter(|q| !q.is_empty()) else {
            return Ok(());
        };

        let Some(results) = search_and_report(term, searcher, &query, settings)? else {
            continue;
        };
        session.selection.replace_results(results);

        loop {
            term.borrow_mut()
                .print_results(session.selection.results())?;
            let pick = term
                .borrow_mut()
                .prompt("Pick a video # (empty to search again):")?;
            let Some(pick) = pick else {
                return Ok(());
            };
            if pick.is_empty() {
                session.selection.clear_selection();
                break;
            }

            let selected = pick
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|index| session.selection.select(index));
            let Some(video) = selected else {
                term.borrow_mut()
                    .status_error(format_args!("No video #{pick}"))?;
                continue;
            };
            let video = video.clone();

            let (text, prefix) = {
                let mut term = term.borrow_mut();
                term.print_video(&video)?;
                let text =
                    term.read_block("Clip ranges, M:SS-M:SS one per line, then an empty line:")?;
                let prefix = term.prompt(&format!("Clip name prefix [{}]:", options.prefix))?;
                (text, prefix)
            };
            let options = ClipOptions {
                prefix: prefix
                    .filter(|p| !p.is_empty())
                    .unwrap_or_else(|| options.prefix.clone()),
                ..options.clone()
            };

            run_and_deliver(
                term,
                clipper,
                &text,
                session.selection.selected(),
                &options,
                session.downloads_dir(),
            )?;
        }
    }
}
