mod batch;
mod cli;
mod clipper;
mod config;
mod interactive;
mod io;
mod logging;
mod my_regex;
mod outside;
mod result;
mod session;
mod types;

use std::{
    cell::RefCell,
    io::{IsTerminal, StdinLock, Stdout},
};

use clap::Parser;
use miette::{miette, Context, IntoDiagnostic};
use tracing::{debug, info};

use crate::{
    cli::{Args, ClipOptions, Command},
    clipper::{AcceptSuggested, Clipper, PreviewReviewer},
    config::Settings,
    interactive::{run_and_deliver, run_session, search_and_report, Terminal, TerminalReviewer},
    outside::{Ffmpeg, VideoSearcher, Ytdl},
    session::Session,
    types::VideoRecord,
};

fn main() -> miette::Result<()> {
    let args = Args::parse();
    logging::init_logging(args.log_level)?;

    let settings = Settings::load(args.config.as_deref())?;
    let (ytdl, ffmpeg) = load_external_components(&settings)?;

    let mut session = Session::new(settings.scratch_parent.as_deref())?;
    let color = std::io::stdout().is_terminal();

    let stdin = std::io::stdin();
    let interactive = stdin.is_terminal();
    let term = RefCell::new(Terminal::new(stdin.lock(), std::io::stdout(), color));

    // Without a user to ask, every preview is confirmed as suggested
    let terminal_reviewer = TerminalReviewer::new(&term);
    let reviewer: &dyn PreviewReviewer = if interactive {
        &terminal_reviewer
    } else {
        &AcceptSuggested
    };
    let clipper = Clipper::new(
        &ytdl,
        &ffmpeg,
        reviewer,
        settings.clip.clone(),
        settings.encode.clone(),
        session.scratch_dir(),
    );

    match args.command {
        Command::Search { query, max_results } => {
            let mut settings = settings.clone();
            if let Some(max_results) = max_results {
                settings.search.max_results = max_results;
            }
            search(&term, &ytdl, &query, &settings)?;
        }
        Command::Clip {
            video,
            timestamps,
            from_file,
            output,
        } => {
            let mut text = timestamps.join("\n");
            if let Some(path) = from_file {
                let file = std::fs::read_to_string(&path)
                    .into_diagnostic()
                    .wrap_err_with(|| format!("Could not read {}", path.display()))?;
                text.push('\n');
                text.push_str(&file);
            }

            let video = session
                .selection
                .select_video(VideoRecord::from_locator(&video))
                .clone();
            info!("Clipping {}", video.url);
            clip(&term, &clipper, &session, &text, &video, &output)?;
        }
        Command::Session { output } => {
            run_session(&term, &ytdl, &clipper, &mut session, &output, &settings)?;
        }
    }

    debug!("Removing the session scratch directory");
    Ok(())
}

/// Verify that the external programs are reachable
fn load_external_components(settings: &Settings) -> miette::Result<(Ytdl, Ffmpeg)> {
    // Construct the handles concurrently as executing an external program
    // is not instantaneous. That way we can avoid adding the costs
    let ytdl_settings = settings.clone();
    let ytdl_thread = std::thread::spawn(move || Ytdl::new(&ytdl_settings));
    let ffmpeg_settings = settings.clone();
    let ffmpeg_thread = std::thread::spawn(move || Ffmpeg::new(&ffmpeg_settings));

    let ytdl = ytdl_thread
        .join()
        .map_err(|_| miette!("Could not join the yt-dlp check thread"))?;
    let ffmpeg = ffmpeg_thread
        .join()
        .map_err(|_| miette!("Could not join the ffmpeg check thread"))?;

    Ok((ytdl?, ffmpeg?))
}

type StdTerminal<'a> = RefCell<Terminal<StdinLock<'a>, Stdout>>;

fn search(
    term: &StdTerminal<'_>,
    searcher: &dyn VideoSearcher,
    query: &str,
    settings: &Settings,
) -> miette::Result<()> {
    match search_and_report(term, searcher, query, settings)? {
        Some(results) => term.borrow_mut().print_results(&results),
        None => Ok(()),
    }
}

fn clip(
    term: &StdTerminal<'_>,
    clipper: &Clipper<'_>,
    session: &Session,
    text: &str,
    video: &VideoRecord,
    options: &ClipOptions,
) -> miette::Result<()> {
    term.borrow_mut().print_video(video)?;
    let delivered = run_and_deliver(
        term,
        clipper,
        text,
        Some(video),
        options,
        session.downloads_dir(),
    )?;
    debug!("{} clips delivered", delivered.len());
    Ok(())
}
