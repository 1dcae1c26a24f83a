use std::{fmt::Display, time::Duration};

use miette::miette;

/// Errors of the external tools adapters.
///
/// Kept apart from [`miette::Report`] so that callers can branch on the
/// failures they know how to report (an unavailable video, a timeout, a tool
/// that ran but failed) instead of only displaying them.
#[derive(Debug)]
pub enum Error {
    UnavailableStream,

    Timeout {
        program: String,
        after: Duration,
    },

    Unsuccessful {
        program: String,
        stderr: String,
    },

    Miette(miette::Report),
}

impl From<miette::Report> for Error {
    fn from(err: miette::Report) -> Self {
        Error::Miette(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Miette(miette!("{err}"))
    }
}

impl From<Error> for miette::Report {
    fn from(err: Error) -> Self {
        match err {
            Error::Miette(err) => err,
            err => miette!("{err}"),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UnavailableStream => write!(f, "Unavailable stream"),
            Error::Timeout { program, after } => {
                write!(f, "{program} timed out after {}s", after.as_secs())
            }
            Error::Unsuccessful { program, stderr } => {
                let stderr = stderr.trim();
                if stderr.is_empty() {
                    write!(f, "{program} did run but was not successful")
                } else {
                    write!(f, "{program} did run but was not successful: {stderr}")
                }
            }
            Error::Miette(report) => write!(f, "{report}"),
        }
    }
}

impl Error {
    pub fn wrap_err_with<D, F>(self, f: F) -> Error
    where
        D: Display + Send + Sync + 'static,
        F: FnOnce() -> D,
    {
        match self {
            Error::Miette(report) => Error::Miette(report.wrap_err(f())),
            err => err,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}

pub fn err_msg<D: Display + Send + Sync + 'static>(msg: D) -> Error {
    Error::Miette(miette!("{msg}"))
}

pub fn bail<T, D: Display + Send + Sync + 'static>(msg: D) -> Result<T> {
    Err(err_msg(msg))
}

pub type Result<T> = std::result::Result<T, Error>;
