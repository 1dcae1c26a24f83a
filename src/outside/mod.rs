mod command;
mod ffmpeg;
mod ytdl;

use std::{ffi::OsString, path::Path};

pub use ffmpeg::{EncodeOptions, Ffmpeg, StreamTransformer, TrimJob};
pub use ytdl::{StreamResolver, VideoSearcher, Ytdl};

/// The inputs a trim reads from: a remote muxed stream, separate remote
/// video and audio streams, or a local file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSource {
    inputs: Vec<OsString>,
}

impl MediaSource {
    pub fn remote(video: &str, audio: Option<&str>) -> Self {
        Self {
            inputs: std::iter::once(video).chain(audio).map(OsString::from).collect(),
        }
    }

    pub fn local(path: &Path) -> Self {
        Self {
            inputs: vec![path.as_os_str().to_os_string()],
        }
    }

    pub fn inputs(&self) -> &[OsString] {
        &self.inputs
    }
}
