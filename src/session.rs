use std::path::{Path, PathBuf};

use miette::{Context, IntoDiagnostic, Result};
use tempfile::TempDir;
use tracing::debug;

use crate::types::VideoRecord;

/// The search results and the video picked among them
#[derive(Debug, Default)]
pub struct SelectionState {
    results: Vec<VideoRecord>,
    selected: Option<VideoRecord>,
}

impl SelectionState {
    /// Replace the results of the previous search.
    ///
    /// The selection is cleared, as it may not be part of the new results.
    pub fn replace_results(&mut self, results: Vec<VideoRecord>) {
        self.results = results;
        self.selected = None;
    }

    pub fn results(&self) -> &[VideoRecord] {
        &self.results
    }

    /// Select the video at `index` in the results, resolving its watch URL.
    ///
    /// An index out of the results leaves the selection unchanged.
    pub fn select(&mut self, index: usize) -> Option<&VideoRecord> {
        let mut video = self.results.get(index)?.clone();
        video.resolve_watch_url();
        debug!("Selected video {index}: {}", video.url);

        self.selected = Some(video);
        self.selected.as_ref()
    }

    /// Select a video that is not part of the results
    pub fn select_video(&mut self, video: VideoRecord) -> &VideoRecord {
        self.selected.insert(video)
    }

    pub fn selected(&self) -> Option<&VideoRecord> {
        self.selected.as_ref()
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }
}

/// State living as long as one user session: the selection and the scratch
/// directory holding the files being produced.
///
/// The scratch directory and everything in it is removed when the session is dropped.
#[derive(Debug)]
pub struct Session {
    pub selection: SelectionState,
    scratch: TempDir,
    downloads: PathBuf,
}

impl Session {
    /// Create the scratch directory, in `parent` if given, in the system temporary directory otherwise
    pub fn new(parent: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("ytclip-");
        let scratch = match parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .into_diagnostic()
        .wrap_err("Could not create the scratch directory")?;

        let downloads = scratch.path().join("downloads");
        std::fs::create_dir_all(&downloads)
            .into_diagnostic()
            .wrap_err("Could not create the downloads directory")?;
        debug!("Session scratch directory: {}", scratch.path().display());

        Ok(Self {
            selection: SelectionState::default(),
            scratch,
            downloads,
        })
    }

    /// Where intermediate files are written
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// Where finished clips are written before being delivered
    pub fn downloads_dir(&self) -> &Path {
        &self.downloads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str) -> VideoRecord {
        VideoRecord::new(
            Some(id.to_owned()),
            Some(format!("Video {id}")),
            Some(format!("https://provider.example/{id}")),
            Some(60.0),
            Some(10),
            None,
            None,
        )
    }

    #[test]
    fn select_resolves_watch_url() {
        let mut state = SelectionState::default();
        state.replace_results(vec![video("a"), video("b")]);

        let selected = state.select(1).unwrap();
        assert_eq!(selected.url, "https://www.youtube.com/watch?v=b");
        assert_eq!(state.selected().unwrap().id, "b");
        // The results keep the provider url
        assert_eq!(state.results()[1].url, "https://provider.example/b");
    }

    #[test]
    fn out_of_range_keeps_selection() {
        let mut state = SelectionState::default();
        state.replace_results(vec![video("a")]);
        state.select(0);

        assert!(state.select(5).is_none());
        assert_eq!(state.selected().unwrap().id, "a");
    }

    #[test]
    fn new_search_clears_selection() {
        let mut state = SelectionState::default();
        state.replace_results(vec![video("a")]);
        state.select(0);

        state.replace_results(vec![video("c"), video("d")]);
        assert!(state.selected().is_none());
        assert_eq!(state.results().len(), 2);
    }

    #[test]
    fn scratch_is_removed_with_the_session() {
        let parent = tempfile::tempdir().unwrap();
        let session = Session::new(Some(parent.path())).unwrap();
        let scratch = session.scratch_dir().to_path_buf();

        assert!(session.downloads_dir().is_dir());
        std::fs::write(session.downloads_dir().join("clip_1.mp4"), b"clip").unwrap();

        drop(session);
        assert!(!scratch.exists());
    }
}
