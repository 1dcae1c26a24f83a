use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::{result::Result, types::Extension};

/// Create a named temporary file in `dir` and return its handle.
///
/// The file destructor will be called at the handle drop.
/// **As such, one must not simply get the file path and drop the handle.**
pub fn named_tempfile_in(dir: &Path, extension: Extension) -> Result<NamedTempFile> {
    Ok(tempfile::Builder::new()
        .prefix("part-")
        .suffix(extension.with_dot())
        .tempfile_in(dir)?)
}

/// Move a file into `out_dir`, keeping its name, and return the new path.
/// An existing file of the same name is replaced.
pub fn move_into(file: &Path, out_dir: &Path) -> Result<PathBuf> {
    let name = file
        .file_name()
        .ok_or_else(|| crate::result::err_msg(format!("{} has no file name", file.display())))?;
    let output = out_dir.join(name);

    // First try to do a simple move
    if std::fs::rename(file, &output).is_err() {
        debug!("Moving file failed, falling back to copying");
        std::fs::copy(file, &output)?;
        std::fs::remove_file(file)?;
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tempfile_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let file = named_tempfile_in(dir.path(), Extension::Mkv).unwrap();
        let path = file.path().to_path_buf();

        assert_eq!(Extension::from_path(&path), Some(Extension::Mkv));
        assert!(path.exists());
        drop(file);
        assert!(!path.exists());
    }

    #[test]
    fn move_replaces_existing_file() {
        let scratch = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();

        let clip = scratch.path().join("x_1.mp4");
        std::fs::write(&clip, b"new").unwrap();
        std::fs::write(out.path().join("x_1.mp4"), b"old").unwrap();

        let moved = move_into(&clip, out.path()).unwrap();
        assert_eq!(moved, out.path().join("x_1.mp4"));
        assert_eq!(std::fs::read(&moved).unwrap(), b"new");
        assert!(!clip.exists());
    }
}
