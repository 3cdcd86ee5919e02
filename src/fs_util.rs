//! Small file helpers used by `BinaryWriter::create` to rotate or remove an existing output
//! file before it is truncated.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure reasons for [`delete`] and [`move_file`].
#[derive(Debug, Error)]
pub enum FileUtilError {
    /// `move_file` was asked not to overwrite, and the destination exists. Neither file was
    /// touched.
    #[error("cannot move {src:?} to {dst:?}: destination already exists")]
    DestinationExists {
        /// File that was to be moved.
        src: PathBuf,
        /// Existing destination.
        dst: PathBuf,
    },

    /// The file could not be deleted.
    #[error("failed to delete {path:?}: {source}")]
    Delete {
        /// File that could not be deleted.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The rename itself failed.
    #[error("failed to move {src:?} to {dst:?}: {source}")]
    Rename {
        /// File that was to be moved.
        src: PathBuf,
        /// Destination path.
        dst: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
}

/// Returns `true` if something exists at `path`.
pub fn exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().exists()
}

/// Deletes the file at `path`. A missing file is not an error.
pub fn delete(path: impl AsRef<Path>) -> Result<(), FileUtilError> {
    let path = path.as_ref();
    match std::fs::remove_file(path) {
        Ok(()) => {
            log::debug!("deleted {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(FileUtilError::Delete {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Renames `src` to `dst`.
///
/// If `dst` exists and `overwrite` is `false`, this fails with
/// [`FileUtilError::DestinationExists`] without touching either file. If `overwrite` is
/// `true`, `dst` is deleted first; a failure there is reported as [`FileUtilError::Delete`].
pub fn move_file(
    src: impl AsRef<Path>,
    dst: impl AsRef<Path>,
    overwrite: bool,
) -> Result<(), FileUtilError> {
    let (src, dst) = (src.as_ref(), dst.as_ref());

    if exists(dst) {
        if !overwrite {
            return Err(FileUtilError::DestinationExists {
                src: src.to_path_buf(),
                dst: dst.to_path_buf(),
            });
        }
        delete(dst)?;
    }

    std::fs::rename(src, dst).map_err(|source| FileUtilError::Rename {
        src: src.to_path_buf(),
        dst: dst.to_path_buf(),
        source,
    })?;
    log::debug!("moved {} to {}", src.display(), dst.display());
    Ok(())
}

/// Returns `<path>.bak`.
pub fn backup_path(path: impl AsRef<Path>) -> PathBuf {
    let mut s = path.as_ref().as_os_str().to_owned();
    s.push(".bak");
    PathBuf::from(s)
}
