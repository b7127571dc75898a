use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::Context;

use super::{Archiver, mirror_path};

/// What a file pattern produced.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopiedFiles {
    /// Files copied into the destination.
    pub copied: usize,
    /// Matched files that could not be copied.
    pub failed: usize,
}

impl Archiver<'_> {
    /// Copy every regular file matching `pattern` into `destination`, keeping its absolute
    /// path.
    ///
    /// Directories and symlinks that match are skipped. A file that cannot be copied is
    /// logged and counted, the remaining matches are still copied.
    pub fn copy_files(
        &self,
        context: &mut Context,
        pattern: &str,
        destination: &Path,
    ) -> Result<CopiedFiles, CopyFilesError> {
        context.current_context = "Files";
        info!("{context}Backing up file {pattern} to {destination:?}");

        let paths = glob::glob(pattern)?;
        let mut files = CopiedFiles::default();

        for path in paths {
            let path = match path {
                Ok(path) => path,
                Err(error) => {
                    warn!("{context}Could not read match: {error}");
                    continue;
                }
            };

            match copy_file(&path, destination) {
                Ok(true) => files.copied += 1,
                Ok(false) => {}
                Err(error) => {
                    error!("{context}{error}");
                    files.failed += 1;
                }
            }
        }

        Ok(files)
    }
}

/// Copy `path` to its mirrored location, returning false when it is not a regular file.
fn copy_file(path: &Path, destination: &Path) -> Result<bool, CopyFilesError> {
    let metadata = fs::symlink_metadata(path)
        .map_err(|e| CopyFilesError::Io(e, "get file metadata", path.to_path_buf()))?;
    if !metadata.file_type().is_file() {
        return Ok(false);
    }

    let target = mirror_path(destination, path);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| CopyFilesError::Io(e, "create directory", parent.to_path_buf()))?;
    }

    fs::copy(path, &target).map_err(|e| CopyFilesError::Io(e, "copy file", path.to_path_buf()))?;

    Ok(true)
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum CopyFilesError {
    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Failed to {1} {2:?}: {0}")]
    Io(#[source] io::Error, &'static str, PathBuf),
}
