//! Retention of dated backup folders.
//!

use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    time::SystemTime,
};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::Context;

/// A backup folder and when it was last modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatedFolder {
    /// The folder's path.
    pub path: PathBuf,
    /// The folder's last modified time.
    pub modified: SystemTime,
}

/// The result of a cleanup pass.
#[derive(Debug, Default)]
pub struct Cleanup {
    /// Folders that were removed.
    pub removed: Vec<PathBuf>,
    /// Folders that could not be removed.
    pub failed: Vec<(PathBuf, io::Error)>,
}

/// Remove the oldest subdirectories of `directory` so that at most `keep` remain.
///
/// A missing directory has nothing to clean up. Files inside `directory` are never
/// touched. A folder that cannot be removed is logged and does not stop the removal of
/// the others.
pub fn cleanup(
    context: &mut Context,
    directory: &Path,
    keep: u32,
) -> Result<Cleanup, CleanupError> {
    context.current_context = "Cleanup";

    let folders = dated_folders(context, directory)?;
    let expired = expired(folders, keep);

    Ok(remove_folders(context, &expired))
}

/// List the immediate subdirectories of `directory`, oldest first.
///
/// Folders with equal modified times are ordered by path.
pub fn dated_folders(
    context: &Context,
    directory: &Path,
) -> Result<Vec<DatedFolder>, CleanupError> {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(error) => return Err(CleanupError::ReadDirectory(directory.to_path_buf(), error)),
    };

    let mut folders: Vec<DatedFolder> = entries
        .filter_map(|entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    warn!("{context}Could not read entry: {error}");
                    return None;
                }
            };
            let path = entry.path();

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(error) => {
                    warn!("{context}Could not get entry '{path:?}' metadata: {error}");
                    return None;
                }
            };

            if !metadata.is_dir() {
                return None;
            }

            let modified = match metadata.modified() {
                Ok(modified) => modified,
                Err(error) => {
                    warn!("{context}Could not get entry '{path:?}' modified time: {error}");
                    return None;
                }
            };

            Some(DatedFolder { path, modified })
        })
        .collect();

    // Sort by age, oldest first.
    folders.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));

    Ok(folders)
}

/// The folders beyond the `keep` most recent, given folders sorted oldest first.
pub fn expired(mut folders: Vec<DatedFolder>, keep: u32) -> Vec<DatedFolder> {
    let keep = usize::try_from(keep).unwrap_or(usize::MAX);

    // If there is less than the limit, nothing has expired
    if folders.len() <= keep {
        return Vec::new();
    }

    let expired_count = folders.len() - keep;
    folders.truncate(expired_count);
    folders
}

/// Recursively remove each folder, continuing past failures.
pub fn remove_folders(context: &Context, folders: &[DatedFolder]) -> Cleanup {
    let mut cleanup = Cleanup::default();

    for folder in folders {
        info!("{context}Deleting {:?}", folder.path);

        match fs::remove_dir_all(&folder.path) {
            Ok(()) => cleanup.removed.push(folder.path.clone()),
            Err(error) => {
                error!("{context}Could not remove folder {:?}: {error}", folder.path);
                cleanup.failed.push((folder.path.clone(), error));
            }
        }
    }

    cleanup
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("Failed to read directory {0:?}: {1}")]
    ReadDirectory(PathBuf, #[source] io::Error),
}
