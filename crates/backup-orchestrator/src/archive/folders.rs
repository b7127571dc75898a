use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    Context,
    config::FolderSpec,
    tool::{ToolCommand, ToolError},
};

use super::{Archiver, mirror_path};

impl Archiver<'_> {
    /// Tar and gzip a folder into `destination`, keeping the folder's absolute path.
    ///
    /// The archive is `<destination>/<folder path>/<basename>.tar.gz`.
    pub fn tar_folder(
        &self,
        context: &mut Context,
        folder: &FolderSpec,
        destination: &Path,
    ) -> Result<PathBuf, TarFolderError> {
        context.current_context = "Folders";
        info!("{context}Backing up folder {:?} to {destination:?}", folder.path);

        let folder_metadata = fs::metadata(&folder.path)
            .map_err(|e| TarFolderError::Io(e, "get folder metadata"))?;
        if !folder_metadata.is_dir() {
            return Err(TarFolderError::NotDirectory(folder.path.clone()));
        }

        let path_str = folder.path.to_str().ok_or(TarFolderError::NotUnicode)?;
        let basename = folder
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or(TarFolderError::NoBasename)?;

        for exclude in &folder.excludes {
            if !is_pattern(exclude)
                && !Path::new(exclude).exists()
                && !folder.path.join(exclude).exists()
            {
                warn!(
                    "{context}Exclude path {exclude} not found, check the config entry is correct"
                );
            }
        }

        let archive_directory = mirror_path(destination, &folder.path);
        fs::create_dir_all(&archive_directory)
            .map_err(|e| TarFolderError::Io(e, "create archive directory"))?;

        let archive = archive_directory.join(format!("{basename}.tar.gz"));
        let archive_str = archive.to_str().ok_or(TarFolderError::NotUnicode)?;

        let command = ToolCommand::new("tar")
            .args(["czfP", archive_str])
            .args(folder.excludes.iter().map(|exclude| format!("--exclude={exclude}")))
            .arg(path_str);

        self.runner.run_checked(&command)?;

        Ok(archive)
    }
}

/// If an exclude is a shell pattern rather than a path.
fn is_pattern(exclude: &str) -> bool {
    exclude.contains(['*', '?', '['])
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum TarFolderError {
    #[error("Failed to {1}: {0}")]
    Io(#[source] io::Error, &'static str),

    #[error("Folder path {0:?} was not a directory")]
    NotDirectory(PathBuf),

    #[error("Folder path was invalid unicode")]
    NotUnicode,

    #[error("Folder path has no basename")]
    NoBasename,

    #[error("Failed to tar folder:\n{0}")]
    Tar(#[from] ToolError),
}
