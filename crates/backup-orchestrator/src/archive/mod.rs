//! Producers of the backup artifacts in a project's destination folder.
//!

use std::path::{Component, Path, PathBuf};

use crate::tool::CommandRunner;

mod files;
mod folders;
mod mongodb;
mod mysql;

pub use files::{CopiedFiles, CopyFilesError};
pub use folders::TarFolderError;
pub use mongodb::{MongodumpError, mongodump_command};
pub use mysql::{MysqlError, list_databases_command};

/// Writes files, folder archives and database dumps into a destination folder.
pub struct Archiver<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> Archiver<'a> {
    /// Create an archiver that invokes external tools through `runner`.
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }
}

/// The path of `source` re-rooted under `destination`.
///
/// `/etc/app/app.conf` under `/backups/run` becomes `/backups/run/etc/app/app.conf`. Parent
/// and current directory components are dropped so the result never leaves `destination`.
pub fn mirror_path(destination: &Path, source: &Path) -> PathBuf {
    let relative: PathBuf = source
        .components()
        .filter(|component| matches!(component, Component::Normal(_)))
        .collect();

    destination.join(relative)
}
