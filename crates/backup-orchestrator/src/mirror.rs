//! Mirror local folders to the remote host.
//!

use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::{
    Context,
    config::RsyncConfig,
    tool::{CommandRunner, ToolCommand, ToolError, ToolOutput},
};

/// Copies local folders to `<rsync destination>/<folder name>` with `rsync`.
pub struct Mirror<'a> {
    config: &'a RsyncConfig,
    runner: &'a dyn CommandRunner,
}

impl<'a> Mirror<'a> {
    /// Create a mirror for the remote host in `config`.
    pub fn new(config: &'a RsyncConfig, runner: &'a dyn CommandRunner) -> Self {
        Self { config, runner }
    }

    /// Mirror `source` to the remote host.
    ///
    /// The remote folder is `remote_name`, or the basename of `source` when absent.
    pub fn mirror(
        &self,
        context: &mut Context,
        source: &Path,
        excludes: &[String],
        remote_name: Option<&str>,
    ) -> Result<ToolOutput, MirrorError> {
        context.current_context = "Remote";

        let command = self.command(source, excludes, remote_name)?;

        info!(
            "{context}Backing up {source:?} to remote server {}",
            self.config.destination
        );
        info!("{context}{command}");

        let output = self.runner.run_checked(&command)?;

        let transfer_log = output.stdout_lossy();
        if !transfer_log.trim().is_empty() {
            info!("{context}{}", transfer_log.trim_end());
        }

        Ok(output)
    }

    /// Build the `rsync` invocation for `source`.
    pub fn command(
        &self,
        source: &Path,
        excludes: &[String],
        remote_name: Option<&str>,
    ) -> Result<ToolCommand, MirrorError> {
        let folder = match remote_name {
            Some(name) => name,
            None => source
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or(MirrorError::NoFolderName)?,
        };

        let source = source.to_str().ok_or(MirrorError::NotUnicode)?;
        let source = format!("{}/", source.trim_end_matches('/'));
        let destination = format!(
            "{}/{folder}",
            self.config.destination.trim_end_matches('/')
        );

        let mut command = ToolCommand::new("rsync").arg("-Atrav");

        if let Some(pem) = &self.config.pem {
            let pem = pem.to_str().ok_or(MirrorError::NotUnicode)?;
            command = command.args(["-e".to_string(), format!("ssh -i {pem}")]);
        }

        for exclude in self.config.excludes.iter().chain(excludes) {
            command = command.args(["--exclude", exclude.as_str()]);
        }

        Ok(command.args([source, destination]))
    }
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Source path has no folder name, a remote name is required")]
    NoFolderName,

    #[error("Path was invalid unicode")]
    NotUnicode,

    #[error("Failed to sync to the remote host:\n{0}")]
    Sync(#[from] ToolError),
}
