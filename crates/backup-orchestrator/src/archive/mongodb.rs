use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::{
    Context,
    config::{MongoOutput, MongodbConfig},
    tool::{ToolCommand, ToolError},
};

use super::Archiver;

impl Archiver<'_> {
    /// Dump one document store database into `destination` with `mongodump`.
    ///
    /// Returns the archive file or dump directory that was written.
    pub fn dump_mongodb(
        &self,
        context: &mut Context,
        mongodb: &MongodbConfig,
        database: &str,
        destination: &Path,
    ) -> Result<PathBuf, MongodumpError> {
        context.current_context = "Mongodb";
        info!("{context}Backing up mongodb {database} to {destination:?}");

        let (command, output) = mongodump_command(mongodb, database, destination)?;
        self.runner.run_checked(&command)?;

        Ok(output)
    }
}

/// Build the `mongodump` invocation for a database and the path it will write.
pub fn mongodump_command(
    mongodb: &MongodbConfig,
    database: &str,
    destination: &Path,
) -> Result<(ToolCommand, PathBuf), MongodumpError> {
    let mut command = ToolCommand::new("mongodump")
        .args(["--host", mongodb.host.as_str()])
        .args(["--port".to_string(), mongodb.port.to_string()]);

    if let (Some(usr), Some(pwd)) = (&mongodb.usr, &mongodb.pwd) {
        command = command.args(["--username", usr.as_str(), "--password", pwd.as_str()]);
    }

    if let Some(authentication_database) = &mongodb.authentication_database {
        command = command.args([
            "--authenticationDatabase",
            authentication_database.as_str(),
        ]);
    }

    if let Some(key_file) = &mongodb.ssl_pem_key_file {
        let key_file = key_file.to_str().ok_or(MongodumpError::NotUnicode)?;
        command = command.args(["--ssl", "--sslPEMKeyFile", key_file]);
    }

    let output = match mongodb.output {
        MongoOutput::Archive => destination.join(format!("{database}.tar.gz")),
        MongoOutput::Directory => destination.join(database),
    };
    let output_str = output.to_str().ok_or(MongodumpError::NotUnicode)?;
    let output_arg = match mongodb.output {
        MongoOutput::Archive => format!("--archive={output_str}"),
        MongoOutput::Directory => format!("--out={output_str}"),
    };

    let command = command
        .arg(output_arg)
        .arg("--gzip")
        .args(["--db", database]);

    Ok((command, output))
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum MongodumpError {
    #[error("Path was invalid unicode")]
    NotUnicode,

    #[error("Failed to dump database:\n{0}")]
    Dump(#[from] ToolError),
}
