use std::{
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
};

use flate2::{Compression, write::GzEncoder};
use thiserror::Error;
use tracing::info;

use crate::{
    Context,
    config::DatabasesConfig,
    tool::{ToolCommand, ToolError},
};

use super::Archiver;

impl Archiver<'_> {
    /// The databases to dump, sorted by name.
    ///
    /// With a prefix the server's catalog is queried and only names starting with the prefix
    /// are kept, otherwise the configured names are used.
    pub fn resolve_databases(
        &self,
        context: &mut Context,
        databases: &DatabasesConfig,
    ) -> Result<Vec<String>, MysqlError> {
        context.current_context = "Databases";

        let mut names = match (&databases.prefix, &databases.names) {
            (Some(prefix), _) => {
                let command = list_databases_command(databases, prefix);
                let output = self.runner.run_checked(&command)?;

                let names: Vec<String> = output
                    .stdout_lossy()
                    .lines()
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .filter(|name| prefix.contains('%') || name.starts_with(prefix.as_str()))
                    .map(str::to_string)
                    .collect();

                info!("{context}Found {} databases matching {prefix}", names.len());

                names
            }
            (None, Some(names)) => names.clone(),
            (None, None) => return Err(MysqlError::NoDatabases),
        };

        names.sort();
        names.dedup();

        Ok(names)
    }

    /// Dump a database with `mysqldump` into `<destination>/<basename>.sql.gz`.
    pub fn dump_database(
        &self,
        context: &mut Context,
        databases: &DatabasesConfig,
        database: &str,
        destination: &Path,
    ) -> Result<PathBuf, MysqlError> {
        context.current_context = "Databases";
        info!("{context}Backing up database {database} to {destination:?}");

        let basename = Path::new(database)
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| MysqlError::InvalidName(database.to_string()))?;
        let backup_file = destination.join(format!("{basename}.sql.gz"));

        let command = ToolCommand::new("mysqldump").args([
            "-u".to_string(),
            databases.usr.clone(),
            format!("-p{}", databases.pwd),
            database.to_string(),
        ]);
        let output = self.runner.run_checked(&command)?;

        let file = File::create(&backup_file).map_err(|e| MysqlError::Io(e, "create dump file"))?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder
            .write_all(&output.stdout)
            .map_err(|e| MysqlError::Io(e, "write dump file"))?;
        encoder
            .finish()
            .map_err(|e| MysqlError::Io(e, "finish dump file"))?;

        Ok(backup_file)
    }
}

/// The `mysql` query listing databases that start with `prefix`.
///
/// A prefix that already holds a `%` wildcard is used as the whole `LIKE` pattern. Otherwise
/// `_` in the prefix still matches any character, so the catalog is filtered again by
/// [`Archiver::resolve_databases`].
pub fn list_databases_command(databases: &DatabasesConfig, prefix: &str) -> ToolCommand {
    let pattern = if prefix.contains('%') {
        prefix.to_string()
    } else {
        format!("{prefix}%")
    };

    ToolCommand::new("mysql").args([
        "-u".to_string(),
        databases.usr.clone(),
        format!("-p{}", databases.pwd),
        "-B".to_string(),
        "-N".to_string(),
        "-e".to_string(),
        format!("SHOW DATABASES LIKE '{pattern}'"),
    ])
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum MysqlError {
    #[error("Neither names nor a prefix were configured")]
    NoDatabases,

    #[error("Database name '{0}' has no basename")]
    InvalidName(String),

    #[error("Failed to {1}: {0}")]
    Io(#[source] io::Error, &'static str),

    #[error("Failed to run mysql tool:\n{0}")]
    Tool(#[from] ToolError),
}
