//! Backup orchestrator config
//!

use std::{collections::BTreeMap, fs, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The number of month and day folders to retain for a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keep {
    /// Month folders to keep inside a project's year folder.
    pub month: u32,

    /// Day folders to keep inside a project's month folder.
    pub days: u32,
}

impl Default for Keep {
    fn default() -> Self {
        Self { month: 3, days: 7 }
    }
}

/// A project's retention override, any key that is absent falls back to the global default.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeepOverride {
    /// Overrides [`Keep::month`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,

    /// Overrides [`Keep::days`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
}

impl KeepOverride {
    /// Apply this override on top of the defaults, key by key.
    pub fn resolve(&self, defaults: Keep) -> Keep {
        Keep {
            month: self.month.unwrap_or(defaults.month),
            days: self.days.unwrap_or(defaults.days),
        }
    }
}

/// A folder to archive or mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderSpec {
    /// The folder's path.
    pub path: PathBuf,

    /// Patterns excluded from the archive or sync.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<String>,
}

/// An entry of a project's `folders` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEntry {
    /// The folder to archive.
    pub folder: FolderSpec,
}

/// A folder mirrored to the remote host on its own, outside of any project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFolder {
    /// The remote folder name, defaults to the basename of the folder's path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The folder to mirror.
    pub folder: FolderSpec,
}

/// How `mongodump` writes its output.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MongoOutput {
    /// A directory tree per database.
    #[default]
    #[serde(alias = "out")]
    Directory,

    /// A single archive file per database.
    Archive,
}

/// The document store databases of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MongodbConfig {
    /// The server host.
    #[serde(default = "MongodbConfig::default_host")]
    pub host: String,

    /// The server port.
    #[serde(default = "MongodbConfig::default_port")]
    pub port: u16,

    /// The username, only used together with `pwd`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usr: Option<String>,

    /// The password, only used together with `usr`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pwd: Option<String>,

    /// The database holding the user's credentials.
    #[serde(
        default,
        rename = "authenticationDatabase",
        skip_serializing_if = "Option::is_none"
    )]
    pub authentication_database: Option<String>,

    /// The client key file, enables TLS when present.
    #[serde(
        default,
        rename = "sslPEMKeyFile",
        skip_serializing_if = "Option::is_none"
    )]
    pub ssl_pem_key_file: Option<PathBuf>,

    /// The dump output mode.
    #[serde(default)]
    pub output: MongoOutput,

    /// The databases to dump.
    #[serde(default)]
    pub names: Vec<String>,
}

impl MongodbConfig {
    fn default_host() -> String {
        "localhost".to_string()
    }

    fn default_port() -> u16 {
        27017
    }
}

/// The relational databases of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabasesConfig {
    /// The username.
    pub usr: String,

    /// The password.
    pub pwd: String,

    /// The databases to dump.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<Vec<String>>,

    /// Dump every database on the server whose name starts with this prefix.
    /// Takes precedence over `names`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

/// What to back up for a project, any absent key is skipped.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Glob patterns of files to copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,

    /// Folders to archive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folders: Option<Vec<FolderEntry>>,

    /// Document store databases to dump.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mongodbs: Option<MongodbConfig>,

    /// Relational databases to dump.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub databases: Option<DatabasesConfig>,

    /// Retention override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep: Option<KeepOverride>,
}

impl ProjectConfig {
    /// The project's retention after applying its override to the defaults.
    pub fn keep(&self, defaults: Keep) -> Keep {
        self.keep
            .map(|keep| keep.resolve(defaults))
            .unwrap_or(defaults)
    }
}

/// The remote host backups are mirrored to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsyncConfig {
    /// The remote destination, e.g. `user@host:/backups`.
    pub destination: String,

    /// The private key used for the ssh transport.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pem: Option<PathBuf>,

    /// Patterns excluded from every sync.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<String>,
}

/// The orchestrator's config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// The root of the local backup tree.
    pub destination: PathBuf,

    /// The default retention.
    #[serde(default)]
    pub keep: Keep,

    /// The remote host, mirroring is skipped when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsync: Option<RsyncConfig>,

    /// Folders mirrored to the remote host outside of any project.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rsyncs: Vec<RemoteFolder>,

    /// The projects, ordered by name.
    #[serde(default)]
    pub projects: BTreeMap<String, ProjectConfig>,
}

impl Config {
    /// Tries to load a config from a file.
    ///
    /// Files ending in `yml`, `yaml` or `conf` are read as YAML, everything else as TOML.
    pub fn load(file_path: PathBuf) -> Result<Self, LoadConfigError> {
        if !file_path.exists() {
            return Err(LoadConfigError::NoFile(file_path));
        }

        let is_yaml = file_path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| matches!(extension, "yml" | "yaml" | "conf"));

        let contents = fs::read_to_string(&file_path).map_err(LoadConfigError::Read)?;

        if is_yaml {
            Self::from_yaml(&contents)
        } else {
            Self::from_toml(&contents)
        }
    }

    /// Parse a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self, LoadConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Parse a YAML document.
    pub fn from_yaml(contents: &str) -> Result<Self, LoadConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        let example = ProjectConfig {
            files: Some(vec!["/etc/example/*.conf".to_string()]),
            folders: Some(vec![FolderEntry {
                folder: FolderSpec {
                    path: PathBuf::from("/srv/example"),
                    excludes: vec!["*.log".to_string()],
                },
            }]),
            mongodbs: None,
            databases: Some(DatabasesConfig {
                usr: "backup".to_string(),
                pwd: "change-me".to_string(),
                names: None,
                prefix: Some("example_".to_string()),
            }),
            keep: Some(KeepOverride {
                month: None,
                days: Some(14),
            }),
        };

        Self {
            destination: PathBuf::from("/var/backups/projects"),
            keep: Keep::default(),
            rsync: None,
            rsyncs: Vec::new(),
            projects: BTreeMap::from([("example".to_string(), example)]),
        }
    }
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("The file {0:?} does not exist.")]
    NoFile(PathBuf),

    #[error("Failed to read the file:\n{0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to deserialize the file:\n{0}")]
    DeserializeToml(#[from] toml::de::Error),

    #[error("Failed to deserialize the file:\n{0}")]
    DeserializeYaml(#[from] serde_yaml::Error),
}
