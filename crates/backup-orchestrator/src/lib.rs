//! # backup-orchestrator
//! Backs up project files, folders and databases into a dated local tree, prunes old
//! backups and mirrors the tree to a remote host.
//!

pub mod archive;
pub mod cleanup;
pub mod config;
mod context;
pub mod mirror;
pub mod orchestrator;
pub mod tool;

pub use config::{Config, LoadConfigError};
pub use context::{Context, ProjectRun};
pub use orchestrator::{Orchestrator, ProjectError, ProjectReport, RunSummary, SetupError};
