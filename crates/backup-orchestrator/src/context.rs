//! Context for the current project, and the run state computed for it.
//!

use core::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::config::Keep;

/// Holds the context for the current work. Used for prefixing logs.
#[derive(Default, Debug)]
pub struct Context {
    /// The project being backed up.
    pub project: Option<String>,
    /// The current context
    pub current_context: &'static str,
}

impl Context {
    /// Create a context for a project.
    pub fn for_project(project: &str) -> Self {
        Self {
            project: Some(project.to_string()),
            current_context: "",
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(project) = &self.project {
            write!(f, "[{project}] ")?;
        }

        if !self.current_context.is_empty() {
            write!(f, "[{}] ", self.current_context)?;
        }

        Ok(())
    }
}

/// Where a project's backup goes for this run, and how much history to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRun {
    /// The project name.
    pub name: String,

    /// `<root>/<project>/<year>`, holds the month folders.
    pub year_directory: PathBuf,

    /// `<root>/<project>/<year>/<month>`, holds the day folders.
    pub month_directory: PathBuf,

    /// `<root>/<project>/<year>/<month>/<day-hour-minute-second>`.
    pub destination: PathBuf,

    /// The resolved retention for the project.
    pub keep: Keep,
}

impl ProjectRun {
    /// Compute the run state for a project at the instant `now`.
    pub fn new(root: &Path, name: &str, keep: Keep, now: NaiveDateTime) -> Self {
        let year_directory = root.join(name).join(now.format("%Y").to_string());
        let month_directory = year_directory.join(now.format("%m").to_string());
        let destination = month_directory.join(now.format("%d-%H-%M-%S").to_string());

        Self {
            name: name.to_string(),
            year_directory,
            month_directory,
            destination,
            keep,
        }
    }
}
