//! Drives a backup run across every configured project.
//!

use std::{fs, io, path::PathBuf};

use chrono::{Local, NaiveDateTime};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    Context, ProjectRun,
    archive::Archiver,
    cleanup::{CleanupError, cleanup},
    config::{Config, ProjectConfig},
    mirror::{Mirror, MirrorError},
    tool::CommandRunner,
};

/// What happened to a project during a run.
#[derive(Debug)]
pub struct ProjectReport {
    /// The project name.
    pub name: String,
    /// The folder this run's backup was written to.
    pub destination: PathBuf,
    /// Month and day folders removed by retention.
    pub removed: Vec<PathBuf>,
    /// The number of backup items or stale folders that failed.
    pub failed_items: usize,
}

/// The outcome of a whole run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Projects whose pipeline ran to the end.
    pub projects: Vec<ProjectReport>,
    /// Projects whose pipeline was cut short.
    pub failed_projects: Vec<(String, ProjectError)>,
    /// Standalone remote folders that could not be mirrored.
    pub failed_remote_folders: Vec<(PathBuf, MirrorError)>,
}

/// Runs the backup of every project, one after another.
pub struct Orchestrator<'a> {
    config: Config,
    runner: &'a dyn CommandRunner,
    clock: Box<dyn Fn() -> NaiveDateTime + 'a>,
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator that reads the local clock.
    pub fn new(config: Config, runner: &'a dyn CommandRunner) -> Self {
        Self {
            config,
            runner,
            clock: Box::new(|| Local::now().naive_local()),
        }
    }

    /// Replace the clock used to timestamp destination folders.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + 'a) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Back up every project.
    ///
    /// Only a failure to prepare the backup root stops the run, a failing project is logged
    /// and the next one is backed up.
    pub fn run(&self) -> Result<RunSummary, SetupError> {
        let projects = self.setup()?;

        let mut summary = RunSummary {
            failed_remote_folders: self.mirror_remote_folders(),
            ..RunSummary::default()
        };

        for run in &projects {
            let Some(project) = self.config.projects.get(&run.name) else {
                continue;
            };

            info!("Backing up {}...", run.name);

            match self.backup_project(run, project) {
                Ok(report) => summary.projects.push(report),
                Err(error) => {
                    error!("[{}] Backup failed: {error}", run.name);
                    summary.failed_projects.push((run.name.clone(), error));
                }
            }
        }

        Ok(summary)
    }

    /// Create the backup root and compute where each project's backup goes.
    ///
    /// Each project reads the clock on its own, so later projects may get later
    /// timestamps. The projects' folders are not created here.
    pub fn setup(&self) -> Result<Vec<ProjectRun>, SetupError> {
        fs::create_dir_all(&self.config.destination)
            .map_err(|e| SetupError::CreateRoot(self.config.destination.clone(), e))?;

        let projects = self
            .config
            .projects
            .iter()
            .map(|(name, project)| {
                ProjectRun::new(
                    &self.config.destination,
                    name,
                    project.keep(self.config.keep),
                    (self.clock)(),
                )
            })
            .collect();

        Ok(projects)
    }

    /// Mirror the standalone folders to the remote host, returning the ones that failed.
    pub fn mirror_remote_folders(&self) -> Vec<(PathBuf, MirrorError)> {
        let Some(rsync) = &self.config.rsync else {
            return Vec::new();
        };
        let mirror = Mirror::new(rsync, self.runner);

        let mut failed = Vec::new();
        for remote in &self.config.rsyncs {
            let mut context = Context::default();

            if let Err(error) = mirror.mirror(
                &mut context,
                &remote.folder.path,
                &remote.folder.excludes,
                remote.name.as_deref(),
            ) {
                error!("{context}Could not mirror {:?}: {error}", remote.folder.path);
                failed.push((remote.folder.path.clone(), error));
            }
        }

        failed
    }

    /// Run a project's pipeline: retention, then this run's folder, then each backup type,
    /// then the remote mirror.
    ///
    /// Retention always runs before this run's folder exists, so it can never be removed
    /// by its own run.
    pub fn backup_project(
        &self,
        run: &ProjectRun,
        project: &ProjectConfig,
    ) -> Result<ProjectReport, ProjectError> {
        let mut context = Context::for_project(&run.name);
        let mut report = ProjectReport {
            name: run.name.clone(),
            destination: run.destination.clone(),
            removed: Vec::new(),
            failed_items: 0,
        };

        // Retention
        for (directory, keep) in [
            (&run.year_directory, run.keep.month),
            (&run.month_directory, run.keep.days),
        ] {
            let cleaned = cleanup(&mut context, directory, keep)?;
            report.removed.extend(cleaned.removed);
            report.failed_items += cleaned.failed.len();
        }

        // This run's folder
        context.current_context = "Setup";
        fs::create_dir_all(&run.destination)
            .map_err(|e| ProjectError::CreateDestination(run.destination.clone(), e))?;

        let archiver = Archiver::new(self.runner);

        if let Some(files) = &project.files {
            for pattern in files {
                match archiver.copy_files(&mut context, pattern, &run.destination) {
                    Ok(files) if files.copied == 0 && files.failed == 0 => {
                        warn!("{context}No files matched {pattern}");
                    }
                    Ok(files) => {
                        info!(
                            "{context}Copied {} files matching {pattern}",
                            files.copied
                        );
                        report.failed_items += files.failed;
                    }
                    Err(error) => {
                        error!("{context}Could not back up files {pattern}: {error}");
                        report.failed_items += 1;
                    }
                }
            }
        }

        if let Some(folders) = &project.folders {
            for entry in folders {
                if let Err(error) =
                    archiver.tar_folder(&mut context, &entry.folder, &run.destination)
                {
                    error!("{context}Failed to tar {:?}: {error}", entry.folder.path);
                    report.failed_items += 1;
                }
            }
        }

        if let Some(mongodbs) = &project.mongodbs {
            let mut names = mongodbs.names.clone();
            names.sort();

            for name in &names {
                if let Err(error) =
                    archiver.dump_mongodb(&mut context, mongodbs, name, &run.destination)
                {
                    error!("{context}Could not back up mongodb {name}: {error}");
                    report.failed_items += 1;
                }
            }
        }

        if let Some(databases) = &project.databases {
            match archiver.resolve_databases(&mut context, databases) {
                Ok(names) => {
                    for name in &names {
                        if let Err(error) =
                            archiver.dump_database(&mut context, databases, name, &run.destination)
                        {
                            error!("{context}Could not back up database {name}: {error}");
                            report.failed_items += 1;
                        }
                    }
                }
                Err(error) => {
                    error!("{context}Could not list databases: {error}");
                    report.failed_items += 1;
                }
            }
        }

        if let Some(rsync) = &self.config.rsync {
            if let Err(source) = Mirror::new(rsync, self.runner).mirror(
                &mut context,
                &run.destination,
                &[],
                Some(run.name.as_str()),
            ) {
                return Err(ProjectError::Mirror {
                    source,
                    report: Box::new(report),
                });
            }
        }

        Ok(report)
    }
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Failed to create backup root {0:?}: {1}")]
    CreateRoot(PathBuf, #[source] io::Error),
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Failed to clean up old backups:\n{0}")]
    Cleanup(#[from] CleanupError),

    #[error("Failed to create destination {0:?}: {1}")]
    CreateDestination(PathBuf, #[source] io::Error),

    #[error("Failed to mirror to the remote host:\n{source}")]
    Mirror {
        source: MirrorError,
        /// The local backup, which completed before the mirror failed.
        report: Box<ProjectReport>,
    },
}
