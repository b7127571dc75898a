//! # backup-orchestrator
//! Runs one backup of every configured project, intended to be started by a scheduler.
//!

use std::{
    fs,
    path::{Path, PathBuf},
};

use backup_orchestrator::{Config, Orchestrator, tool::SystemRunner};
use chrono::Local;
use mimalloc::MiMalloc;
use shared::{Failure, init_logger};
use tracing::{error, info, warn};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const CONFIG_FILE: &str = "./config.toml";

fn main() {
    let _logger = match init_logger(Path::new("./logs"), "backup") {
        Ok(guards) => guards,
        Err(error) => {
            eprintln!("Could not initialize logger: {error}");
            Vec::new()
        }
    };

    // Initialize config if args include 'init'.
    if std::env::args().any(|arg| arg.eq("init")) {
        let config = Config::default();
        let contents =
            toml::to_string_pretty(&config).or_log_and_panic("Could not serialize config file");
        fs::write(CONFIG_FILE, contents).or_log_and_panic("Could not create config file");
        return;
    }

    info!(
        "Backup started ({})",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    run();

    info!(
        "Backup completed ({})",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
}

fn run() {
    // Load config
    let Some(config) = Config::load(PathBuf::from(CONFIG_FILE)).or_log("Could not load config")
    else {
        return;
    };

    let runner = SystemRunner;
    let orchestrator = Orchestrator::new(config, &runner);

    let Some(summary) = orchestrator.run().or_log("Could not set up the backup") else {
        return;
    };

    for report in &summary.projects {
        if report.failed_items > 0 {
            warn!(
                "[{}] Backed up to {:?} with {} failed items",
                report.name, report.destination, report.failed_items
            );
        } else {
            info!("[{}] Backed up to {:?}", report.name, report.destination);
        }
    }

    for (project, error) in &summary.failed_projects {
        error!("[{project}] Not backed up: {error}");
    }
}
