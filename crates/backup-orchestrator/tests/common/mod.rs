//! # common
//!

#![allow(dead_code)]

use core::cell::RefCell;
use std::{
    fs,
    path::{Path, PathBuf},
};

use backup_orchestrator::tool::{CommandRunner, ToolCommand, ToolError, ToolOutput};
use chrono::{NaiveDate, NaiveDateTime};
use filetime::{FileTime, set_file_mtime};

/// Records every command and answers with a scripted output.
pub struct MockRunner {
    pub commands: RefCell<Vec<ToolCommand>>,
    responder: Box<dyn Fn(&ToolCommand) -> ToolOutput>,
}

impl MockRunner {
    pub fn new(responder: impl Fn(&ToolCommand) -> ToolOutput + 'static) -> Self {
        Self {
            commands: RefCell::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(|_| ok(""))
    }

    pub fn commands_for(&self, program: &str) -> Vec<ToolCommand> {
        self.commands
            .borrow()
            .iter()
            .filter(|command| command.program == program)
            .cloned()
            .collect()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ToolError> {
        self.commands.borrow_mut().push(command.clone());
        Ok((self.responder)(command))
    }
}

pub fn ok(stdout: &str) -> ToolOutput {
    ToolOutput {
        code: Some(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

pub fn failed(stderr: &str) -> ToolOutput {
    ToolOutput {
        code: Some(2),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// 2024-03-15 10:30:45
pub fn fixed_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(10, 30, 45)
        .unwrap()
}

/// Create a folder for each name, each one minute newer than the last.
pub fn create_dated_folders(directory: &Path, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let path = directory.join(name);
            fs::create_dir_all(&path).unwrap();
            fs::write(path.join("backup.sql.gz"), "contents").unwrap();

            let minutes = i64::try_from(index).unwrap() * 60;
            set_file_mtime(&path, FileTime::from_unix_time(1_700_000_000 + minutes, 0)).unwrap();

            path
        })
        .collect()
}

/// The sorted names of the subdirectories of a directory.
pub fn subdirectories(directory: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(directory)
        .unwrap()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().unwrap().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
