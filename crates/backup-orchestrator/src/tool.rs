//! Invocation of the external archiving, dump and sync tools.
//!

use core::fmt;
use std::{io, process::Command};

use thiserror::Error;

/// An external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// The program to run, resolved through `PATH`.
    pub program: String,
    /// The program's arguments.
    pub args: Vec<String>,
}

impl ToolCommand {
    /// Create a command with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;

        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }

        Ok(())
    }
}

/// What an external tool produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// The exit code, `None` if the tool was killed by a signal.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: Vec<u8>,
    /// Captured standard error.
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    /// If the tool exited with status zero.
    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// Standard output as text.
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Standard error as text.
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    /// Turn a non-zero exit into an error.
    pub fn check(self, command: &ToolCommand) -> Result<Self, ToolError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ToolError::Exit {
                program: command.program.clone(),
                code: self.code,
                stderr: self.stderr_lossy().trim().to_string(),
            })
        }
    }
}

/// Runs external tools.
pub trait CommandRunner {
    /// Run a command to completion and capture its output.
    ///
    /// Only a failure to start the tool is an error, the exit status is left to the caller.
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ToolError>;

    /// Run a command and require that it exits successfully.
    fn run_checked(&self, command: &ToolCommand) -> Result<ToolOutput, ToolError> {
        self.run(command)?.check(command)
    }
}

/// Runs tools as child processes, blocking until they exit.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ToolError> {
        let output = Command::new(&command.program)
            .args(&command.args)
            .output()
            .map_err(|source| ToolError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        Ok(ToolOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {code:?}:\n{stderr}")]
    Exit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}
