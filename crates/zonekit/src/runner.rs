//! Command execution seam for backends that drive external tools.

use crate::error::{BackendError, Result};
use std::process::{Command, Output};

/// Output from a backend command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            code: output.status.code(),
        }
    }
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Get stdout as a string
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as a string
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }
}

/// Runs a program with arguments and captures its output.
///
/// Implementations must not interpret the exit status; callers decide what
/// a non-zero code means.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

/// Runner backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        log::trace!("exec: {} {}", program, args.join(" "));
        let output = Command::new(program).args(args).output().map_err(|e| {
            BackendError::Unavailable(format!("failed to execute {program}: {e}"))
        })?;
        let output = CommandOutput::from(output);
        log::trace!(
            "exit {:?}, stdout: {:?}",
            output.code,
            output.stdout_str().trim()
        );
        Ok(output)
    }
}

/// Render a command line for messages.
pub fn display_command(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}
