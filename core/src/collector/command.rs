//! Process execution for the external utilities.

use std::process::{Command, Stdio};

use crate::prelude::{CollectorError, CollectorResult};

/// Captured result of one utility invocation.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: String,
    pub success: bool,
}

impl CommandOutput {
    /// Turn a non-zero exit into [`CollectorError::CommandFailed`].
    pub fn into_success(self, program: &str) -> CollectorResult<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(CollectorError::CommandFailed {
                program: program.to_string(),
                status: self.status,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Seam between the collector and the operating system.
pub trait CommandRunner {
    /// Run `program` to completion. Failing to start it is an error; a
    /// non-zero exit is reported through [`CommandOutput::success`].
    fn run(&self, program: &str, args: &[&str]) -> CollectorResult<CommandOutput>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> CollectorResult<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| CollectorError::Spawn {
                program: program.to_string(),
                source,
            })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.to_string(),
            success: output.status.success(),
        })
    }
}
