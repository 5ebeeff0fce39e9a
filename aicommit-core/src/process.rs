// aicommit-core/src/process.rs

//! Runs external programs and captures their output.
//!
//! This is the only place in the crate that spawns processes. Commands are
//! executed directly (no shell), inherit the server's environment, and have
//! stdout/stderr captured as lossily-decoded text.

use crate::errors::AdapterError;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// A program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends `arg` only when `enabled` is set.
    pub fn arg_if(self, enabled: bool, arg: impl Into<String>) -> Self {
        if enabled { self.arg(arg) } else { self }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// True if any argument equals `arg` exactly.
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Represents the structured output of an executed external command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    /// The exit status code of the command, `-1` if it was killed by a signal.
    pub status: i32,
    /// The captured standard output.
    pub stdout: String,
    /// The captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Checks if the command executed successfully (status code 0).
    pub fn success(&self) -> bool {
        self.status == 0
    }

    pub fn has_stderr(&self) -> bool {
        !self.stderr.is_empty()
    }

    /// Stderr with surrounding whitespace removed, or `None` if there is nothing in it.
    pub fn stderr_text(&self) -> Option<&str> {
        let trimmed = self.stderr.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Turns a non-zero exit into [`AdapterError::CommandFailed`], carrying
    /// whatever the command printed before it failed.
    pub fn check_status(self, command: &CommandLine) -> Result<Self, AdapterError> {
        if self.success() {
            Ok(self)
        } else {
            Err(AdapterError::CommandFailed {
                command: command.to_string(),
                status: self.status,
                stdout: self.stdout,
                stderr: self.stderr,
            })
        }
    }
}

/// Seam between tool handlers and the operating system.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &CommandLine) -> Result<CommandOutput, AdapterError>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    working_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every command in `dir` instead of the server's current directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &CommandLine) -> Result<CommandOutput, AdapterError> {
        info!(command = %command, working_dir = ?self.working_dir, "Executing command");

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let output = match self.timeout {
            Some(limit) => {
                cmd.kill_on_drop(true);
                match tokio::time::timeout(limit, cmd.output()).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(command = %command, secs = limit.as_secs(), "Command timed out");
                        return Err(AdapterError::Timeout {
                            command: command.to_string(),
                            secs: limit.as_secs(),
                        });
                    }
                }
            }
            None => cmd.output().await,
        }
        .map_err(|source| {
            warn!(command = %command, error = %source, "Failed to spawn command process");
            AdapterError::Spawn {
                command: command.to_string(),
                source,
            }
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let status = output.status.code().unwrap_or(-1);

        debug!(
            "{} exit status: {}\nStdout preview (first 3 lines):\n{}\nStderr preview (first 3 lines):\n{}",
            command,
            status,
            stdout.lines().take(3).collect::<Vec<_>>().join("\n"),
            stderr.lines().take(3).collect::<Vec<_>>().join("\n")
        );

        Ok(CommandOutput {
            status,
            stdout,
            stderr,
        })
    }
}
