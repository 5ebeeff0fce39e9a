// aicommit-core/src/errors.rs
use thiserror::Error;

/// Errors that can occur while serving a tool call.
///
/// None of these are fatal to the server: the registry converts every
/// variant into an error-flavored tool result.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// The external program could not be reached.
    #[error("{0}")]
    DependencyMissing(String),

    /// Tool arguments did not match the tool's parameter schema.
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Tool '{0}' not found")]
    ToolNotFound(String),

    /// The process could not be started at all.
    #[error("Failed to execute '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran but exited non-zero.
    #[error("Command '{command}' failed with exit code {status}")]
    CommandFailed {
        command: String,
        status: i32,
        stdout: String,
        stderr: String,
    },

    #[error("Command '{command}' timed out after {secs}s")]
    Timeout { command: String, secs: u64 },

    /// Error related to configuration loading.
    #[error("Configuration Error: {0}")]
    Config(String),
}

impl AdapterError {
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        AdapterError::InvalidParams(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        AdapterError::Config(msg.into())
    }

    /// Text reported back to the caller. Stderr and partial stdout of a
    /// failed command are appended so nothing the program printed is lost.
    pub fn to_result_message(&self) -> String {
        let mut message = self.to_string();
        if let AdapterError::CommandFailed { stdout, stderr, .. } = self {
            if !stderr.trim().is_empty() {
                message.push('\n');
                message.push_str(stderr.trim_end());
            }
            if !stdout.trim().is_empty() {
                message.push_str("\nOutput:\n");
                message.push_str(stdout.trim_end());
            }
        }
        message
    }
}
