// aicommit-core/src/tools/install.rs

//! Lazy check that the aicommit CLI is reachable, with optional auto-install.
//!
//! The check only runs when a tool that needs aicommit is called, so tool
//! discovery works on machines where it is not installed yet.

use crate::errors::AdapterError;
use crate::process::{CommandLine, CommandRunner};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub const INSTALL_HINT: &str = "aicommit CLI is not installed. Please run \"npm install -g @suenot/aicommit\" or \"cargo install aicommit\" to install it.";

/// Install commands tried in order when auto-install is enabled.
fn install_commands() -> Vec<CommandLine> {
    vec![
        CommandLine::new("npm").args(["install", "-g", "@suenot/aicommit"]),
        CommandLine::new("cargo").args(["install", "aicommit"]),
    ]
}

pub struct Installer {
    aicommit_bin: String,
    auto_install: bool,
    runner: Arc<dyn CommandRunner>,
    // Serializes install attempts from concurrent tool calls.
    install_lock: Mutex<()>,
}

impl Installer {
    pub fn new(aicommit_bin: impl Into<String>, auto_install: bool, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            aicommit_bin: aicommit_bin.into(),
            auto_install,
            runner,
            install_lock: Mutex::new(()),
        }
    }

    /// Runs `aicommit --version`. Returns the reported version, or `None` if
    /// the program could not be started or exited non-zero.
    pub async fn detect_version(&self) -> Option<String> {
        let command = CommandLine::new(&self.aicommit_bin).arg("--version");
        match self.runner.run(&command).await {
            Ok(output) if output.success() => Some(output.stdout.trim().to_string()),
            Ok(output) => {
                warn!(status = output.status, stderr = %output.stderr.trim(), "aicommit --version failed");
                None
            }
            Err(e) => {
                warn!(error = %e, "aicommit is not reachable");
                None
            }
        }
    }

    /// Succeeds if aicommit can be run, installing it first when allowed.
    pub async fn ensure_available(&self) -> Result<(), AdapterError> {
        if self.detect_version().await.is_some() {
            return Ok(());
        }
        if !self.auto_install {
            return Err(AdapterError::DependencyMissing(INSTALL_HINT.to_string()));
        }

        let _guard = self.install_lock.lock().await;
        // Another call may have finished installing while we waited.
        if self.detect_version().await.is_some() {
            return Ok(());
        }

        for command in install_commands() {
            info!(command = %command, "Attempting to install aicommit");
            match self.runner.run(&command).await {
                Ok(output) if output.success() => {
                    if let Some(version) = self.detect_version().await {
                        info!(%version, "Installed aicommit");
                        return Ok(());
                    }
                }
                Ok(output) => {
                    warn!(command = %command, status = output.status, stderr = %output.stderr.trim(), "Install attempt failed")
                }
                Err(e) => warn!(command = %command, error = %e, "Install attempt failed"),
            }
        }

        Err(AdapterError::DependencyMissing(INSTALL_HINT.to_string()))
    }
}
