// aicommit-core/src/config.rs

//! Server configuration, read once from the environment at startup.

use crate::errors::AdapterError;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_MAX_TOKENS: u64 = 50;
pub const DEFAULT_AICOMMIT_BIN: &str = "aicommit";
pub const DEFAULT_GIT_BIN: &str = "git";

pub const ENV_MAX_TOKENS: &str = "AICOMMIT_MAX_TOKENS";
pub const ENV_STAGED_ONLY: &str = "AICOMMIT_STAGED_ONLY";
pub const ENV_VERBOSE: &str = "AICOMMIT_VERBOSE";
pub const ENV_AUTO_INSTALL: &str = "AICOMMIT_AUTO_INSTALL";
pub const ENV_TIMEOUT_SECS: &str = "AICOMMIT_MCP_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Program used for every aicommit invocation.
    pub aicommit_bin: String,
    /// Program used for `get_git_status`.
    pub git_bin: String,
    pub max_tokens: u64,
    pub staged_only: bool,
    pub verbose: bool,
    /// Try to install aicommit when a tool call finds it missing.
    pub auto_install: bool,
    pub timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            aicommit_bin: DEFAULT_AICOMMIT_BIN.to_string(),
            git_bin: DEFAULT_GIT_BIN.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            staged_only: true,
            verbose: false,
            auto_install: false,
            timeout: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Bad values are
    /// logged and the default is kept.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_MAX_TOKENS) {
            match parse_u64(ENV_MAX_TOKENS, &raw) {
                Ok(value) => config.max_tokens = value,
                Err(e) => warn!(error = %e, "Ignoring {}", ENV_MAX_TOKENS),
            }
        }
        if let Some(raw) = lookup(ENV_STAGED_ONLY) {
            // Only the literal "false" turns staged-only off.
            config.staged_only = raw != "false";
        }
        if let Some(raw) = lookup(ENV_VERBOSE) {
            config.verbose = is_truthy(&raw);
        }
        if let Some(raw) = lookup(ENV_AUTO_INSTALL) {
            config.auto_install = is_truthy(&raw);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match parse_u64(ENV_TIMEOUT_SECS, &raw) {
                Ok(0) => config.timeout = None,
                Ok(secs) => config.timeout = Some(Duration::from_secs(secs)),
                Err(e) => warn!(error = %e, "Ignoring {}", ENV_TIMEOUT_SECS),
            }
        }

        info!(
            max_tokens = config.max_tokens,
            staged_only = config.staged_only,
            verbose = config.verbose,
            auto_install = config.auto_install,
            timeout = ?config.timeout,
            "Loaded server configuration"
        );
        config
    }

    pub fn with_aicommit_bin(mut self, bin: impl Into<String>) -> Self {
        self.aicommit_bin = bin.into();
        self
    }

    pub fn with_git_bin(mut self, bin: impl Into<String>) -> Self {
        self.git_bin = bin.into();
        self
    }
}

fn parse_u64(key: &str, raw: &str) -> Result<u64, AdapterError> {
    raw.trim().parse::<u64>().map_err(|e| {
        AdapterError::config(format!("'{}' is not a valid value for {}: {}", raw, key, e))
    })
}

fn is_truthy(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}
