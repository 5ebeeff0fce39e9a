// aicommit-core/src/tools/handlers.rs

//! Handlers for the four tools. Each one builds a command line, runs it
//! through the shared [`CommandRunner`] and turns the captured output into a
//! [`ToolResult`].

use super::install::Installer;
use super::{ToolArgs, ToolHandler, ToolResult};
use crate::errors::AdapterError;
use crate::parser::parse_commit_output;
use crate::process::{CommandLine, CommandRunner};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// State shared by every handler.
pub struct HandlerContext {
    pub aicommit_bin: String,
    pub git_bin: String,
    pub runner: Arc<dyn CommandRunner>,
    pub installer: Installer,
}

/// `aicommit --dry-run ...`; `--add` when unstaged changes should be included.
pub fn generate_command(
    aicommit_bin: &str,
    staged_only: bool,
    verbose: bool,
    max_tokens: u64,
) -> CommandLine {
    CommandLine::new(aicommit_bin)
        .arg("--dry-run")
        .arg_if(!staged_only, "--add")
        .arg_if(verbose, "--verbose")
        .args(max_tokens_args(max_tokens))
}

pub fn execute_command(
    aicommit_bin: &str,
    add: bool,
    push: bool,
    pull: bool,
    verbose: bool,
    max_tokens: u64,
) -> CommandLine {
    CommandLine::new(aicommit_bin)
        .arg_if(add, "--add")
        .arg_if(push, "--push")
        .arg_if(pull, "--pull")
        .arg_if(verbose, "--verbose")
        .args(max_tokens_args(max_tokens))
}

pub fn status_command(git_bin: &str, verbose: bool) -> CommandLine {
    CommandLine::new(git_bin).arg("status").arg_if(!verbose, "--short")
}

pub fn list_providers_command(aicommit_bin: &str) -> CommandLine {
    CommandLine::new(aicommit_bin).arg("--list")
}

// A zero limit means "let aicommit decide".
fn max_tokens_args(max_tokens: u64) -> Vec<String> {
    if max_tokens > 0 {
        vec!["--max-tokens".to_string(), max_tokens.to_string()]
    } else {
        Vec::new()
    }
}

pub struct GenerateCommitMessage(pub Arc<HandlerContext>);

#[async_trait]
impl ToolHandler for GenerateCommitMessage {
    async fn call(&self, args: ToolArgs) -> Result<ToolResult, AdapterError> {
        let ctx = &self.0;
        ctx.installer.ensure_available().await?;

        let command = generate_command(
            &ctx.aicommit_bin,
            args.bool("staged_only")?,
            args.bool("verbose")?,
            args.u64("max_tokens")?,
        );
        let output = ctx.runner.run(&command).await?;

        if output.has_stderr() {
            warn!(command = %command, stderr = %output.stderr.trim(), "aicommit reported an error");
            return Ok(ToolResult::error(output.stderr));
        }
        let output = output.check_status(&command)?;

        let parsed = parse_commit_output(&output.stdout);
        info!(message = ?parsed.message, tokens = ?parsed.tokens, cost = ?parsed.cost, "Generated commit message");
        Ok(ToolResult::text(parsed.render()))
    }
}

pub struct ExecuteAicommit(pub Arc<HandlerContext>);

#[async_trait]
impl ToolHandler for ExecuteAicommit {
    async fn call(&self, args: ToolArgs) -> Result<ToolResult, AdapterError> {
        let ctx = &self.0;
        ctx.installer.ensure_available().await?;

        let command = execute_command(
            &ctx.aicommit_bin,
            args.bool("add")?,
            args.bool("push")?,
            args.bool("pull")?,
            args.bool("verbose")?,
            args.u64("max_tokens")?,
        );
        let output = ctx.runner.run(&command).await?.check_status(&command)?;
        info!(command = %command, "aicommit finished");

        let mut text = output.stdout.clone();
        if let Some(warnings) = output.stderr_text() {
            warn!(command = %command, stderr = %warnings, "aicommit succeeded with warnings");
            text.push_str("\n\nWarnings:\n");
            text.push_str(warnings);
        }
        Ok(ToolResult::text(text))
    }
}

pub struct GetGitStatus(pub Arc<HandlerContext>);

#[async_trait]
impl ToolHandler for GetGitStatus {
    async fn call(&self, args: ToolArgs) -> Result<ToolResult, AdapterError> {
        let ctx = &self.0;
        let command = status_command(&ctx.git_bin, args.bool("verbose")?);
        let output = ctx.runner.run(&command).await?;

        if output.has_stderr() {
            warn!(command = %command, stderr = %output.stderr.trim(), "git status reported an error");
            return Ok(ToolResult::error(output.stderr));
        }
        let output = output.check_status(&command)?;
        Ok(ToolResult::text(output.stdout.trim()))
    }
}

pub struct ListAicommitProviders(pub Arc<HandlerContext>);

#[async_trait]
impl ToolHandler for ListAicommitProviders {
    async fn call(&self, _args: ToolArgs) -> Result<ToolResult, AdapterError> {
        let ctx = &self.0;
        let command = list_providers_command(&ctx.aicommit_bin);
        let output = ctx.runner.run(&command).await?;

        if output.has_stderr() {
            warn!(command = %command, stderr = %output.stderr.trim(), "aicommit --list reported an error");
            return Ok(ToolResult::error(output.stderr));
        }
        let output = output.check_status(&command)?;
        Ok(ToolResult::text(output.stdout.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_command_always_dry_run() {
        let line = generate_command("aicommit", true, false, 50);
        assert_eq!(line.to_string(), "aicommit --dry-run --max-tokens 50");

        let line = generate_command("aicommit", false, true, 80);
        assert_eq!(line.to_string(), "aicommit --dry-run --add --verbose --max-tokens 80");
    }

    #[test]
    fn test_zero_max_tokens_is_omitted() {
        let line = generate_command("aicommit", true, false, 0);
        assert_eq!(line.to_string(), "aicommit --dry-run");
    }

    #[test]
    fn test_execute_command_flags_are_independent() {
        let line = execute_command("aicommit", true, true, false, false, 50);
        assert!(line.has_arg("--add"));
        assert!(line.has_arg("--push"));
        assert!(!line.has_arg("--pull"));
        assert!(!line.has_arg("--dry-run"));

        let line = execute_command("aicommit", false, false, true, true, 50);
        assert_eq!(line.to_string(), "aicommit --pull --verbose --max-tokens 50");
    }

    #[test]
    fn test_status_command() {
        assert_eq!(status_command("git", false).to_string(), "git status --short");
        assert_eq!(status_command("git", true).to_string(), "git status");
    }

    #[test]
    fn test_list_providers_command() {
        assert_eq!(list_providers_command("aicommit").to_string(), "aicommit --list");
    }
}
