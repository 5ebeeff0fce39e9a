// aicommit-core/src/tools/registry.rs

use super::handlers::{
    ExecuteAicommit, GenerateCommitMessage, GetGitStatus, HandlerContext, ListAicommitProviders,
};
use super::install::Installer;
use super::{ToolDefinition, ToolParameter, ToolParametersDefinition, ToolResult};
use crate::config::ServerConfig;
use crate::errors::AdapterError;
use crate::process::CommandRunner;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const GENERATE_COMMIT_MESSAGE: &str = "generate_commit_message";
pub const EXECUTE_AICOMMIT: &str = "execute_aicommit";
pub const GET_GIT_STATUS: &str = "get_git_status";
pub const LIST_AICOMMIT_PROVIDERS: &str = "list_aicommit_providers";

/// Fixed set of tools, built once at startup.
#[derive(Debug)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
}

impl ToolRegistry {
    pub fn new(config: &ServerConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let ctx = Arc::new(HandlerContext {
            aicommit_bin: config.aicommit_bin.clone(),
            git_bin: config.git_bin.clone(),
            installer: Installer::new(&config.aicommit_bin, config.auto_install, runner.clone()),
            runner,
        });

        let tools = vec![
            ToolDefinition {
                name: GENERATE_COMMIT_MESSAGE.to_string(),
                description: "Generate a commit message for the current git changes".to_string(),
                parameters: ToolParametersDefinition::new(vec![
                    (
                        "staged_only",
                        ToolParameter::boolean(
                            "Whether to only consider staged changes (true) or all changes (false)",
                            config.staged_only,
                        ),
                    ),
                    (
                        "verbose",
                        ToolParameter::boolean(
                            "Show detailed information about the execution",
                            config.verbose,
                        ),
                    ),
                    (
                        "max_tokens",
                        ToolParameter::integer(
                            "Maximum number of tokens in the generated commit message",
                            config.max_tokens,
                        ),
                    ),
                ]),
                handler: Arc::new(GenerateCommitMessage(ctx.clone())),
            },
            ToolDefinition {
                name: EXECUTE_AICOMMIT.to_string(),
                description: "Generate AI commit message and create the commit in one step"
                    .to_string(),
                parameters: ToolParametersDefinition::new(vec![
                    (
                        "add",
                        ToolParameter::boolean("Whether to stage all changes before committing", false),
                    ),
                    ("push", ToolParameter::boolean("Whether to push after committing", false)),
                    ("pull", ToolParameter::boolean("Whether to pull before committing", false)),
                    ("verbose", ToolParameter::boolean("Show detailed information", config.verbose)),
                    (
                        "max_tokens",
                        ToolParameter::integer(
                            "Maximum number of tokens for the generated commit message",
                            config.max_tokens,
                        ),
                    ),
                ]),
                handler: Arc::new(ExecuteAicommit(ctx.clone())),
            },
            ToolDefinition {
                name: GET_GIT_STATUS.to_string(),
                description: "Get the current git status of the repository".to_string(),
                parameters: ToolParametersDefinition::new(vec![(
                    "verbose",
                    ToolParameter::boolean("Whether to show detailed status information", false),
                )]),
                handler: Arc::new(GetGitStatus(ctx.clone())),
            },
            ToolDefinition {
                name: LIST_AICOMMIT_PROVIDERS.to_string(),
                description: "List configured LLM providers for aicommit".to_string(),
                parameters: ToolParametersDefinition::new(Vec::new()),
                handler: Arc::new(ListAicommitProviders(ctx)),
            },
        ];

        info!(count = tools.len(), "Registered tools");
        Self { tools }
    }

    /// All tools in registration order. Never runs anything.
    pub fn list_tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    /// Validates the arguments and runs the named tool. Always produces a
    /// result: unknown tools, bad arguments, handler errors and handler
    /// panics all come back as [`ToolResult::Error`].
    pub async fn call_tool(&self, name: &str, arguments: Option<Map<String, Value>>) -> ToolResult {
        let Some(tool) = self.get(name) else {
            warn!(tool_name = %name, "Call for unknown tool");
            return ToolResult::error(AdapterError::ToolNotFound(name.to_string()).to_result_message());
        };

        let args = match tool.parameters.validate(arguments.unwrap_or_default()) {
            Ok(args) => args,
            Err(e) => {
                warn!(tool_name = %name, error = %e, "Rejected tool arguments");
                return ToolResult::error(e.to_result_message());
            }
        };
        debug!(tool_name = %name, ?args, "Dispatching tool call");

        let handler = tool.handler.clone();
        match tokio::spawn(async move { handler.call(args).await }).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!(tool_name = %name, error = %e, "Tool call failed");
                ToolResult::error(e.to_result_message())
            }
            Err(join_error) => {
                error!(tool_name = %name, error = %join_error, "Tool handler panicked");
                ToolResult::error(format!("Tool '{}' failed unexpectedly: {}", name, join_error))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{CommandLine, CommandOutput, ProcessRunner};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::process::Command;
    use std::sync::Mutex;
    use tempfile::tempdir;

    fn init_logging() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    /// Records every command line and replies from a script keyed by the
    /// first argument (or the program name when there are no arguments).
    #[derive(Default)]
    struct ScriptedRunner {
        calls: Mutex<Vec<String>>,
        replies: HashMap<String, CommandOutput>,
        missing_programs: Vec<String>,
    }

    impl ScriptedRunner {
        fn reply(mut self, key: &str, stdout: &str, stderr: &str, status: i32) -> Self {
            self.replies.insert(
                key.to_string(),
                CommandOutput {
                    status,
                    stdout: stdout.to_string(),
                    stderr: stderr.to_string(),
                },
            );
            self
        }

        fn with_aicommit(self) -> Self {
            self.reply("--version", "aicommit 0.1.139\n", "", 0)
        }

        fn missing(mut self, program: &str) -> Self {
            self.missing_programs.push(program.to_string());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, command: &CommandLine) -> Result<CommandOutput, AdapterError> {
            self.calls.lock().unwrap().push(command.to_string());
            if self.missing_programs.contains(&command.program) {
                return Err(AdapterError::Spawn {
                    command: command.to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
                });
            }
            let key = command.args.first().unwrap_or(&command.program);
            Ok(self.replies.get(key).cloned().unwrap_or(CommandOutput {
                status: 0,
                stdout: String::new(),
                stderr: String::new(),
            }))
        }
    }

    fn registry(runner: Arc<ScriptedRunner>) -> ToolRegistry {
        init_logging();
        ToolRegistry::new(&ServerConfig::default(), runner)
    }

    fn args(value: Value) -> Option<Map<String, Value>> {
        match value {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    #[test]
    fn test_list_tools_without_aicommit() {
        let runner = Arc::new(ScriptedRunner::default().missing("aicommit").missing("git"));
        let registry = registry(runner.clone());
        let names: Vec<&str> = registry.list_tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![GENERATE_COMMIT_MESSAGE, EXECUTE_AICOMMIT, GET_GIT_STATUS, LIST_AICOMMIT_PROVIDERS]
        );
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_schema_defaults_follow_config() {
        let config = ServerConfig {
            max_tokens: 80,
            staged_only: false,
            ..ServerConfig::default()
        };
        let registry = ToolRegistry::new(&config, Arc::new(ScriptedRunner::default()));
        let schema = registry.get(GENERATE_COMMIT_MESSAGE).unwrap().input_schema();
        assert_eq!(schema["properties"]["max_tokens"]["default"], json!(80));
        assert_eq!(schema["properties"]["staged_only"]["default"], json!(false));
        assert_eq!(schema["required"], json!([]));
    }

    #[tokio::test]
    async fn test_missing_arguments_take_env_defaults() {
        init_logging();
        let env: HashMap<&str, &str> = [
            (crate::config::ENV_MAX_TOKENS, "80"),
            (crate::config::ENV_STAGED_ONLY, "false"),
            (crate::config::ENV_VERBOSE, "yes"),
        ]
        .into_iter()
        .collect();
        let config = ServerConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        let runner = Arc::new(ScriptedRunner::default().with_aicommit());
        let registry = ToolRegistry::new(&config, runner.clone());

        let result = registry.call_tool(GENERATE_COMMIT_MESSAGE, None).await;
        assert!(!result.is_error());
        assert_eq!(
            runner.calls(),
            vec![
                "aicommit --version",
                "aicommit --dry-run --add --verbose --max-tokens 80"
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = registry(Arc::new(ScriptedRunner::default()));
        let result = registry.call_tool("make_coffee", None).await;
        assert_eq!(result, ToolResult::error("Tool 'make_coffee' not found"));
    }

    #[tokio::test]
    async fn test_invalid_params_never_reach_runner() {
        let runner = Arc::new(ScriptedRunner::default().with_aicommit());
        let registry = registry(runner.clone());
        let result = registry
            .call_tool(GENERATE_COMMIT_MESSAGE, args(json!({ "max_tokens": "many" })))
            .await;
        assert!(result.is_error());
        assert!(result.text_content().starts_with("Invalid parameters:"));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_generate_parses_output() {
        let runner = Arc::new(ScriptedRunner::default().with_aicommit().reply(
            "--dry-run",
            "Generated commit message: fix bug\n\nTokens: 12↑ 34↓\nAPI Cost: $0.002\n",
            "",
            0,
        ));
        let registry = registry(runner.clone());
        let result = registry.call_tool(GENERATE_COMMIT_MESSAGE, None).await;
        assert_eq!(result, ToolResult::text("fix bug\nTokens: 12↑ 34↓\nAPI Cost: $0.002"));
        assert_eq!(
            runner.calls(),
            vec!["aicommit --version", "aicommit --dry-run --max-tokens 50"]
        );
    }

    #[tokio::test]
    async fn test_generate_all_changes_with_token_limit() {
        let runner = Arc::new(ScriptedRunner::default().with_aicommit());
        let registry = registry(runner.clone());
        registry
            .call_tool(
                GENERATE_COMMIT_MESSAGE,
                args(json!({ "staged_only": false, "max_tokens": 80 })),
            )
            .await;
        let calls = runner.calls();
        let line = calls.last().unwrap();
        assert!(line.contains("--dry-run"));
        assert!(line.contains("--add"));
        assert!(line.contains("--max-tokens 80"));
    }

    #[tokio::test]
    async fn test_generate_stderr_is_error() {
        let runner = Arc::new(
            ScriptedRunner::default()
                .with_aicommit()
                .reply("--dry-run", "", "No staged changes\n", 1),
        );
        let result = registry(runner).call_tool(GENERATE_COMMIT_MESSAGE, None).await;
        assert_eq!(result, ToolResult::error("No staged changes\n"));
    }

    #[tokio::test]
    async fn test_generate_without_marker() {
        let runner = Arc::new(
            ScriptedRunner::default()
                .with_aicommit()
                .reply("--dry-run", "nothing to see\n", "", 0),
        );
        let result = registry(runner).call_tool(GENERATE_COMMIT_MESSAGE, None).await;
        assert_eq!(result, ToolResult::text("No commit message generated"));
    }

    #[tokio::test]
    async fn test_missing_dependency_only_checks_version() {
        let runner = Arc::new(ScriptedRunner::default().missing("aicommit"));
        let registry = registry(runner.clone());
        for tool in [GENERATE_COMMIT_MESSAGE, EXECUTE_AICOMMIT] {
            let result = registry.call_tool(tool, None).await;
            assert!(result.is_error());
            assert!(result.text_content().contains("cargo install aicommit"));
        }
        assert_eq!(runner.calls(), vec!["aicommit --version", "aicommit --version"]);
    }

    #[tokio::test]
    async fn test_execute_flags() {
        let runner = Arc::new(ScriptedRunner::default().with_aicommit());
        let registry = registry(runner.clone());
        registry
            .call_tool(EXECUTE_AICOMMIT, args(json!({ "add": true, "push": true })))
            .await;
        assert_eq!(
            runner.calls().last().unwrap(),
            "aicommit --add --push --max-tokens 50"
        );
    }

    #[tokio::test]
    async fn test_execute_returns_raw_output_with_warnings() {
        let stdout = "Generated commit message: fix\nTokens: 1↑ 2↓\n";
        let runner = Arc::new(ScriptedRunner::default().with_aicommit().reply(
            "--add",
            stdout,
            "warning: LF will be replaced by CRLF\n",
            0,
        ));
        let result = registry(runner)
            .call_tool(EXECUTE_AICOMMIT, args(json!({ "add": true })))
            .await;
        assert_eq!(
            result,
            ToolResult::text(format!(
                "{}\n\nWarnings:\nwarning: LF will be replaced by CRLF",
                stdout
            ))
        );
    }

    #[tokio::test]
    async fn test_execute_failure_keeps_partial_output() {
        let runner = Arc::new(ScriptedRunner::default().with_aicommit().reply(
            "--push",
            "Generated commit message: fix\n",
            "fatal: no upstream\n",
            128,
        ));
        let result = registry(runner)
            .call_tool(EXECUTE_AICOMMIT, args(json!({ "push": true })))
            .await;
        let text = result.text_content();
        assert!(result.is_error());
        assert!(text.contains("exit code 128"));
        assert!(text.contains("fatal: no upstream"));
        assert!(text.contains("Generated commit message: fix"));
    }

    #[tokio::test]
    async fn test_git_status_stderr_is_error() {
        let stderr = "fatal: not a git repository (or any of the parent directories): .git\n";
        let runner = Arc::new(ScriptedRunner::default().reply("status", "", stderr, 128));
        let result = registry(runner).call_tool(GET_GIT_STATUS, None).await;
        assert_eq!(result, ToolResult::error(stderr));
    }

    #[tokio::test]
    async fn test_git_status_does_not_need_aicommit() {
        let runner = Arc::new(
            ScriptedRunner::default()
                .missing("aicommit")
                .reply("status", " M src/lib.rs\n", "", 0),
        );
        let registry = registry(runner.clone());
        let result = registry.call_tool(GET_GIT_STATUS, None).await;
        assert_eq!(result, ToolResult::text("M src/lib.rs"));
        assert_eq!(runner.calls(), vec!["git status --short"]);
    }

    #[tokio::test]
    async fn test_list_providers() {
        let runner = Arc::new(ScriptedRunner::default().reply(
            "--list",
            "\nopenrouter (active)\nollama\n\n",
            "",
            0,
        ));
        let result = registry(runner).call_tool(LIST_AICOMMIT_PROVIDERS, None).await;
        assert_eq!(result, ToolResult::text("openrouter (active)\nollama"));
    }

    #[tokio::test]
    async fn test_spawn_failure_becomes_error_result() {
        let runner = Arc::new(ScriptedRunner::default().missing("aicommit"));
        let result = registry(runner).call_tool(LIST_AICOMMIT_PROVIDERS, None).await;
        assert!(result.is_error());
        assert!(result.text_content().starts_with("Failed to execute 'aicommit --list'"));
    }

    struct PanickingRunner;

    #[async_trait]
    impl CommandRunner for PanickingRunner {
        async fn run(&self, _command: &CommandLine) -> Result<CommandOutput, AdapterError> {
            panic!("runner exploded");
        }
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_error_result() {
        let registry = ToolRegistry::new(&ServerConfig::default(), Arc::new(PanickingRunner));
        let result = registry.call_tool(GET_GIT_STATUS, None).await;
        assert!(result.is_error());
        assert!(result.text_content().contains("failed unexpectedly"));
    }

    fn setup_git_repo() -> std::io::Result<PathBuf> {
        let dir = tempdir()?.keep();
        Command::new("git").current_dir(&dir).arg("init").output()?;
        Command::new("git")
            .current_dir(&dir)
            .args(["config", "user.email", "test@example.com"])
            .output()?;
        Command::new("git")
            .current_dir(&dir)
            .args(["config", "user.name", "Test User"])
            .output()?;
        std::fs::write(dir.join("README.md"), "Initial commit")?;
        Command::new("git").current_dir(&dir).args(["add", "README.md"]).output()?;
        Command::new("git")
            .current_dir(&dir)
            .args(["commit", "-m", "Initial commit"])
            .output()?;
        Ok(dir)
    }

    #[tokio::test]
    async fn test_git_status_against_real_repo() {
        let git_available = Command::new("git").arg("--version").output().is_ok();
        if !git_available {
            println!("Skipping test_git_status_against_real_repo: 'git' not found in PATH.");
            return;
        }
        let repo = setup_git_repo().expect("Failed to setup git repo");
        std::fs::write(repo.join("notes.txt"), "new file").unwrap();

        let runner = Arc::new(ProcessRunner::new().with_working_dir(&repo));
        let registry = ToolRegistry::new(&ServerConfig::default(), runner);

        let short = registry.call_tool(GET_GIT_STATUS, None).await;
        assert_eq!(short, ToolResult::text("?? notes.txt"));

        let long = registry
            .call_tool(GET_GIT_STATUS, args(json!({ "verbose": true })))
            .await;
        assert!(!long.is_error());
        assert!(long.text_content().contains("Untracked files"));
    }
}
