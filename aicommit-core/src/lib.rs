// aicommit-core/src/lib.rs

//! Everything behind the aicommit MCP server except the transport: running
//! the external programs, parsing their output, and the tool registry that
//! turns protocol calls into those runs.

pub mod config;
pub mod errors;
pub mod parser;
pub mod process;
pub mod tools;

pub use config::ServerConfig;
pub use errors::AdapterError;
pub use parser::{parse_commit_output, ParsedCommitInfo, TokenUsage};
pub use process::{CommandLine, CommandOutput, CommandRunner, ProcessRunner};
pub use tools::install::Installer;
pub use tools::{ContentBlock, ToolDefinition, ToolRegistry, ToolResult};

pub use async_trait::async_trait;
