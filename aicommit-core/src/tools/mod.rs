// aicommit-core/src/tools/mod.rs

//! The fixed set of tools the server exposes, and the registry that
//! validates arguments and dispatches calls to their handlers.

pub mod definition;
pub mod handlers;
pub mod install;
pub mod registry;

pub use definition::{
    ToolArgs, ToolDefinition, ToolHandler, ToolParameter, ToolParameterType,
    ToolParametersDefinition,
};
pub use registry::ToolRegistry;

/// A typed unit of result payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Text(String),
}

/// Outcome of one tool call: content blocks or an error message, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolResult {
    Success(Vec<ContentBlock>),
    Error(String),
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        ToolResult::Success(vec![ContentBlock::Text(text.into())])
    }

    pub fn error(message: impl Into<String>) -> Self {
        ToolResult::Error(message.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolResult::Error(_))
    }

    /// All text in the result joined by newlines; the message for errors.
    pub fn text_content(&self) -> String {
        match self {
            ToolResult::Success(blocks) => blocks
                .iter()
                .map(|ContentBlock::Text(text)| text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            ToolResult::Error(message) => message.clone(),
        }
    }
}
