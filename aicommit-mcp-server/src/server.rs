// aicommit-mcp-server/src/server.rs
use aicommit_core::{ContentBlock, ToolDefinition, ToolRegistry, ToolResult};
use rmcp::{Error as McpError, model::*, service::*};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::shutdown::ShutdownHooks;

pub const SERVER_NAME: &str = "aicommit";

const INSTRUCTIONS: &str = "AI-powered git commit message generator. Use get_git_status to inspect \
the working tree, generate_commit_message to preview a message without committing, \
execute_aicommit to commit (optionally adding, pulling and pushing), and \
list_aicommit_providers to see the configured LLM providers.";

fn to_mcp_tool(definition: &ToolDefinition) -> Tool {
    Tool {
        name: definition.name.clone().into(),
        description: definition.description.clone().into(),
        input_schema: Arc::new(definition.input_schema()),
    }
}

fn text_content(text: String) -> Annotated<RawContent> {
    Annotated {
        raw: RawContent::Text(RawTextContent { text }),
        annotations: None,
    }
}

/// Wraps a tool result in the protocol's response envelope.
pub fn to_call_tool_result(result: ToolResult) -> CallToolResult {
    match result {
        ToolResult::Success(blocks) => CallToolResult {
            content: blocks
                .into_iter()
                .map(|ContentBlock::Text(text)| text_content(text))
                .collect(),
            is_error: Some(false),
        },
        ToolResult::Error(message) => CallToolResult {
            content: vec![text_content(message)],
            is_error: Some(true),
        },
    }
}

#[derive(Debug, Clone)]
pub struct AicommitServer {
    peer: Arc<Mutex<Option<Peer<RoleServer>>>>,
    registry: Arc<ToolRegistry>,
    tools: Arc<Vec<Tool>>,
}

impl AicommitServer {
    pub fn new(registry: ToolRegistry) -> Self {
        let tools = registry.list_tools().iter().map(to_mcp_tool).collect();
        Self {
            peer: Arc::new(Mutex::new(None)),
            registry: Arc::new(registry),
            tools: Arc::new(tools),
        }
    }

    pub fn list_tools(&self) -> ListToolsResult {
        ListToolsResult {
            tools: self.tools.as_ref().clone(),
            next_cursor: None,
        }
    }

    pub async fn call_tool(&self, params: CallToolRequestParam) -> CallToolResult {
        info!(tool_name = %params.name, "Received tool call");
        let result = self.registry.call_tool(&params.name, params.arguments).await;
        debug!(tool_name = %params.name, is_error = result.is_error(), "Tool call finished");
        to_call_tool_result(result)
    }

    /// Answers one client request. Anything besides ping and the tool
    /// methods is reported as method-not-found under its own method name.
    pub async fn respond(&self, request: ClientRequest) -> Result<ServerResult, McpError> {
        match request {
            ClientRequest::PingRequest(_) => Ok(ServerResult::empty(())),
            ClientRequest::ListToolsRequest(Request { .. }) => {
                Ok(ServerResult::ListToolsResult(self.list_tools()))
            }
            ClientRequest::CallToolRequest(Request { params, .. }) => {
                Ok(ServerResult::CallToolResult(self.call_tool(params).await))
            }
            other => {
                let method = method_name(&other);
                debug!(%method, "Unsupported request");
                Err(McpError::new(ErrorCode::METHOD_NOT_FOUND, method, None))
            }
        }
    }
}

fn method_name(request: &ClientRequest) -> String {
    serde_json::to_value(request)
        .ok()
        .and_then(|value| value.get("method").and_then(|m| m.as_str()).map(str::to_owned))
        .unwrap_or_else(|| "unknown".to_string())
}

impl Service<RoleServer> for AicommitServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
                ..Default::default()
            },
            server_info: Implementation {
                name: SERVER_NAME.into(),
                version: env!("CARGO_PKG_VERSION").into(),
            },
            instructions: Some(INSTRUCTIONS.into()),
        }
    }

    fn get_peer(&self) -> Option<Peer<RoleServer>> {
        self.peer.lock().ok().and_then(|peer| peer.clone())
    }

    fn set_peer(&mut self, peer: Peer<RoleServer>) {
        if let Ok(mut slot) = self.peer.lock() {
            *slot = Some(peer);
        }
    }

    #[allow(refining_impl_trait)]
    fn handle_request(
        &self,
        request: ClientRequest,
        _context: RequestContext<RoleServer>,
    ) -> Pin<Box<dyn Future<Output = Result<ServerResult, McpError>> + Send + '_>> {
        let self_clone = self.clone();
        Box::pin(async move { self_clone.respond(request).await })
    }

    #[allow(refining_impl_trait)]
    fn handle_notification(
        &self,
        _notification: ClientNotification,
    ) -> Pin<Box<dyn Future<Output = Result<(), McpError>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }
}

/// Stop routine: closes the transport by cancelling its token, then runs the
/// registered hooks.
pub fn stop(ct: &CancellationToken, hooks: ShutdownHooks) {
    info!("Stopping aicommit MCP server");
    ct.cancel();
    if hooks.is_empty() {
        return;
    }
    debug!(hooks = hooks.len(), "Running shutdown hooks");
    hooks.run();
}
