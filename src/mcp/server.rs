//! Line-delimited JSON-RPC server loop.
//!
//! Each request line is dispatched on its own task so a slow Azure DevOps
//! call does not block `ping` or other tool calls; responses are funneled
//! through one writer task and may therefore arrive out of request order.

use futures::StreamExt;
use serde_json::{Value, json};
use std::io::ErrorKind;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};

use super::protocol::{
    JsonRpcRequest, JsonRpcResponse, ServerInfo, initialize_result, negotiate_protocol_version,
    parse_message,
};
use super::registry::ToolRegistry;
use crate::error::McpError;

/// Longest accepted request line.
pub const MAX_LINE_BYTES: usize = 10 * 1024 * 1024;

const DEFAULT_INSTRUCTIONS: &str = "Tools for Azure DevOps. Every tool returns an envelope \
    {success, data, errorMessage}. Tools that work inside a project accept an optional \
    `project` argument; when omitted the configured default project is used.";

struct ServerState {
    registry: ToolRegistry,
    info: ServerInfo,
    instructions: String,
}

/// Cheaply cloneable handle to the dispatcher.
#[derive(Clone)]
pub struct McpServer {
    state: Arc<ServerState>,
}

impl std::fmt::Debug for McpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpServer")
            .field("info", &self.state.info)
            .field("registry", &self.state.registry)
            .finish()
    }
}

impl McpServer {
    pub fn new(registry: ToolRegistry, info: ServerInfo) -> Self {
        Self::with_instructions(registry, info, DEFAULT_INSTRUCTIONS)
    }

    pub fn with_instructions(
        registry: ToolRegistry,
        info: ServerInfo,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            state: Arc::new(ServerState {
                registry,
                info,
                instructions: instructions.into(),
            }),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.state.registry
    }

    /// Handle one message; `None` means nothing should be written back.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let response = match parse_message(line) {
            Ok(request) => self.handle_request(request).await?,
            Err(err) => {
                debug!(error = %err, "Rejected malformed message");
                JsonRpcResponse::error(Value::Null, &err)
            }
        };
        Some(response.to_line())
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            debug!(method = %request.method, "Notification received");
            return None;
        };

        let result = match request.method.as_str() {
            "initialize" => Ok(self.initialize(request.params.as_ref())),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({"tools": self.state.registry.definitions()})),
            "tools/call" => self.call_tool(request.params).await,
            other => Err(McpError::MethodNotFound(other.to_string())),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(err) => JsonRpcResponse::error(id, &err),
        })
    }

    fn initialize(&self, params: Option<&Value>) -> Value {
        let requested = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str);
        let version = negotiate_protocol_version(requested);
        let client = params
            .and_then(|p| p.pointer("/clientInfo/name"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        info!(
            client,
            requested = requested.unwrap_or("none"),
            protocol_version = version,
            tools = self.state.registry.len(),
            "Client initialized"
        );
        initialize_result(&self.state.info, version, &self.state.instructions)
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, McpError> {
        let mut params = params.unwrap_or_else(|| json!({}));
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| McpError::InvalidParams("tools/call requires a tool name".to_string()))?;
        let arguments = params.get_mut("arguments").map(Value::take);

        let outcome = self.state.registry.call(&name, arguments).await?;
        Ok(outcome.to_call_result())
    }

    /// Serve until `reader` reaches EOF, then flush every pending response.
    pub async fn run<R, W>(&self, reader: R, writer: W) -> Result<(), McpError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let writer_task = tokio::spawn(async move {
            let mut writer = writer;
            while let Some(line) = rx.recv().await {
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Ok::<_, std::io::Error>(())
        });

        let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_BYTES));
        // A decode error is followed by one `None` before the stream resumes.
        let mut resuming = false;
        loop {
            let line = match lines.next().await {
                Some(Ok(line)) => {
                    resuming = false;
                    line
                }
                Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                    warn!(max_bytes = MAX_LINE_BYTES, "Rejected oversized message");
                    let err = McpError::InvalidRequest(format!(
                        "message exceeds maximum size of {} bytes",
                        MAX_LINE_BYTES
                    ));
                    let _ = tx.send(JsonRpcResponse::error(Value::Null, &err).to_line());
                    resuming = true;
                    continue;
                }
                Some(Err(LinesCodecError::Io(e))) if e.kind() == ErrorKind::InvalidData => {
                    let err = McpError::ParseError(format!("invalid UTF-8: {}", e));
                    let _ = tx.send(JsonRpcResponse::error(Value::Null, &err).to_line());
                    resuming = true;
                    continue;
                }
                Some(Err(LinesCodecError::Io(e))) => {
                    return Err(McpError::Internal(format!("failed to read input: {}", e)));
                }
                None if resuming => {
                    resuming = false;
                    continue;
                }
                None => break,
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let line = line.to_string();
            let server = self.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Some(response) = server.handle_line(&line).await {
                    let _ = tx.send(response);
                }
            });
        }

        debug!("Input closed, draining pending responses");
        drop(tx);
        writer_task
            .await
            .map_err(|e| McpError::Internal(format!("writer task failed: {}", e)))?
            .map_err(|e| McpError::Internal(format!("failed to write output: {}", e)))
    }
}

/// Serve on the process's stdin and stdout.
pub async fn serve_stdio(server: McpServer) -> Result<(), McpError> {
    info!(tools = server.registry().len(), "Serving MCP on stdio");
    server.run(tokio::io::stdin(), tokio::io::stdout()).await
}
