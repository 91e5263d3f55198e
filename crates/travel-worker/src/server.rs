//! Stdio Tool Server
//!
//! Line-delimited JSON-RPC 2.0 over a reader/writer pair, using the MCP
//! method names the agent speaks:
//!
//! - `initialize` answers with server info and the tools capability
//! - `tools/list` returns every registered descriptor (no pagination)
//! - `tools/call` runs a tool; tool failures come back as `isError` results
//! - `ping` answers with an empty result
//!
//! Notifications (no `id`) are accepted and never answered. Only protocol
//! frames are written to the output; logging goes to stderr.

use agent_core::tool::ToolArguments;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::Result;
use crate::tool::ToolRegistry;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: ToolArguments,
}

struct RpcError {
    code: i64,
    message: String,
}

impl RpcError {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

pub struct ToolServer {
    registry: ToolRegistry,
    name: String,
    version: String,
}

impl ToolServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            name: env!("CARGO_PKG_NAME").into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }

    /// Serve until the input closes
    pub async fn serve<R, W>(&self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        tracing::info!(tools = self.registry.len(), "Tool server ready");

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(frame) = self.handle(&line).await {
                let mut text = serde_json::to_string(&frame)?;
                text.push('\n');
                output.write_all(text.as_bytes()).await?;
                output.flush().await?;
            }
        }

        tracing::info!("Input closed, shutting down");
        Ok(())
    }

    /// Handle one inbound line; `None` means nothing is sent back
    pub async fn handle(&self, line: &str) -> Option<Value> {
        let raw: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Unparseable frame: {}", e);
                return Some(error_frame(&Value::Null, &RpcError::new(PARSE_ERROR, "Parse error")));
            }
        };

        let request: Request = match serde_json::from_value(raw.clone()) {
            Ok(request) => request,
            Err(e) => {
                let id = raw.get("id").cloned().unwrap_or(Value::Null);
                return Some(error_frame(&id, &RpcError::new(INVALID_REQUEST, format!("Invalid request: {e}"))));
            }
        };

        let Some(id) = request.id else {
            tracing::debug!(method = %request.method, "Notification");
            return None;
        };

        tracing::debug!(%id, method = %request.method, "Request");
        let frame = match self.dispatch(&request.method, request.params).await {
            Ok(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
            Err(e) => error_frame(&id, &e),
        };
        Some(frame)
    }

    async fn dispatch(&self, method: &str, params: Value) -> std::result::Result<Value, RpcError> {
        match method {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {"tools": {"listChanged": false}},
                "serverInfo": {"name": self.name, "version": self.version}
            })),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({"tools": self.registry.descriptors()})),
            "tools/call" => self.call(params).await,
            other => Err(RpcError::new(METHOD_NOT_FOUND, format!("Method not found: {other}"))),
        }
    }

    async fn call(&self, params: Value) -> std::result::Result<Value, RpcError> {
        let params: CallParams = serde_json::from_value(params)
            .map_err(|e| RpcError::new(INVALID_PARAMS, format!("Invalid tools/call params: {e}")))?;

        tracing::info!(tool = %params.name, "Tool call");
        match self.registry.execute(&params.name, &params.arguments).await {
            Ok(output) => serde_json::to_value(output)
                .map_err(|e| RpcError::new(INVALID_PARAMS, e.to_string())),
            // Only an unknown tool name reaches here; tool failures are envelopes.
            Err(e) => Err(RpcError::new(INVALID_PARAMS, e.to_string())),
        }
    }
}

fn error_frame(id: &Value, error: &RpcError) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {"code": error.code, "message": error.message}
    })
}
