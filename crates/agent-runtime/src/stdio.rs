//! Stdio Tool Provider
//!
//! Talks to a tool worker over its stdin/stdout using line-delimited
//! JSON-RPC 2.0 with MCP method names (`initialize`, `tools/list`,
//! `tools/call`). One request is outstanding at a time: the channel lock is
//! held from write until the matching response is read. Responses whose id
//! does not match (late replies to timed-out requests, notifications) are
//! skipped.
//!
//! The request timeout covers the write as well as the read. A write that
//! does not finish in time leaves a partial frame behind, so the channel is
//! closed and the request fails with `ChannelFailure`.

use std::collections::HashSet;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    tool::{ToolArguments, ToolDescriptor, ToolOutput, ToolProvider},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

const PROTOCOL_VERSION: &str = "2024-11-05";

/// Upper bound on `tools/list` pages fetched for one listing
const MAX_LIST_PAGES: usize = 64;

type Reader = Box<dyn AsyncRead + Send + Unpin>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

struct Channel {
    writer: Writer,
    lines: Lines<BufReader<Reader>>,
}

/// Why a single request did not produce a result
#[derive(Debug)]
enum RequestError {
    /// Server answered with a JSON-RPC error object
    Rpc { code: i64, message: String },
    /// No matching response within the timeout
    Timeout(Duration),
    /// Channel is unusable
    Channel(String),
}

impl RequestError {
    /// Map for a `tools/call`: only a broken channel is session-fatal
    fn into_call_error(self, tool: &str) -> AgentError {
        match self {
            Self::Rpc { code, message } => {
                AgentError::tool_failed(tool, format!("{message} (code {code})"))
            }
            Self::Timeout(after) => {
                AgentError::tool_failed(tool, format!("timed out after {}s", after.as_secs()))
            }
            Self::Channel(msg) => AgentError::ChannelFailure(msg),
        }
    }

    /// Map for everything else
    fn into_agent_error(self, method: &str) -> AgentError {
        match self {
            Self::Rpc { code, message } => {
                AgentError::Other(format!("Tool server rejected {method}: {message} (code {code})"))
            }
            Self::Timeout(after) => {
                AgentError::Other(format!("Tool server did not answer {method} within {}s", after.as_secs()))
            }
            Self::Channel(msg) => AgentError::ChannelFailure(msg),
        }
    }
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListToolsResult {
    #[serde(default)]
    tools: Vec<ToolDescriptor>,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Tool provider backed by a worker process (or any duplex byte stream)
pub struct StdioToolProvider {
    channel: Mutex<Option<Channel>>,
    child: Mutex<Option<Child>>,
    next_id: AtomicU64,
    timeout: Duration,
}

impl std::fmt::Debug for StdioToolProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdioToolProvider")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl StdioToolProvider {
    /// Spawn the worker and complete the handshake.
    ///
    /// `command_line` is split on whitespace; the first word is the program.
    pub async fn spawn(command_line: &str, timeout: Duration) -> Result<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| AgentError::Config("Empty tool server command".into()))?;
        let args: Vec<&str> = parts.collect();

        let mut child = Command::new(program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AgentError::ChannelFailure(format!("Failed to spawn '{program}': {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AgentError::ChannelFailure("Worker stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::ChannelFailure("Worker stdout unavailable".into()))?;

        // Worker diagnostics go to our log, never to the protocol stream.
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!(target: "tool_server", "{}", line.trim_end());
                }
            });
        }

        tracing::info!(command = %command_line, pid = ?child.id(), "Spawned tool server");

        let provider = Self::from_streams(stdout, stdin, timeout);
        *provider.child.lock().await = Some(child);
        provider.initialize().await?;
        Ok(provider)
    }

    /// Wrap an already-open duplex stream. No handshake is performed.
    pub fn from_streams<R, W>(reader: R, writer: W, timeout: Duration) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let reader: Reader = Box::new(reader);
        let channel = Channel {
            writer: Box::new(writer),
            lines: BufReader::new(reader).lines(),
        };

        Self {
            channel: Mutex::new(Some(channel)),
            child: Mutex::new(None),
            next_id: AtomicU64::new(1),
            timeout,
        }
    }

    /// MCP handshake: `initialize` request, then `notifications/initialized`.
    pub async fn initialize(&self) -> Result<Value> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            }
        });

        let result = self
            .request("initialize", params)
            .await
            .map_err(|e| match e.into_agent_error("initialize") {
                AgentError::Other(msg) => AgentError::ChannelFailure(msg),
                other => other,
            })?;
        self.notify("notifications/initialized", json!({})).await?;

        if let Some(server) = result.get("serverInfo") {
            tracing::info!(server = %server, "Tool server initialized");
        }
        Ok(result)
    }

    async fn notify(&self, method: &str, params: Value) -> Result<()> {
        let message = RpcRequest {
            jsonrpc: "2.0",
            id: None,
            method,
            params,
        };
        let line = serde_json::to_string(&message)?;

        let mut guard = self.channel.lock().await;
        let channel = guard
            .as_mut()
            .ok_or_else(|| AgentError::ChannelFailure("Tool server connection is closed".into()))?;
        write_line(&mut channel.writer, &line)
            .await
            .map_err(|e| e.into_agent_error(method))
    }

    async fn request(&self, method: &str, params: Value) -> std::result::Result<Value, RequestError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let message = RpcRequest {
            jsonrpc: "2.0",
            id: Some(id),
            method,
            params,
        };
        let line = serde_json::to_string(&message)
            .map_err(|e| RequestError::Channel(format!("Failed to encode request: {e}")))?;

        let mut guard = self.channel.lock().await;
        let channel = guard
            .as_mut()
            .ok_or_else(|| RequestError::Channel("Tool server connection is closed".into()))?;

        tracing::trace!(id, method, "Tool server request");
        let deadline = tokio::time::Instant::now() + self.timeout;

        let written = tokio::time::timeout_at(deadline, write_line(&mut channel.writer, &line)).await;
        match written {
            Ok(result) => result?,
            Err(_) => {
                tracing::error!(id, method, "Tool server stopped reading requests");
                guard.take();
                return Err(RequestError::Channel(format!(
                    "Tool server did not accept {method} within {}ms",
                    self.timeout.as_millis()
                )));
            }
        }

        match tokio::time::timeout_at(deadline, read_response(&mut channel.lines, id)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(id, method, "Tool server request timed out");
                Err(RequestError::Timeout(self.timeout))
            }
        }
    }
}

async fn write_line(writer: &mut Writer, line: &str) -> std::result::Result<(), RequestError> {
    let io = |e: std::io::Error| RequestError::Channel(format!("Failed to write to tool server: {e}"));
    writer.write_all(line.as_bytes()).await.map_err(io)?;
    writer.write_all(b"\n").await.map_err(io)?;
    writer.flush().await.map_err(io)
}

/// Read frames until the response for `id` arrives
async fn read_response(
    lines: &mut Lines<BufReader<Reader>>,
    id: u64,
) -> std::result::Result<Value, RequestError> {
    loop {
        let line = lines
            .next_line()
            .await
            .map_err(|e| RequestError::Channel(format!("Failed to read from tool server: {e}")))?
            .ok_or_else(|| RequestError::Channel("Tool server closed the connection".into()))?;

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Ok(response) = serde_json::from_str::<RpcResponse>(line) else {
            tracing::warn!(frame = %line, "Ignoring non JSON-RPC output from tool server");
            continue;
        };

        if response.id.as_ref().and_then(Value::as_u64) != Some(id) {
            tracing::debug!(frame = %line, "Skipping unrelated tool server message");
            continue;
        }

        if let Some(error) = response.error {
            return Err(RequestError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        return Ok(response.result.unwrap_or(Value::Null));
    }
}

#[async_trait]
impl ToolProvider for StdioToolProvider {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        let mut seen = HashSet::new();

        for _ in 0..MAX_LIST_PAGES {
            let params = match &cursor {
                Some(c) => json!({ "cursor": c }),
                None => json!({}),
            };
            let result = self
                .request("tools/list", params)
                .await
                .map_err(|e| e.into_agent_error("tools/list"))?;

            let page: ListToolsResult = serde_json::from_value(result)
                .map_err(|e| AgentError::Other(format!("Invalid tools/list result: {e}")))?;
            tools.extend(page.tools);

            match page.next_cursor {
                Some(next) if !next.is_empty() => {
                    if !seen.insert(next.clone()) {
                        return Err(AgentError::Other(format!(
                            "Tool server repeated tools/list cursor '{next}'"
                        )));
                    }
                    cursor = Some(next);
                }
                _ => {
                    tracing::debug!(count = tools.len(), "Listed tools");
                    return Ok(tools);
                }
            }
        }

        Err(AgentError::Other(format!(
            "Tool server listing exceeded {MAX_LIST_PAGES} pages"
        )))
    }

    async fn call_tool(&self, name: &str, arguments: &ToolArguments) -> Result<ToolOutput> {
        let result = self
            .request("tools/call", json!({ "name": name, "arguments": arguments }))
            .await
            .map_err(|e| e.into_call_error(name))?;

        serde_json::from_value(result)
            .map_err(|e| AgentError::tool_failed(name, format!("Invalid tools/call result: {e}")))
    }

    async fn shutdown(&self) -> Result<()> {
        // Dropping the channel closes the worker's stdin.
        self.channel.lock().await.take();

        if let Some(mut child) = self.child.lock().await.take() {
            if let Err(e) = child.kill().await {
                tracing::warn!("Failed to stop tool server: {}", e);
            }
            tracing::info!("Tool server stopped");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, DuplexStream};

    /// Minimal worker: answers by method over an in-memory pipe.
    fn fake_worker(stream: DuplexStream, handler: fn(&str, &Value) -> Option<Value>) {
        tokio::spawn(async move {
            let (read, mut write) = tokio::io::split(stream);
            let mut lines = BufReader::new(read).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let request: Value = serde_json::from_str(&line).unwrap();
                let Some(id) = request.get("id").cloned() else {
                    continue;
                };
                let method = request["method"].as_str().unwrap_or_default();
                let Some(reply) = handler(method, &request["params"]) else {
                    continue;
                };
                let mut frame = reply;
                frame["jsonrpc"] = json!("2.0");
                frame["id"] = id;
                let text = format!("{frame}\n");
                if write.write_all(text.as_bytes()).await.is_err() {
                    break;
                }
            }
        });
    }

    fn provider(handler: fn(&str, &Value) -> Option<Value>, timeout: Duration) -> StdioToolProvider {
        let (client, server) = duplex(64 * 1024);
        fake_worker(server, handler);
        let (read, write) = tokio::io::split(client);
        StdioToolProvider::from_streams(read, write, timeout)
    }

    fn travel_handler(method: &str, params: &Value) -> Option<Value> {
        match method {
            "initialize" => Some(json!({"result": {"protocolVersion": PROTOCOL_VERSION, "serverInfo": {"name": "fake"}}})),
            "tools/list" => Some(json!({"result": {"tools": [
                {"name": "get_weather", "description": "Weather", "inputSchema": {"type": "object"}}
            ]}})),
            "tools/call" => match params["name"].as_str() {
                Some("get_weather") => Some(json!({"result": {
                    "content": [{"type": "text", "text": format!("Weather in {}: 18°C", params["arguments"]["city"].as_str().unwrap_or("?"))}],
                    "isError": false
                }})),
                Some("slow") => None,
                Some("broken") => Some(json!({"error": {"code": -32602, "message": "Unknown tool: broken"}})),
                _ => Some(json!({"result": {"content": [{"type": "text", "text": "bad input"}], "isError": true}})),
            },
            _ => Some(json!({"error": {"code": -32601, "message": "Method not found"}})),
        }
    }

    fn args(value: Value) -> ToolArguments {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_handshake_list_and_call() {
        let provider = provider(travel_handler, Duration::from_secs(5));

        let init = provider.initialize().await.unwrap();
        assert_eq!(init["serverInfo"]["name"], "fake");

        let tools = provider.list_tools().await.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "get_weather");

        let output = provider
            .call_tool("get_weather", &args(json!({"city": "Paris"})))
            .await
            .unwrap();
        assert!(!output.is_error);
        assert_eq!(output.to_text(), "Weather in Paris: 18°C");
    }

    #[tokio::test]
    async fn test_error_envelope_and_rpc_error() {
        let provider = provider(travel_handler, Duration::from_secs(5));

        let output = provider.call_tool("other", &ToolArguments::new()).await.unwrap();
        assert!(output.is_error);

        let err = provider.call_tool("broken", &ToolArguments::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolCallFailed { ref message, .. } if message.contains("Unknown tool: broken")));
    }

    #[tokio::test]
    async fn test_timeout_is_step_level_and_channel_recovers() {
        let provider = provider(travel_handler, Duration::from_millis(100));

        let err = provider.call_tool("slow", &ToolArguments::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolCallFailed { .. }));

        let output = provider
            .call_tool("get_weather", &args(json!({"city": "Rome"})))
            .await
            .unwrap();
        assert_eq!(output.to_text(), "Weather in Rome: 18°C");
    }

    #[tokio::test]
    async fn test_closed_stream_is_channel_failure() {
        let (client, server) = duplex(1024);
        drop(server);
        let (read, write) = tokio::io::split(client);
        let provider = StdioToolProvider::from_streams(read, write, Duration::from_secs(1));

        let err = provider.list_tools().await.unwrap_err();
        assert!(matches!(err, AgentError::ChannelFailure(_)));
    }

    #[tokio::test]
    async fn test_paginated_listing() {
        fn paged(method: &str, params: &Value) -> Option<Value> {
            match (method, params.get("cursor").and_then(Value::as_str)) {
                ("tools/list", None) => Some(json!({"result": {
                    "tools": [{"name": "a", "inputSchema": {}}], "nextCursor": "page-2"
                }})),
                ("tools/list", Some("page-2")) => Some(json!({"result": {
                    "tools": [{"name": "b", "inputSchema": {}}]
                }})),
                _ => None,
            }
        }
        let provider = provider(paged, Duration::from_secs(5));

        let names: Vec<String> = provider.list_tools().await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_repeated_cursor_ends_listing() {
        fn looping(method: &str, _params: &Value) -> Option<Value> {
            (method == "tools/list").then(|| {
                json!({"result": {"tools": [{"name": "a", "inputSchema": {}}], "nextCursor": "again"}})
            })
        }
        let provider = provider(looping, Duration::from_secs(5));

        let listed = tokio::time::timeout(Duration::from_secs(2), provider.list_tools())
            .await
            .expect("listing should stop on a repeated cursor");
        let err = listed.unwrap_err();
        assert!(matches!(err, AgentError::Other(ref msg) if msg.contains("again")));
    }

    #[tokio::test]
    async fn test_stalled_write_is_channel_failure() {
        // The server end stays open but is never read, so the pipe fills up.
        let (client, _server) = duplex(64);
        let (read, write) = tokio::io::split(client);
        let provider = StdioToolProvider::from_streams(read, write, Duration::from_millis(100));
        let payload = args(json!({"notes": "x".repeat(4096)}));

        let called = tokio::time::timeout(Duration::from_secs(2), provider.call_tool("get_weather", &payload))
            .await
            .expect("a stalled write should time out");
        assert!(matches!(called, Err(AgentError::ChannelFailure(_))));

        // A partial frame is on the stream, so the channel stays closed.
        let err = provider.list_tools().await.unwrap_err();
        assert!(matches!(err, AgentError::ChannelFailure(ref msg) if msg.contains("closed")));
    }

    #[tokio::test]
    async fn test_shutdown_closes_channel() {
        let provider = provider(travel_handler, Duration::from_secs(5));

        provider.shutdown().await.unwrap();

        let err = provider.list_tools().await.unwrap_err();
        assert!(matches!(err, AgentError::ChannelFailure(_)));
    }

    #[tokio::test]
    async fn test_spawn_missing_program_fails() {
        let err = StdioToolProvider::spawn("definitely-not-a-real-tool-server-binary", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ChannelFailure(_)));
    }
}
