//! MCP server over a pair of byte streams (stdio in production)
//!
//! One task reads lines, feeds the frame parser and dispatches each complete
//! request. Most handlers finish before the next line is read. Long-running
//! tools are spawned so the loop keeps reading; their response is written
//! when they settle. All responses go through one writer task, so each frame
//! is written whole, in settle order. Hosts must match responses by `id`.

use super::framing::{encode_frame, FrameOutcome, FrameParser};
use super::prompts;
use super::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use super::resources::ResourceHandler;
use super::tools::ToolHandler;
use crate::analysis::AnalysisBridge;
use crate::config::BridgeConfig;
use crate::error::{HearthError, Result};
use crate::snapshot::SnapshotStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "hearth-bridge";

/// MCP server that handles JSON-RPC requests
pub struct McpServer {
    tool_handler: ToolHandler,
    resource_handler: ResourceHandler,
}

impl McpServer {
    pub fn new(tool_handler: ToolHandler, resource_handler: ResourceHandler) -> Self {
        Self {
            tool_handler,
            resource_handler,
        }
    }

    /// Wire the store, bridge and handlers from configuration
    pub fn from_config(config: &BridgeConfig) -> Self {
        let store = Arc::new(SnapshotStore::new(config));
        let bridge = Arc::new(AnalysisBridge::new(config, store.clone()));
        Self::new(
            ToolHandler::new(store.clone(), bridge),
            ResourceHandler::new(store),
        )
    }

    /// Serve stdin/stdout until stdin closes
    pub async fn run(self: Arc<Self>) -> Result<()> {
        info!("MCP server started, listening on stdin...");
        let result = self
            .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await;
        info!("MCP server shutting down");
        result
    }

    /// Serve an arbitrary reader/writer pair until the reader reaches EOF
    ///
    /// In-flight long-running requests are allowed to finish and their
    /// responses are flushed before this returns.
    pub async fn serve<R, W>(self: Arc<Self>, mut reader: R, writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer_task = tokio::spawn(write_responses(writer, rx));

        let mut parser = FrameParser::new();
        let mut raw = Vec::new();

        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw).await {
                Ok(0) => {
                    debug!("Received EOF, shutting down");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    error!("Failed to read from input stream: {}", e);
                    break;
                }
            }

            parser.push_line(&String::from_utf8_lossy(&raw));

            loop {
                match parser.next_frame() {
                    FrameOutcome::Incomplete => break,
                    FrameOutcome::Invalid(reason) => {
                        warn!("Dropped unparseable frame: {}", reason);
                    }
                    FrameOutcome::Complete(frame) => self.dispatch_frame(frame, &tx).await,
                }
            }

            if tx.is_closed() {
                error!("Response writer stopped, closing input");
                break;
            }
        }

        drop(tx);
        match writer_task.await {
            Ok(result) => result,
            Err(e) => Err(HearthError::Other(format!("response writer panicked: {}", e))),
        }
    }

    /// Decode one complete frame and route it
    async fn dispatch_frame(self: &Arc<Self>, frame: Value, tx: &UnboundedSender<JsonRpcResponse>) {
        let frame_id = frame.get("id").cloned();

        let request: JsonRpcRequest = match serde_json::from_value(frame) {
            Ok(request) => request,
            Err(e) => {
                match frame_id {
                    Some(id) if !id.is_null() => {
                        let _ = tx.send(JsonRpcResponse::error(
                            Some(id),
                            JsonRpcError::invalid_request(format!("Invalid request: {}", e)),
                        ));
                    }
                    _ => warn!("Dropped frame that is not a request: {}", e),
                }
                return;
            }
        };

        if request.is_notification() {
            debug!("Ignoring notification: {}", request.method);
            return;
        }

        if Self::is_long_running(&request) {
            let server = Arc::clone(self);
            let tx = tx.clone();
            tokio::spawn(async move {
                let response = server.handle_request(request).await;
                let _ = tx.send(response);
            });
        } else {
            let response = self.handle_request(request).await;
            let _ = tx.send(response);
        }
    }

    fn is_long_running(request: &JsonRpcRequest) -> bool {
        request.method == "tools/call"
            && request
                .params
                .get("name")
                .and_then(Value::as_str)
                .is_some_and(ToolHandler::is_long_running)
    }

    /// Route a request to its handler; always yields exactly one response
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Handling {}", request.method);

        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.handle_initialize()),
            "tools/list" => Ok(json!({ "tools": ToolHandler::list_tools() })),
            "tools/call" => self.handle_tools_call(&request.params).await,
            "resources/list" => Ok(json!({ "resources": self.resource_handler.list_resources() })),
            "resources/read" => self.handle_resources_read(&request.params).await,
            "prompts/list" => Ok(json!({ "prompts": prompts::list_prompts() })),
            "prompts/get" => self.handle_prompts_get(&request.params),
            other => {
                return JsonRpcResponse::error(request.id, JsonRpcError::method_not_found(other))
            }
        };

        match outcome {
            Ok(result) => JsonRpcResponse::success(request.id, result),
            Err(e) => {
                warn!("{} failed: {}", request.method, e);
                JsonRpcResponse::error(request.id, JsonRpcError::from(&e))
            }
        }
    }

    /// Fixed capability manifest; request parameters are ignored
    fn handle_initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            },
            "capabilities": {
                "tools": {},
                "resources": {},
                "prompts": {}
            }
        })
    }

    async fn handle_tools_call(&self, params: &Value) -> Result<Value> {
        let name = required_str(params, "name")?;
        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));

        let text = self.tool_handler.execute(name, arguments).await?;

        Ok(json!({
            "content": [
                {
                    "type": "text",
                    "text": text
                }
            ]
        }))
    }

    async fn handle_resources_read(&self, params: &Value) -> Result<Value> {
        let uri = required_str(params, "uri")?;
        self.resource_handler.read_resource(uri).await
    }

    fn handle_prompts_get(&self, params: &Value) -> Result<Value> {
        prompts::get_prompt(required_str(params, "name")?)
    }
}

fn required_str<'a>(params: &'a Value, field: &str) -> Result<&'a str> {
    if !params.is_object() {
        return Err(HearthError::InvalidParams("params must be an object".to_string()));
    }
    params
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| HearthError::InvalidParams(format!("missing '{}' field", field)))
}

/// Drain the response channel into framed writes
async fn write_responses<W>(mut writer: W, mut rx: UnboundedReceiver<JsonRpcResponse>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let frame = encode_frame(&response)?;
        debug!("Sending response ({} bytes)", frame.len());

        if let Err(e) = writer.write_all(&frame).await {
            error!("Failed to write response: {}", e);
            return Err(e.into());
        }
        if let Err(e) = writer.flush().await {
            error!("Failed to flush output: {}", e);
            return Err(e.into());
        }
    }
    Ok(())
}
