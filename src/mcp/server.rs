//! MCP server implementation
//!
//! Implements the Model Context Protocol server that exposes PubChem
//! as one MCP tool plus a set of resource templates, over stdio.

use crate::mcp::protocol::*;
use crate::mcp::resources::{resource_templates, ResourceRouter};
use crate::mcp::tools;
use crate::pubchem::PubChemClient;
use anyhow::Result;
use bytes::BytesMut;
use futures::StreamExt;
use serde_json::{json, Value};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Decoder, FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, error, info, warn};

/// Longest request line accepted; SDF queries can run to a few megabytes.
pub const MAX_LINE_BYTES: usize = 8 * 1024 * 1024;

/// Newline framing that reports a bad line as an item instead of ending
/// the stream. The offending bytes are consumed either way.
struct RequestLines {
    inner: LinesCodec,
}

impl RequestLines {
    fn new(max_length: usize) -> Self {
        Self {
            inner: LinesCodec::new_with_max_length(max_length),
        }
    }

    fn lift(
        result: Result<Option<String>, LinesCodecError>,
    ) -> Result<Option<Result<String, String>>, io::Error> {
        match result {
            Ok(line) => Ok(line.map(Ok)),
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                Ok(Some(Err("line exceeds maximum length".to_string())))
            }
            Err(LinesCodecError::Io(e)) if e.kind() == io::ErrorKind::InvalidData => {
                Ok(Some(Err("line is not valid UTF-8".to_string())))
            }
            Err(LinesCodecError::Io(e)) => Err(e),
        }
    }
}

impl Decoder for RequestLines {
    type Item = Result<String, String>;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, io::Error> {
        Self::lift(self.inner.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, io::Error> {
        Self::lift(self.inner.decode_eof(buf))
    }
}

pub struct McpServer {
    client: PubChemClient,
    resources: ResourceRouter,
    initialized: AtomicBool,
    max_line_bytes: usize,
}

impl McpServer {
    pub fn new(client: PubChemClient) -> Result<Self> {
        Ok(Self {
            client,
            resources: ResourceRouter::new()?,
            initialized: AtomicBool::new(false),
            max_line_bytes: MAX_LINE_BYTES,
        })
    }

    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    /// Run the MCP server on stdin/stdout until the client disconnects
    pub async fn run(&self) -> Result<()> {
        info!("MCP server starting on stdio");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve newline-delimited JSON-RPC from `reader`, answering on `writer`
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = FramedRead::new(reader, RequestLines::new(self.max_line_bytes));

        while let Some(frame) = lines.next().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    error!("Failed to read line: {}", e);
                    return Err(e.into());
                }
            };

            let response = match frame {
                Ok(line) => {
                    let line = line.trim();

                    // Skip empty lines
                    if line.is_empty() {
                        continue;
                    }

                    debug!("Received request: {}", line);

                    let Some(response) = self.handle_request(line).await else {
                        continue;
                    };
                    response
                }
                Err(reason) => {
                    warn!("Rejected input: {}", reason);
                    JsonRpcResponse::failure(
                        Value::Null,
                        JsonRpcError::new(PARSE_ERROR, format!("Parse error: {}", reason)),
                    )
                }
            };

            let response_json = serde_json::to_string(&response)?;
            writer.write_all(response_json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;

            debug!("Sent response");
        }

        info!("Client closed connection");
        Ok(())
    }

    /// Handle one JSON-RPC message; notifications produce no response
    pub async fn handle_request(&self, content: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(content) {
            Ok(req) => req,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::new(PARSE_ERROR, format!("Parse error: {}", e)),
                ));
            }
        };

        if request.is_notification() {
            debug!("Notification: {}", request.method);
            return None;
        }

        let id = request.id.clone().unwrap_or(Value::Null);

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::new(
                    INVALID_REQUEST,
                    format!("Unsupported jsonrpc version: {}", request.jsonrpc),
                ),
            ));
        }

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params),
            "ping" => Ok(json!({})),
            "tools/list" => self.handle_list_tools(),
            "tools/call" => self.handle_call_tool(request.params).await,
            "resources/list" => Ok(json!({ "resources": [] })),
            "resources/templates/list" => self.handle_list_resource_templates(),
            "resources/read" => self.handle_read_resource(request.params).await,
            _ => Err(JsonRpcError::method_not_found(format!(
                "Method not found: {}",
                request.method
            ))),
        };

        Some(match result {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    fn handle_initialize(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: InitializeParams = serde_json::from_value(params.unwrap_or_else(|| json!({})))
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid initialize params: {}", e)))?;

        if let Some(client_info) = &params.client_info {
            info!("Client connected: {}", client_info.name);
        }

        self.initialized.store(true, Ordering::SeqCst);

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                logging: None,
                resources: Some(json!({})),
                tools: Some(json!({})),
            },
            server_info: ServerInfo {
                name: "pubchem-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        to_value(result)
    }

    fn handle_list_tools(&self) -> Result<Value, JsonRpcError> {
        to_value(ListToolsResult {
            tools: tools::get_tool_definitions(),
        })
    }

    fn handle_list_resource_templates(&self) -> Result<Value, JsonRpcError> {
        to_value(ListResourceTemplatesResult {
            resource_templates: resource_templates(),
        })
    }

    async fn handle_call_tool(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(JsonRpcError::internal("Server not initialized"));
        }

        let params: CallToolParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid tool call params: {}", e)))?;

        let result = tools::call_tool(&params.name, params.arguments, &self.client).await?;
        if result.is_error == Some(true) {
            warn!("Tool call {} returned an error result", params.name);
        }

        to_value(result)
    }

    async fn handle_read_resource(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: ReadResourceParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid resource params: {}", e)))?;

        let result = self.resources.read(&params.uri, &self.client).await?;
        to_value(result)
    }
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value)
        .map_err(|e| JsonRpcError::internal(format!("Failed to serialize result: {}", e)))
}
