//! JSON-RPC 2.0 envelope and MCP message shapes (spec.md §3.1 `JsonRpcEnvelope`).

use serde::{Deserialize, Serialize};

/// Standard JSON-RPC error codes this gateway emits.
pub mod error_codes {
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INVALID_REQUEST: i64 = -32600;
}

/// Protocol version echoed when a client's `initialize` call omits one.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

/// An incoming request frame.
///
/// `id` is `Option<Value>`, not `Value`, so that "the `id` field was absent
/// from the request" (`None`) is distinguishable from "the client sent
/// `id: null`" (`Some(Value::Null)`) — both must still resolve to a `null`
/// response id, but only the presence test, not a truthiness test, gets
/// this right for `id: 0` / `id: false` / `id: ""` (spec.md §4.1 "Response
/// ID rule").
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[allow(dead_code)]
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    /// The `id` this request's response must echo, per spec.md §4.1.
    pub fn response_id(&self) -> serde_json::Value {
        self.id.clone().unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorBody>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorBody {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcResponse {
    pub fn result(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self { jsonrpc: "2.0", id, result: Some(result), error: None }
    }

    pub fn error(id: serde_json::Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcErrorBody { code, message: message.into(), data: None }),
        }
    }
}

/// A declared tool capability (spec.md §3.1 `Tool`).
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// One part of a `CallToolResult`'s content (spec.md §3.1: "future kinds
/// reserved" — only `text` exists today).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
}

impl ToolContent {
    pub fn text(body: impl Into<String>) -> Self {
        Self::Text { text: body.into() }
    }
}

/// Uniform tool return shape (spec.md §3.1 `CallToolResult`).
#[derive(Debug, Clone, Serialize)]
pub struct CallToolResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl CallToolResult {
    pub fn ok(body: impl Into<String>) -> Self {
        Self { content: vec![ToolContent::text(body)], is_error: false }
    }

    pub fn error(body: impl Into<String>) -> Self {
        Self { content: vec![ToolContent::text(body)], is_error: true }
    }
}
