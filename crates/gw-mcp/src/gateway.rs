use std::{collections::HashMap, sync::Arc};

use serde_json::json;
use tracing::{info, warn};

use crate::{
    error::{Error, Result},
    registry::{ProviderRegistry, ToolContext},
    types::{
        CallToolResult, DEFAULT_PROTOCOL_VERSION, JsonRpcRequest, JsonRpcResponse, Tool, error_codes,
    },
};

struct Registration {
    registry: Arc<dyn ProviderRegistry>,
    /// The tool's name as declared by its own registry, before the
    /// provider prefix is applied for the public catalog.
    inner_name: String,
}

/// Terminates JSON-RPC, dispatches to the right provider registry, and
/// encodes the response (spec.md §4.1).
///
/// Built once at startup from the full set of `ProviderRegistry`
/// implementations; immutable thereafter. Tool-name collisions across
/// providers are rejected at construction, not discovered at call time.
pub struct Gateway {
    registries: Vec<Arc<dyn ProviderRegistry>>,
    tools: HashMap<String, Registration>,
    catalog: Vec<Tool>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("registries", &self.registries.iter().map(|r| r.name()).collect::<Vec<_>>())
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Gateway {
    pub fn new(registries: Vec<Arc<dyn ProviderRegistry>>) -> Result<Self> {
        let mut tools = HashMap::new();
        let mut catalog = Vec::new();

        let mut ordered: Vec<_> = registries.iter().cloned().collect();
        ordered.sort_by_key(|r| r.name());

        for registry in &ordered {
            for tool in registry.list_tools() {
                let full_name = format!("{}_{}", registry.name(), tool.name);
                if let Some(existing) = tools.get(&full_name) {
                    let existing: &Registration = existing;
                    return Err(Error::DuplicateTool(
                        full_name,
                        existing.registry.name().to_string(),
                        registry.name().to_string(),
                    ));
                }
                catalog.push(Tool { name: full_name.clone(), ..tool.clone() });
                tools.insert(
                    full_name,
                    Registration { registry: registry.clone(), inner_name: tool.name.clone() },
                );
            }
        }

        catalog.sort_by(|a, b| a.name.cmp(&b.name));
        info!(tool_count = catalog.len(), provider_count = ordered.len(), "gateway tool catalog built");

        Ok(Self { registries: ordered, tools, catalog })
    }

    /// Handle one decoded JSON-RPC request and produce its response frame.
    /// `user_id` is this deployment's single configured operator identity
    /// (spec.md §4.3: "derived from process-wide configuration", never
    /// supplied by the caller).
    pub async fn handle(&self, request: &JsonRpcRequest, user_id: &str) -> JsonRpcResponse {
        let id = request.response_id();
        match request.method.as_str() {
            "initialize" => JsonRpcResponse::result(id, self.initialize_result(request)),
            "tools/list" => JsonRpcResponse::result(id, self.tools_list_result()),
            "tools/call" => self.handle_tools_call(request, id, user_id).await,
            "resources/list" => JsonRpcResponse::result(id, json!({ "resources": [] })),
            other => {
                warn!(method = other, "unrecognized JSON-RPC method");
                JsonRpcResponse::error(id, error_codes::METHOD_NOT_FOUND, format!("method not found: {other}"))
            },
        }
    }

    fn initialize_result(&self, request: &JsonRpcRequest) -> serde_json::Value {
        let protocol_version = request
            .params
            .as_ref()
            .and_then(|p| p.get("protocolVersion"))
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_PROTOCOL_VERSION);

        json!({
            "protocolVersion": protocol_version,
            "capabilities": {
                "tools": { "listChanged": true },
                "resources": { "listChanged": true },
            },
            "serverInfo": { "name": "gw-server", "version": env!("CARGO_PKG_VERSION") },
        })
    }

    fn tools_list_result(&self) -> serde_json::Value {
        json!({ "tools": self.catalog })
    }

    async fn handle_tools_call(
        &self,
        request: &JsonRpcRequest,
        id: serde_json::Value,
        user_id: &str,
    ) -> JsonRpcResponse {
        let Some(params) = &request.params else {
            return JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, "missing params");
        };
        let Some(name) = params.get("name").and_then(|v| v.as_str()) else {
            return JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, "params.name is required");
        };
        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        let Some(registration) = self.tools.get(name) else {
            return JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, format!("unknown tool: {name}"));
        };

        let ctx = ToolContext { user_id: user_id.to_string() };
        let result: CallToolResult =
            registration.registry.call_tool(&registration.inner_name, arguments, &ctx).await;

        JsonRpcResponse::result(id, serde_json::to_value(result).expect("CallToolResult always serializes"))
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.registries.iter().map(|r| r.name()).collect()
    }
}
