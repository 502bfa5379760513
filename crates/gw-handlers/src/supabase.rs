//! Supabase tool handlers (spec.md §4.3 catalog, *Supabase*).
//!
//! Supabase is not an OAuth provider here: the operator configures a
//! project URL and a service-role key directly (spec.md §4.4, "non-OAuth
//! providers... use a configured API key instead").

use secrecy::Secret;
use serde_json::{Value, json};

use gw_config::SupabaseConfig;
use gw_mcp::{CallToolResult, ProviderRegistry, Tool, ToolContext};

use crate::common::{finish, optional_str, require_str, RestClient};

fn obj_schema(properties: Value, required: &[&str]) -> Value {
    json!({ "type": "object", "properties": properties, "required": required })
}

pub struct SupabaseRegistry {
    client: RestClient,
}

impl SupabaseRegistry {
    pub fn new(config: SupabaseConfig) -> Self {
        let client = RestClient::new(format!("{}/rest/v1", config.project_url), Secret::new(config.service_key.clone()))
            .with_header("apikey", Secret::new(config.service_key));
        Self { client }
    }
}

#[async_trait::async_trait]
impl ProviderRegistry for SupabaseRegistry {
    fn name(&self) -> &'static str {
        "supabase"
    }

    fn list_tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: "query".into(),
                description: "Select rows from a table".into(),
                input_schema: obj_schema(
                    json!({ "table": {"type": "string"}, "select": {"type": "string"}, "filter": {"type": "string"} }),
                    &["table"],
                ),
            },
            Tool {
                name: "insert".into(),
                description: "Insert a row into a table".into(),
                input_schema: obj_schema(
                    json!({ "table": {"type": "string"}, "values": {"type": "object"} }),
                    &["table", "values"],
                ),
            },
            Tool {
                name: "update".into(),
                description: "Update rows matching a filter".into(),
                input_schema: obj_schema(
                    json!({ "table": {"type": "string"}, "filter": {"type": "string"}, "values": {"type": "object"} }),
                    &["table", "filter", "values"],
                ),
            },
            Tool {
                name: "delete".into(),
                description: "Delete rows matching a filter".into(),
                input_schema: obj_schema(
                    json!({ "table": {"type": "string"}, "filter": {"type": "string"} }),
                    &["table", "filter"],
                ),
            },
            Tool {
                name: "list_tables".into(),
                description: "List tables via the operator-installed list_tables() procedure".into(),
                input_schema: obj_schema(json!({}), &[]),
            },
        ]
    }

    async fn call_tool(&self, inner_name: &str, arguments: Value, _ctx: &ToolContext) -> CallToolResult {
        let args = &arguments;

        match inner_name {
            "query" => {
                let table = match require_str(args, "table") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let select = optional_str(args, "select").unwrap_or("*");
                let mut path = format!("/{table}?select={select}");
                if let Some(filter) = optional_str(args, "filter") {
                    path.push('&');
                    path.push_str(filter);
                }
                finish(self.client.get(&path).await)
            },
            "insert" => {
                let table = match require_str(args, "table") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let Some(values) = args.get("values") else {
                    return CallToolResult::error("argument values is required");
                };
                finish(self.client.post(&format!("/{table}"), values).await)
            },
            "update" => {
                let (table, filter) = match (require_str(args, "table"), require_str(args, "filter")) {
                    (Ok(t), Ok(f)) => (t, f),
                    (Err(e), _) | (_, Err(e)) => return e,
                };
                let Some(values) = args.get("values") else {
                    return CallToolResult::error("argument values is required");
                };
                finish(self.client.patch(&format!("/{table}?{filter}"), values).await)
            },
            "delete" => {
                let (table, filter) = match (require_str(args, "table"), require_str(args, "filter")) {
                    (Ok(t), Ok(f)) => (t, f),
                    (Err(e), _) | (_, Err(e)) => return e,
                };
                finish(self.client.delete(&format!("/{table}?{filter}")).await)
            },
            "list_tables" => finish(self.client.post("/rpc/list_tables", &json!({})).await),
            other => CallToolResult::error(format!("unknown supabase tool: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ToolContext {
        ToolContext { user_id: "jason".into() }
    }

    fn registry(base_url: &str) -> SupabaseRegistry {
        SupabaseRegistry::new(SupabaseConfig { project_url: base_url.to_string(), service_key: "svc-key".into() })
    }

    #[tokio::test]
    async fn query_requires_table() {
        let registry = registry("https://example.supabase.co");
        let result = registry.call_tool("query", json!({}), &ctx()).await;
        assert!(result.is_error);
    }

    #[tokio::test]
    async fn query_selects_all_columns_by_default() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/rest/v1/todos?select=*")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":1}]"#)
            .create_async()
            .await;
        let registry = registry(&server.url());
        let result = registry.call_tool("query", json!({ "table": "todos" }), &ctx()).await;
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn list_tables_calls_the_configured_procedure() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/rest/v1/rpc/list_tables")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"["todos","users"]"#)
            .create_async()
            .await;
        let registry = registry(&server.url());
        let result = registry.call_tool("list_tables", json!({}), &ctx()).await;
        assert!(!result.is_error);
    }

    #[test]
    fn tool_catalog_matches_the_normative_set() {
        let registry = registry("https://example.supabase.co");
        assert_eq!(registry.list_tools().len(), 5);
    }
}
