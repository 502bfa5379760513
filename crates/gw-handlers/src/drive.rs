//! Google Drive tool handlers (spec.md §4.3 catalog, *Google Drive*).
//!
//! Tool names are carried verbatim from the catalog, including its mixed
//! `snake_case`/`camelCase` naming (`createFolder`, `moveItem`,
//! `renameItem` alongside `read_file`, `write_file`, `list_files`,
//! `search`).

use std::sync::Arc;

use serde_json::{Value, json};

use gw_mcp::{CallToolResult, ProviderRegistry, Tool, ToolContext};
use gw_resolver::AuthResolver;
use gw_store::Provider;

use crate::common::{finish, optional_str, require_str, RestClient};

const BASE_URL: &str = "https://www.googleapis.com/drive/v3";
const GOOGLE_DOC_MIME: &str = "application/vnd.google-apps.document";
const EXPORT_MIME: &str = "text/markdown";

fn obj_schema(properties: Value, required: &[&str]) -> Value {
    json!({ "type": "object", "properties": properties, "required": required })
}

pub struct DriveRegistry {
    resolver: Arc<dyn AuthResolver>,
}

impl DriveRegistry {
    pub fn new(resolver: Arc<dyn AuthResolver>) -> Self {
        Self { resolver }
    }

    async fn client(&self, user_id: &str) -> Result<RestClient, CallToolResult> {
        let token = self
            .resolver
            .resolve(user_id, Provider::Google)
            .await
            .map_err(|e| CallToolResult::error(format!("google auth failed: {e}")))?;
        Ok(RestClient::new(BASE_URL, token))
    }
}

#[async_trait::async_trait]
impl ProviderRegistry for DriveRegistry {
    fn name(&self) -> &'static str {
        "drive"
    }

    fn list_tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: "read_file".into(),
                description: "Read a file's contents, exporting Google Docs to Markdown".into(),
                input_schema: obj_schema(json!({ "file_id": {"type": "string"} }), &["file_id"]),
            },
            Tool {
                name: "write_file".into(),
                description: "Create a file with the given content".into(),
                input_schema: obj_schema(
                    json!({ "name": {"type": "string"}, "content": {"type": "string"}, "parent_id": {"type": "string"} }),
                    &["name", "content"],
                ),
            },
            Tool {
                name: "list_files".into(),
                description: "List files in a folder".into(),
                input_schema: obj_schema(json!({ "parent_id": {"type": "string"} }), &[]),
            },
            Tool {
                name: "search".into(),
                description: "Search files by name or content".into(),
                input_schema: obj_schema(json!({ "query": {"type": "string"} }), &["query"]),
            },
            Tool {
                name: "createFolder".into(),
                description: "Create a folder".into(),
                input_schema: obj_schema(
                    json!({ "name": {"type": "string"}, "parent_id": {"type": "string"} }),
                    &["name"],
                ),
            },
            Tool {
                name: "moveItem".into(),
                description: "Move a file or folder to a new parent".into(),
                input_schema: obj_schema(
                    json!({ "file_id": {"type": "string"}, "new_parent_id": {"type": "string"} }),
                    &["file_id", "new_parent_id"],
                ),
            },
            Tool {
                name: "renameItem".into(),
                description: "Rename a file or folder".into(),
                input_schema: obj_schema(
                    json!({ "file_id": {"type": "string"}, "name": {"type": "string"} }),
                    &["file_id", "name"],
                ),
            },
        ]
    }

    async fn call_tool(&self, inner_name: &str, arguments: Value, ctx: &ToolContext) -> CallToolResult {
        let client = match self.client(&ctx.user_id).await {
            Ok(c) => c,
            Err(e) => return e,
        };
        let args = &arguments;

        match inner_name {
            "read_file" => {
                let file_id = match require_str(args, "file_id") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                read_file(&client, file_id).await
            },
            "write_file" => {
                let (name, content) = match (require_str(args, "name"), require_str(args, "content")) {
                    (Ok(n), Ok(c)) => (n, c),
                    (Err(e), _) | (_, Err(e)) => return e,
                };
                let mut metadata = json!({ "name": name });
                if let Some(parent) = optional_str(args, "parent_id") {
                    metadata["parents"] = json!([parent]);
                }
                let body = json!({ "metadata": metadata, "content": content });
                finish(client.post("/files?uploadType=multipart", &body).await)
            },
            "list_files" => {
                let suffix = optional_str(args, "parent_id")
                    .map(|parent| format!("?q='{parent}'+in+parents"))
                    .unwrap_or_default();
                finish(client.get(&format!("/files{suffix}")).await)
            },
            "search" => {
                let query = match require_str(args, "query") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                finish(client.get(&format!("/files?q=fullText+contains+'{query}'")).await)
            },
            "createFolder" => {
                let name = match require_str(args, "name") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let mut body = json!({ "name": name, "mimeType": "application/vnd.google-apps.folder" });
                if let Some(parent) = optional_str(args, "parent_id") {
                    body["parents"] = json!([parent]);
                }
                finish(client.post("/files", &body).await)
            },
            "moveItem" => {
                let (file_id, new_parent_id) =
                    match (require_str(args, "file_id"), require_str(args, "new_parent_id")) {
                        (Ok(f), Ok(p)) => (f, p),
                        (Err(e), _) | (_, Err(e)) => return e,
                    };
                finish(client.patch(&format!("/files/{file_id}?addParents={new_parent_id}"), &json!({})).await)
            },
            "renameItem" => {
                let (file_id, name) = match (require_str(args, "file_id"), require_str(args, "name")) {
                    (Ok(f), Ok(n)) => (f, n),
                    (Err(e), _) | (_, Err(e)) => return e,
                };
                finish(client.patch(&format!("/files/{file_id}"), &json!({ "name": name })).await)
            },
            other => CallToolResult::error(format!("unknown drive tool: {other}")),
        }
    }
}

/// Google Docs have no binary content of their own; they must be exported
/// rather than downloaded (spec.md §4.3, Drive special case).
async fn read_file(client: &RestClient, file_id: &str) -> CallToolResult {
    let meta = match client.get(&format!("/files/{file_id}?fields=mimeType,name")).await {
        Ok(resp) if resp.status.is_success() => resp.body,
        other => return finish(other),
    };
    let mime = meta.get("mimeType").and_then(Value::as_str).unwrap_or_default();
    if mime == GOOGLE_DOC_MIME {
        finish(client.get(&format!("/files/{file_id}/export?mimeType={EXPORT_MIME}")).await)
    } else {
        finish(client.get(&format!("/files/{file_id}?alt=media")).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    struct StaticResolver;

    #[async_trait::async_trait]
    impl AuthResolver for StaticResolver {
        async fn resolve(&self, _user_id: &str, _provider: Provider) -> gw_resolver::Result<Secret<String>> {
            Ok(Secret::new("tok-google".into()))
        }
    }

    fn ctx() -> ToolContext {
        ToolContext { user_id: "jason".into() }
    }

    #[tokio::test]
    async fn read_file_exports_google_docs_as_markdown() {
        let mut server = mockito::Server::new_async().await;
        let _meta = server
            .mock("GET", "/files/doc1?fields=mimeType,name")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"mimeType":"application/vnd.google-apps.document","name":"Notes"}"#)
            .create_async()
            .await;
        let _export = server
            .mock("GET", "/files/doc1/export?mimeType=text/markdown")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r##""# Notes""##)
            .create_async()
            .await;

        let client = RestClient::new(server.url(), Secret::new("tok".into()));
        let result = read_file(&client, "doc1").await;
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn read_file_downloads_non_doc_files_directly() {
        let mut server = mockito::Server::new_async().await;
        let _meta = server
            .mock("GET", "/files/img1?fields=mimeType,name")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"mimeType":"image/png","name":"pic.png"}"#)
            .create_async()
            .await;
        let _download = server
            .mock("GET", "/files/img1?alt=media")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#""binary""#)
            .create_async()
            .await;

        let client = RestClient::new(server.url(), Secret::new("tok".into()));
        let result = read_file(&client, "img1").await;
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn write_file_requires_name_and_content() {
        let registry = DriveRegistry::new(Arc::new(StaticResolver));
        let result = registry.call_tool("write_file", json!({ "name": "x" }), &ctx()).await;
        assert!(result.is_error);
    }

    #[test]
    fn tool_catalog_matches_the_normative_set() {
        let registry = DriveRegistry::new(Arc::new(StaticResolver));
        let names: Vec<_> = registry.list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names.len(), 7);
        assert!(names.contains(&"createFolder".to_string()));
        assert!(names.contains(&"moveItem".to_string()));
        assert!(names.contains(&"renameItem".to_string()));
    }
}
