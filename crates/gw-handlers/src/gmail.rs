//! Gmail tool handlers (spec.md §4.3 catalog, *Gmail*). The
//! `extract_dates_from_email` special-case algorithm lives in
//! [`crate::date_extraction`].

use std::sync::Arc;

use secrecy::Secret;
use serde_json::{Value, json};

use gw_mcp::{CallToolResult, ProviderRegistry, Tool, ToolContext};
use gw_resolver::AuthResolver;
use gw_store::Provider;

use crate::common::{finish, optional_array, optional_str, require_str, RestClient};
use crate::date_extraction;
use crate::rfc822::{self, MessageParts};

const BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

fn obj_schema(properties: Value, required: &[&str]) -> Value {
    json!({ "type": "object", "properties": properties, "required": required })
}

pub struct GmailRegistry {
    resolver: Arc<dyn AuthResolver>,
    anthropic_api_key: Option<Secret<String>>,
}

impl GmailRegistry {
    pub fn new(resolver: Arc<dyn AuthResolver>, anthropic_api_key: Option<Secret<String>>) -> Self {
        Self { resolver, anthropic_api_key }
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
impl ProviderRegistry for GmailRegistry {
    fn name(&self) -> &'static str {
        "gmail"
    }

    fn list_tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: "search_emails".into(),
                description: "Search messages with a Gmail query".into(),
                input_schema: obj_schema(json!({ "query": {"type": "string"} }), &["query"]),
            },
            Tool {
                name: "read_email".into(),
                description: "Read a message in full".into(),
                input_schema: obj_schema(json!({ "message_id": {"type": "string"} }), &["message_id"]),
            },
            Tool {
                name: "send_email".into(),
                description: "Send a new email".into(),
                input_schema: obj_schema(
                    json!({ "to": {"type": "string"}, "subject": {"type": "string"}, "body": {"type": "string"} }),
                    &["to", "subject", "body"],
                ),
            },
            Tool {
                name: "draft_email".into(),
                description: "Save a draft".into(),
                input_schema: obj_schema(
                    json!({ "to": {"type": "string"}, "subject": {"type": "string"}, "body": {"type": "string"} }),
                    &["to", "subject", "body"],
                ),
            },
            Tool {
                name: "modify_email".into(),
                description: "Add or remove labels on a message".into(),
                input_schema: obj_schema(
                    json!({ "message_id": {"type": "string"}, "add_labels": {"type": "array"}, "remove_labels": {"type": "array"} }),
                    &["message_id"],
                ),
            },
            Tool {
                name: "list_labels".into(),
                description: "List labels".into(),
                input_schema: obj_schema(json!({}), &[]),
            },
            Tool {
                name: "create_label".into(),
                description: "Create a label".into(),
                input_schema: obj_schema(json!({ "name": {"type": "string"} }), &["name"]),
            },
            Tool {
                name: "update_label".into(),
                description: "Rename or restyle a label".into(),
                input_schema: obj_schema(
                    json!({ "label_id": {"type": "string"}, "name": {"type": "string"} }),
                    &["label_id"],
                ),
            },
            Tool {
                name: "delete_label".into(),
                description: "Delete a label".into(),
                input_schema: obj_schema(json!({ "label_id": {"type": "string"} }), &["label_id"]),
            },
            Tool {
                name: "get_or_create_label".into(),
                description: "Look up a label by name, creating it if absent".into(),
                input_schema: obj_schema(json!({ "name": {"type": "string"} }), &["name"]),
            },
            Tool {
                name: "list_filters".into(),
                description: "List mail filters".into(),
                input_schema: obj_schema(json!({}), &[]),
            },
            Tool {
                name: "create_filter".into(),
                description: "Create a mail filter".into(),
                input_schema: obj_schema(
                    json!({ "criteria": {"type": "object"}, "action": {"type": "object"} }),
                    &["criteria", "action"],
                ),
            },
            Tool {
                name: "get_filter".into(),
                description: "Get a mail filter".into(),
                input_schema: obj_schema(json!({ "filter_id": {"type": "string"} }), &["filter_id"]),
            },
            Tool {
                name: "delete_filter".into(),
                description: "Delete a mail filter".into(),
                input_schema: obj_schema(json!({ "filter_id": {"type": "string"} }), &["filter_id"]),
            },
            Tool {
                name: "create_filter_from_template".into(),
                description: "Create a mail filter from a named template".into(),
                input_schema: obj_schema(
                    json!({ "template": {"type": "string"}, "from": {"type": "string"}, "label_id": {"type": "string"} }),
                    &["template"],
                ),
            },
            Tool {
                name: "extract_dates_from_email".into(),
                description: "Extract calendar-relevant dates from a message, by AI when available, else by regex".into(),
                input_schema: obj_schema(json!({ "message_id": {"type": "string"} }), &["message_id"]),
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
            "search_emails" => {
                let query = match require_str(args, "query") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                finish(client.get(&format!("/messages?q={query}")).await)
            },
            "read_email" => {
                let message_id = match require_str(args, "message_id") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                finish(client.get(&format!("/messages/{message_id}?format=full")).await)
            },
            "send_email" => send_or_draft(&client, args, false).await,
            "draft_email" => send_or_draft(&client, args, true).await,
            "modify_email" => {
                let message_id = match require_str(args, "message_id") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let add = optional_array(args, "add_labels").unwrap_or(&[]).to_vec();
                let remove = optional_array(args, "remove_labels").unwrap_or(&[]).to_vec();
                let body = json!({ "addLabelIds": add, "removeLabelIds": remove });
                finish(client.post(&format!("/messages/{message_id}/modify"), &body).await)
            },
            "list_labels" => finish(client.get("/labels").await),
            "create_label" => {
                let name = match require_str(args, "name") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                finish(client.post("/labels", &json!({ "name": name })).await)
            },
            "update_label" => {
                let label_id = match require_str(args, "label_id") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let mut body = json!({});
                if let Some(name) = optional_str(args, "name") {
                    body["name"] = json!(name);
                }
                finish(client.put(&format!("/labels/{label_id}"), &body).await)
            },
            "delete_label" => {
                let label_id = match require_str(args, "label_id") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                finish(client.delete(&format!("/labels/{label_id}")).await)
            },
            "get_or_create_label" => {
                let name = match require_str(args, "name") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                get_or_create_label(&client, name).await
            },
            "list_filters" => finish(client.get("/settings/filters").await),
            "create_filter" => {
                let Some(criteria) = args.get("criteria") else {
                    return CallToolResult::error("argument criteria is required");
                };
                let Some(action) = args.get("action") else {
                    return CallToolResult::error("argument action is required");
                };
                finish(client.post("/settings/filters", &json!({ "criteria": criteria, "action": action })).await)
            },
            "get_filter" => {
                let filter_id = match require_str(args, "filter_id") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                finish(client.get(&format!("/settings/filters/{filter_id}")).await)
            },
            "delete_filter" => {
                let filter_id = match require_str(args, "filter_id") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                finish(client.delete(&format!("/settings/filters/{filter_id}")).await)
            },
            "create_filter_from_template" => create_filter_from_template(&client, args).await,
            "extract_dates_from_email" => {
                let message_id = match require_str(args, "message_id") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                date_extraction::extract_dates_from_email(&client, self.anthropic_api_key.as_ref(), message_id).await
            },
            other => CallToolResult::error(format!("unknown gmail tool: {other}")),
        }
    }
}

async fn send_or_draft(client: &RestClient, args: &Value, as_draft: bool) -> CallToolResult {
    let (to, subject, body) = match (require_str(args, "to"), require_str(args, "subject"), require_str(args, "body")) {
        (Ok(t), Ok(s), Ok(b)) => (t, s, b),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => return e,
    };
    let parts = MessageParts {
        from: None,
        to,
        cc: optional_str(args, "cc"),
        bcc: optional_str(args, "bcc"),
        subject,
        body_text: body,
        body_html: optional_str(args, "html_body"),
        attachments: &[],
    };
    let raw = rfc822::build_raw(&parts);
    if as_draft {
        finish(client.post("/drafts", &json!({ "message": { "raw": raw } })).await)
    } else {
        finish(client.post("/messages/send", &json!({ "raw": raw })).await)
    }
}

async fn get_or_create_label(client: &RestClient, name: &str) -> CallToolResult {
    let existing = match client.get("/labels").await {
        Ok(resp) if resp.status.is_success() => resp.body,
        other => return finish(other),
    };
    let found = existing
        .get("labels")
        .and_then(Value::as_array)
        .and_then(|labels| labels.iter().find(|l| l.get("name").and_then(Value::as_str) == Some(name)));
    if let Some(label) = found {
        return CallToolResult::ok(serde_json::to_string_pretty(label).unwrap_or_default());
    }
    finish(client.post("/labels", &json!({ "name": name })).await)
}

/// Shortcuts for common filter shapes, so callers don't have to know the
/// Gmail API's raw `criteria`/`action` object layout.
async fn create_filter_from_template(client: &RestClient, args: &Value) -> CallToolResult {
    let template = match require_str(args, "template") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let (criteria, action) = match template {
        "label_sender" => {
            let from = match require_str(args, "from") {
                Ok(v) => v,
                Err(e) => return e,
            };
            let label_id = match require_str(args, "label_id") {
                Ok(v) => v,
                Err(e) => return e,
            };
            (json!({ "from": from }), json!({ "addLabelIds": [label_id] }))
        },
        "archive_sender" => {
            let from = match require_str(args, "from") {
                Ok(v) => v,
                Err(e) => return e,
            };
            (json!({ "from": from }), json!({ "removeLabelIds": ["INBOX"] }))
        },
        other => return CallToolResult::error(format!("unknown filter template: {other}")),
    };
    finish(client.post("/settings/filters", &json!({ "criteria": criteria, "action": action })).await)
}
