//! Google Calendar tool handlers (spec.md §4.3 catalog, *Google Calendar*).

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};

use gw_mcp::{CallToolResult, ProviderRegistry, Tool, ToolContext};
use gw_resolver::AuthResolver;
use gw_store::Provider;

use crate::common::{finish, optional_str, require_str, RestClient};

const BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

fn obj_schema(properties: Value, required: &[&str]) -> Value {
    json!({ "type": "object", "properties": properties, "required": required })
}

pub struct CalendarRegistry {
    resolver: Arc<dyn AuthResolver>,
}

impl CalendarRegistry {
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
impl ProviderRegistry for CalendarRegistry {
    fn name(&self) -> &'static str {
        "calendar"
    }

    fn list_tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: "list_calendars".into(),
                description: "List the user's calendars".into(),
                input_schema: obj_schema(json!({}), &[]),
            },
            Tool {
                name: "list_events".into(),
                description: "List events on a calendar".into(),
                input_schema: obj_schema(
                    json!({ "calendar_id": {"type": "string"}, "time_min": {"type": "string"}, "time_max": {"type": "string"} }),
                    &["calendar_id"],
                ),
            },
            Tool {
                name: "get_event".into(),
                description: "Get a single event".into(),
                input_schema: obj_schema(
                    json!({ "calendar_id": {"type": "string"}, "event_id": {"type": "string"} }),
                    &["calendar_id", "event_id"],
                ),
            },
            Tool {
                name: "create_event".into(),
                description: "Create an event".into(),
                input_schema: obj_schema(
                    json!({ "calendar_id": {"type": "string"}, "summary": {"type": "string"}, "start": {"type": "string"}, "end": {"type": "string"} }),
                    &["calendar_id", "summary", "start", "end"],
                ),
            },
            Tool {
                name: "update_event".into(),
                description: "Update an event".into(),
                input_schema: obj_schema(
                    json!({ "calendar_id": {"type": "string"}, "event_id": {"type": "string"}, "summary": {"type": "string"}, "start": {"type": "string"}, "end": {"type": "string"} }),
                    &["calendar_id", "event_id"],
                ),
            },
            Tool {
                name: "delete_event".into(),
                description: "Delete an event".into(),
                input_schema: obj_schema(
                    json!({ "calendar_id": {"type": "string"}, "event_id": {"type": "string"} }),
                    &["calendar_id", "event_id"],
                ),
            },
            Tool {
                name: "search_events".into(),
                description: "Search events by text".into(),
                input_schema: obj_schema(
                    json!({ "calendar_id": {"type": "string"}, "query": {"type": "string"} }),
                    &["calendar_id", "query"],
                ),
            },
            Tool {
                name: "respond_to_event".into(),
                description: "Set the user's RSVP on an event".into(),
                input_schema: obj_schema(
                    json!({ "calendar_id": {"type": "string"}, "event_id": {"type": "string"}, "response": {"type": "string"} }),
                    &["calendar_id", "event_id", "response"],
                ),
            },
            Tool {
                name: "get_freebusy".into(),
                description: "Query free/busy status across calendars".into(),
                input_schema: obj_schema(
                    json!({ "calendar_ids": {"type": "array"}, "time_min": {"type": "string"}, "time_max": {"type": "string"} }),
                    &["calendar_ids", "time_min", "time_max"],
                ),
            },
            Tool {
                name: "get_current_time".into(),
                description: "Return the gateway's current UTC time".into(),
                input_schema: obj_schema(json!({}), &[]),
            },
            Tool {
                name: "list_colors".into(),
                description: "List the calendar color palette".into(),
                input_schema: obj_schema(json!({}), &[]),
            },
            Tool {
                name: "manage_accounts".into(),
                description: "Report which account this deployment is authorized as".into(),
                input_schema: obj_schema(json!({}), &[]),
            },
        ]
    }

    async fn call_tool(&self, inner_name: &str, arguments: Value, ctx: &ToolContext) -> CallToolResult {
        if inner_name == "get_current_time" {
            return CallToolResult::ok(Utc::now().to_rfc3339());
        }
        if inner_name == "manage_accounts" {
            return CallToolResult::ok(format!("authorized as {}", ctx.user_id));
        }

        let client = match self.client(&ctx.user_id).await {
            Ok(c) => c,
            Err(e) => return e,
        };
        let args = &arguments;

        match inner_name {
            "list_calendars" => finish(client.get("/users/me/calendarList").await),
            "list_events" => {
                let calendar_id = match require_str(args, "calendar_id") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let mut query = Vec::new();
                if let Some(v) = optional_str(args, "time_min") {
                    query.push(format!("timeMin={v}"));
                }
                if let Some(v) = optional_str(args, "time_max") {
                    query.push(format!("timeMax={v}"));
                }
                let suffix = if query.is_empty() { String::new() } else { format!("?{}", query.join("&")) };
                finish(client.get(&format!("/calendars/{calendar_id}/events{suffix}")).await)
            },
            "get_event" => {
                let (calendar_id, event_id) = match calendar_event(args) {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                finish(client.get(&format!("/calendars/{calendar_id}/events/{event_id}")).await)
            },
            "create_event" => {
                let calendar_id = match require_str(args, "calendar_id") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let (summary, start, end) = match (require_str(args, "summary"), require_str(args, "start"), require_str(args, "end")) {
                    (Ok(s), Ok(st), Ok(en)) => (s, st, en),
                    (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => return e,
                };
                let body = json!({
                    "summary": summary,
                    "start": { "dateTime": start },
                    "end": { "dateTime": end },
                });
                finish(client.post(&format!("/calendars/{calendar_id}/events"), &body).await)
            },
            "update_event" => {
                let (calendar_id, event_id) = match calendar_event(args) {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let mut body = json!({});
                if let Some(v) = optional_str(args, "summary") {
                    body["summary"] = json!(v);
                }
                if let Some(v) = optional_str(args, "start") {
                    body["start"] = json!({ "dateTime": v });
                }
                if let Some(v) = optional_str(args, "end") {
                    body["end"] = json!({ "dateTime": v });
                }
                finish(client.patch(&format!("/calendars/{calendar_id}/events/{event_id}"), &body).await)
            },
            "delete_event" => {
                let (calendar_id, event_id) = match calendar_event(args) {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                finish(client.delete(&format!("/calendars/{calendar_id}/events/{event_id}")).await)
            },
            "search_events" => {
                let calendar_id = match require_str(args, "calendar_id") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let query = match require_str(args, "query") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                finish(client.get(&format!("/calendars/{calendar_id}/events?q={query}")).await)
            },
            "respond_to_event" => {
                let (calendar_id, event_id) = match calendar_event(args) {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let response = match require_str(args, "response") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let body = json!({ "attendees": [{ "self": true, "responseStatus": response }] });
                finish(client.patch(&format!("/calendars/{calendar_id}/events/{event_id}"), &body).await)
            },
            "get_freebusy" => {
                let Some(ids) = args.get("calendar_ids").and_then(Value::as_array) else {
                    return CallToolResult::error("argument calendar_ids is required");
                };
                let (time_min, time_max) = match (require_str(args, "time_min"), require_str(args, "time_max")) {
                    (Ok(a), Ok(b)) => (a, b),
                    (Err(e), _) | (_, Err(e)) => return e,
                };
                let items: Vec<Value> = ids.iter().map(|id| json!({ "id": id })).collect();
                let body = json!({ "timeMin": time_min, "timeMax": time_max, "items": items });
                finish(client.post("/freeBusy", &body).await)
            },
            "list_colors" => finish(client.get("/colors").await),
            other => CallToolResult::error(format!("unknown calendar tool: {other}")),
        }
    }
}

fn calendar_event(args: &Value) -> Result<(&str, &str), CallToolResult> {
    Ok((require_str(args, "calendar_id")?, require_str(args, "event_id")?))
}
