//! GitHub tool handlers (spec.md §4.3 catalog, *GitHub*).
//!
//! Four of the catalog's tools (`actions_list`, `actions_get`,
//! `actions_run_trigger`, `get_job_logs`) are consolidated-method tools:
//! each accepts a `method` discriminator and dispatches flat, not nested
//! (spec.md §4.3 "Consolidated-method pattern").

use std::sync::Arc;

use serde_json::{Value, json};

use gw_mcp::{CallToolResult, ProviderRegistry, Tool, ToolContext};
use gw_resolver::AuthResolver;
use gw_store::Provider;

use crate::common::{finish, require_str, optional_str, RestClient};

const BASE_URL: &str = "https://api.github.com";

fn obj_schema(properties: Value, required: &[&str]) -> Value {
    json!({ "type": "object", "properties": properties, "required": required })
}

pub struct GithubRegistry {
    resolver: Arc<dyn AuthResolver>,
}

impl GithubRegistry {
    pub fn new(resolver: Arc<dyn AuthResolver>) -> Self {
        Self { resolver }
    }

    async fn client(&self, user_id: &str) -> Result<RestClient, CallToolResult> {
        let token = self
            .resolver
            .resolve(user_id, Provider::Github)
            .await
            .map_err(|e| CallToolResult::error(format!("github auth failed: {e}")))?;
        Ok(RestClient::new(BASE_URL, token))
    }
}

#[async_trait::async_trait]
impl ProviderRegistry for GithubRegistry {
    fn name(&self) -> &'static str {
        "github"
    }

    fn list_tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: "create_issue".into(),
                description: "Create an issue in a GitHub repository".into(),
                input_schema: obj_schema(
                    json!({ "owner": {"type": "string"}, "repo": {"type": "string"}, "title": {"type": "string"}, "body": {"type": "string"} }),
                    &["owner", "repo", "title"],
                ),
            },
            Tool {
                name: "list_issues".into(),
                description: "List issues in a repository".into(),
                input_schema: obj_schema(
                    json!({ "owner": {"type": "string"}, "repo": {"type": "string"}, "state": {"type": "string"} }),
                    &["owner", "repo"],
                ),
            },
            Tool {
                name: "get_issue".into(),
                description: "Get a single issue".into(),
                input_schema: obj_schema(
                    json!({ "owner": {"type": "string"}, "repo": {"type": "string"}, "issue_number": {"type": "integer"} }),
                    &["owner", "repo", "issue_number"],
                ),
            },
            Tool {
                name: "update_issue".into(),
                description: "Update an issue's fields".into(),
                input_schema: obj_schema(
                    json!({ "owner": {"type": "string"}, "repo": {"type": "string"}, "issue_number": {"type": "integer"}, "title": {"type": "string"}, "body": {"type": "string"}, "state": {"type": "string"} }),
                    &["owner", "repo", "issue_number"],
                ),
            },
            Tool {
                name: "add_issue_comment".into(),
                description: "Add a comment to an issue".into(),
                input_schema: obj_schema(
                    json!({ "owner": {"type": "string"}, "repo": {"type": "string"}, "issue_number": {"type": "integer"}, "body": {"type": "string"} }),
                    &["owner", "repo", "issue_number", "body"],
                ),
            },
            Tool {
                name: "list_repos".into(),
                description: "List repositories for the authenticated user".into(),
                input_schema: obj_schema(json!({}), &[]),
            },
            Tool {
                name: "get_repo".into(),
                description: "Get repository metadata".into(),
                input_schema: obj_schema(json!({ "owner": {"type": "string"}, "repo": {"type": "string"} }), &["owner", "repo"]),
            },
            Tool {
                name: "create_pr".into(),
                description: "Create a pull request".into(),
                input_schema: obj_schema(
                    json!({ "owner": {"type": "string"}, "repo": {"type": "string"}, "title": {"type": "string"}, "head": {"type": "string"}, "base": {"type": "string"}, "body": {"type": "string"} }),
                    &["owner", "repo", "title", "head", "base"],
                ),
            },
            Tool {
                name: "list_pull_requests".into(),
                description: "List pull requests".into(),
                input_schema: obj_schema(json!({ "owner": {"type": "string"}, "repo": {"type": "string"}, "state": {"type": "string"} }), &["owner", "repo"]),
            },
            Tool {
                name: "get_pull_request".into(),
                description: "Get a single pull request".into(),
                input_schema: obj_schema(
                    json!({ "owner": {"type": "string"}, "repo": {"type": "string"}, "pull_number": {"type": "integer"} }),
                    &["owner", "repo", "pull_number"],
                ),
            },
            Tool {
                name: "merge_pull_request".into(),
                description: "Merge a pull request".into(),
                input_schema: obj_schema(
                    json!({ "owner": {"type": "string"}, "repo": {"type": "string"}, "pull_number": {"type": "integer"}, "merge_method": {"type": "string"} }),
                    &["owner", "repo", "pull_number"],
                ),
            },
            Tool {
                name: "actions_list".into(),
                description: "List/dispatch operations against GitHub Actions (method: workflows|runs)".into(),
                input_schema: obj_schema(
                    json!({ "owner": {"type": "string"}, "repo": {"type": "string"}, "method": {"type": "string"} }),
                    &["owner", "repo", "method"],
                ),
            },
            Tool {
                name: "actions_get".into(),
                description: "Get a single workflow or run (method: workflow|run)".into(),
                input_schema: obj_schema(
                    json!({ "owner": {"type": "string"}, "repo": {"type": "string"}, "method": {"type": "string"}, "id": {"type": "integer"} }),
                    &["owner", "repo", "method", "id"],
                ),
            },
            Tool {
                name: "actions_run_trigger".into(),
                description: "Trigger or cancel a workflow run (method: dispatch|rerun|cancel)".into(),
                input_schema: obj_schema(
                    json!({ "owner": {"type": "string"}, "repo": {"type": "string"}, "method": {"type": "string"}, "workflow_id": {"type": "string"}, "run_id": {"type": "integer"}, "ref": {"type": "string"} }),
                    &["owner", "repo", "method"],
                ),
            },
            Tool {
                name: "get_job_logs".into(),
                description: "Fetch logs for a job or run (method: job|run)".into(),
                input_schema: obj_schema(
                    json!({ "owner": {"type": "string"}, "repo": {"type": "string"}, "method": {"type": "string"}, "id": {"type": "integer"} }),
                    &["owner", "repo", "method", "id"],
                ),
            },
            Tool {
                name: "get_file_contents".into(),
                description: "Read a file's contents from a repository".into(),
                input_schema: obj_schema(
                    json!({ "owner": {"type": "string"}, "repo": {"type": "string"}, "path": {"type": "string"}, "ref": {"type": "string"} }),
                    &["owner", "repo", "path"],
                ),
            },
            Tool {
                name: "list_directory".into(),
                description: "List the contents of a directory".into(),
                input_schema: obj_schema(
                    json!({ "owner": {"type": "string"}, "repo": {"type": "string"}, "path": {"type": "string"} }),
                    &["owner", "repo", "path"],
                ),
            },
            Tool {
                name: "create_or_update_file".into(),
                description: "Create or update a file via the contents API".into(),
                input_schema: obj_schema(
                    json!({ "owner": {"type": "string"}, "repo": {"type": "string"}, "path": {"type": "string"}, "content": {"type": "string"}, "message": {"type": "string"}, "sha": {"type": "string"} }),
                    &["owner", "repo", "path", "content", "message"],
                ),
            },
            Tool {
                name: "delete_file".into(),
                description: "Delete a file via the contents API".into(),
                input_schema: obj_schema(
                    json!({ "owner": {"type": "string"}, "repo": {"type": "string"}, "path": {"type": "string"}, "message": {"type": "string"}, "sha": {"type": "string"} }),
                    &["owner", "repo", "path", "message", "sha"],
                ),
            },
            Tool {
                name: "list_commits".into(),
                description: "List commits".into(),
                input_schema: obj_schema(json!({ "owner": {"type": "string"}, "repo": {"type": "string"}, "sha": {"type": "string"} }), &["owner", "repo"]),
            },
            Tool {
                name: "get_commit".into(),
                description: "Get a single commit".into(),
                input_schema: obj_schema(json!({ "owner": {"type": "string"}, "repo": {"type": "string"}, "sha": {"type": "string"} }), &["owner", "repo", "sha"]),
            },
            Tool {
                name: "compare_commits".into(),
                description: "Compare two commits or refs".into(),
                input_schema: obj_schema(
                    json!({ "owner": {"type": "string"}, "repo": {"type": "string"}, "base": {"type": "string"}, "head": {"type": "string"} }),
                    &["owner", "repo", "base", "head"],
                ),
            },
            Tool {
                name: "get_commit_diff".into(),
                description: "Get a commit's unified diff".into(),
                input_schema: obj_schema(json!({ "owner": {"type": "string"}, "repo": {"type": "string"}, "sha": {"type": "string"} }), &["owner", "repo", "sha"]),
            },
            Tool {
                name: "get_pull_request_diff".into(),
                description: "Get a pull request's unified diff".into(),
                input_schema: obj_schema(
                    json!({ "owner": {"type": "string"}, "repo": {"type": "string"}, "pull_number": {"type": "integer"} }),
                    &["owner", "repo", "pull_number"],
                ),
            },
            Tool {
                name: "search_code".into(),
                description: "Search code across GitHub".into(),
                input_schema: obj_schema(json!({ "query": {"type": "string"} }), &["query"]),
            },
            Tool {
                name: "get_file_tree".into(),
                description: "Get a repository's recursive file tree".into(),
                input_schema: obj_schema(json!({ "owner": {"type": "string"}, "repo": {"type": "string"}, "tree_sha": {"type": "string"} }), &["owner", "repo"]),
            },
            Tool {
                name: "get_raw_file_url".into(),
                description: "Build the raw.githubusercontent.com URL for a file".into(),
                input_schema: obj_schema(
                    json!({ "owner": {"type": "string"}, "repo": {"type": "string"}, "path": {"type": "string"}, "ref": {"type": "string"} }),
                    &["owner", "repo", "path"],
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
            "create_issue" => {
                let (owner, repo) = match owner_repo(args) {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let title = match require_str(args, "title") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let mut body = json!({ "title": title });
                if let Some(b) = optional_str(args, "body") {
                    body["body"] = json!(b);
                }
                finish(client.post(&format!("/repos/{owner}/{repo}/issues"), &body).await)
            },
            "list_issues" => {
                let (owner, repo) = match owner_repo(args) {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let state = optional_str(args, "state").unwrap_or("open");
                finish(client.get(&format!("/repos/{owner}/{repo}/issues?state={state}")).await)
            },
            "get_issue" => {
                let (owner, repo) = match owner_repo(args) {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let Some(number) = args.get("issue_number").and_then(Value::as_i64) else {
                    return CallToolResult::error("argument issue_number is required");
                };
                finish(client.get(&format!("/repos/{owner}/{repo}/issues/{number}")).await)
            },
            "update_issue" => {
                let (owner, repo) = match owner_repo(args) {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let Some(number) = args.get("issue_number").and_then(Value::as_i64) else {
                    return CallToolResult::error("argument issue_number is required");
                };
                let mut body = json!({});
                for key in ["title", "body", "state"] {
                    if let Some(v) = optional_str(args, key) {
                        body[key] = json!(v);
                    }
                }
                finish(client.patch(&format!("/repos/{owner}/{repo}/issues/{number}"), &body).await)
            },
            "add_issue_comment" => {
                let (owner, repo) = match owner_repo(args) {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let Some(number) = args.get("issue_number").and_then(Value::as_i64) else {
                    return CallToolResult::error("argument issue_number is required");
                };
                let comment_body = match require_str(args, "body") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                finish(
                    client
                        .post(&format!("/repos/{owner}/{repo}/issues/{number}/comments"), &json!({ "body": comment_body }))
                        .await,
                )
            },
            "list_repos" => finish(client.get("/user/repos").await),
            "get_repo" => {
                let (owner, repo) = match owner_repo(args) {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                finish(client.get(&format!("/repos/{owner}/{repo}")).await)
            },
            "create_pr" => {
                let (owner, repo) = match owner_repo(args) {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let (title, head, base) = match (require_str(args, "title"), require_str(args, "head"), require_str(args, "base")) {
                    (Ok(t), Ok(h), Ok(b)) => (t, h, b),
                    (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => return e,
                };
                let mut body = json!({ "title": title, "head": head, "base": base });
                if let Some(b) = optional_str(args, "body") {
                    body["body"] = json!(b);
                }
                finish(client.post(&format!("/repos/{owner}/{repo}/pulls"), &body).await)
            },
            "list_pull_requests" => {
                let (owner, repo) = match owner_repo(args) {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let state = optional_str(args, "state").unwrap_or("open");
                finish(client.get(&format!("/repos/{owner}/{repo}/pulls?state={state}")).await)
            },
            "get_pull_request" => {
                let (owner, repo, number) = match pr_number(args) {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                finish(client.get(&format!("/repos/{owner}/{repo}/pulls/{number}")).await)
            },
            "merge_pull_request" => {
                let (owner, repo, number) = match pr_number(args) {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let mut body = json!({});
                if let Some(m) = optional_str(args, "merge_method") {
                    body["merge_method"] = json!(m);
                }
                finish(client.put(&format!("/repos/{owner}/{repo}/pulls/{number}/merge"), &body).await)
            },
            "actions_list" => actions_list(&client, args).await,
            "actions_get" => actions_get(&client, args).await,
            "actions_run_trigger" => actions_run_trigger(&client, args).await,
            "get_job_logs" => get_job_logs(&client, args).await,
            "get_file_contents" => {
                let (owner, repo) = match owner_repo(args) {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let path = match require_str(args, "path") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let mut url = format!("/repos/{owner}/{repo}/contents/{path}");
                if let Some(r) = optional_str(args, "ref") {
                    url.push_str(&format!("?ref={r}"));
                }
                finish(client.get(&url).await)
            },
            "list_directory" => {
                let (owner, repo) = match owner_repo(args) {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let path = match require_str(args, "path") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                finish(client.get(&format!("/repos/{owner}/{repo}/contents/{path}")).await)
            },
            "create_or_update_file" => {
                let (owner, repo) = match owner_repo(args) {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let (path, content, message) =
                    match (require_str(args, "path"), require_str(args, "content"), require_str(args, "message")) {
                        (Ok(p), Ok(c), Ok(m)) => (p, c, m),
                        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => return e,
                    };
                let mut body = json!({ "message": message, "content": content });
                if let Some(sha) = optional_str(args, "sha") {
                    body["sha"] = json!(sha);
                }
                finish(client.put(&format!("/repos/{owner}/{repo}/contents/{path}"), &body).await)
            },
            "delete_file" => {
                let (owner, repo) = match owner_repo(args) {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let (path, message, sha) = match (require_str(args, "path"), require_str(args, "message"), require_str(args, "sha")) {
                    (Ok(p), Ok(m), Ok(s)) => (p, m, s),
                    (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => return e,
                };
                let body = json!({ "message": message, "sha": sha });
                finish(client.delete_with_body(&format!("/repos/{owner}/{repo}/contents/{path}"), &body).await)
            },
            "list_commits" => {
                let (owner, repo) = match owner_repo(args) {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let mut url = format!("/repos/{owner}/{repo}/commits");
                if let Some(sha) = optional_str(args, "sha") {
                    url.push_str(&format!("?sha={sha}"));
                }
                finish(client.get(&url).await)
            },
            "get_commit" => {
                let (owner, repo) = match owner_repo(args) {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let sha = match require_str(args, "sha") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                finish(client.get(&format!("/repos/{owner}/{repo}/commits/{sha}")).await)
            },
            "compare_commits" => {
                let (owner, repo) = match owner_repo(args) {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let (base, head) = match (require_str(args, "base"), require_str(args, "head")) {
                    (Ok(b), Ok(h)) => (b, h),
                    (Err(e), _) | (_, Err(e)) => return e,
                };
                finish(client.get(&format!("/repos/{owner}/{repo}/compare/{base}...{head}")).await)
            },
            "get_commit_diff" => {
                let (owner, repo) = match owner_repo(args) {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let sha = match require_str(args, "sha") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                finish(client.get(&format!("/repos/{owner}/{repo}/commits/{sha}.diff")).await)
            },
            "get_pull_request_diff" => {
                let (owner, repo, number) = match pr_number(args) {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                finish(client.get(&format!("/repos/{owner}/{repo}/pulls/{number}.diff")).await)
            },
            "search_code" => {
                let query = match require_str(args, "query") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                finish(client.get(&format!("/search/code?q={}", urlencoding_lite(query))).await)
            },
            "get_file_tree" => {
                let (owner, repo) = match owner_repo(args) {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let tree_sha = optional_str(args, "tree_sha").unwrap_or("HEAD");
                finish(client.get(&format!("/repos/{owner}/{repo}/git/trees/{tree_sha}?recursive=1")).await)
            },
            "get_raw_file_url" => {
                let (owner, repo) = match owner_repo(args) {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let path = match require_str(args, "path") {
                    Ok(v) => v,
                    Err(e) => return e,
                };
                let git_ref = optional_str(args, "ref").unwrap_or("HEAD");
                CallToolResult::ok(format!("https://raw.githubusercontent.com/{owner}/{repo}/{git_ref}/{path}"))
            },
            other => CallToolResult::error(format!("unknown github tool: {other}")),
        }
    }
}

fn owner_repo(args: &Value) -> Result<(&str, &str), CallToolResult> {
    Ok((require_str(args, "owner")?, require_str(args, "repo")?))
}

fn pr_number(args: &Value) -> Result<(&str, &str, i64), CallToolResult> {
    let owner = require_str(args, "owner")?;
    let repo = require_str(args, "repo")?;
    let number = args
        .get("pull_number")
        .and_then(Value::as_i64)
        .ok_or_else(|| CallToolResult::error("argument pull_number is required"))?;
    Ok((owner, repo, number))
}

fn urlencoding_lite(s: &str) -> String {
    s.replace(' ', "+")
}

async fn actions_list(client: &RestClient, args: &Value) -> CallToolResult {
    let (owner, repo) = match owner_repo(args) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let method = match require_str(args, "method") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let path = match method {
        "workflows" => format!("/repos/{owner}/{repo}/actions/workflows"),
        "runs" => format!("/repos/{owner}/{repo}/actions/runs"),
        other => return CallToolResult::error(format!("unknown method: {other}")),
    };
    finish(client.get(&path).await)
}

async fn actions_get(client: &RestClient, args: &Value) -> CallToolResult {
    let (owner, repo) = match owner_repo(args) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let method = match require_str(args, "method") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(id) = args.get("id").and_then(Value::as_i64) else {
        return CallToolResult::error("argument id is required");
    };
    let path = match method {
        "workflow" => format!("/repos/{owner}/{repo}/actions/workflows/{id}"),
        "run" => format!("/repos/{owner}/{repo}/actions/runs/{id}"),
        other => return CallToolResult::error(format!("unknown method: {other}")),
    };
    finish(client.get(&path).await)
}

async fn actions_run_trigger(client: &RestClient, args: &Value) -> CallToolResult {
    let (owner, repo) = match owner_repo(args) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let method = match require_str(args, "method") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match method {
        "dispatch" => {
            let workflow_id = match require_str(args, "workflow_id") {
                Ok(v) => v,
                Err(e) => return e,
            };
            let git_ref = optional_str(args, "ref").unwrap_or("main");
            finish(
                client
                    .post(&format!("/repos/{owner}/{repo}/actions/workflows/{workflow_id}/dispatches"), &json!({ "ref": git_ref }))
                    .await,
            )
        },
        "rerun" => {
            let Some(run_id) = args.get("run_id").and_then(Value::as_i64) else {
                return CallToolResult::error("argument run_id is required");
            };
            finish(client.post(&format!("/repos/{owner}/{repo}/actions/runs/{run_id}/rerun"), &json!({})).await)
        },
        "cancel" => {
            let Some(run_id) = args.get("run_id").and_then(Value::as_i64) else {
                return CallToolResult::error("argument run_id is required");
            };
            finish(client.post(&format!("/repos/{owner}/{repo}/actions/runs/{run_id}/cancel"), &json!({})).await)
        },
        other => CallToolResult::error(format!("unknown method: {other}")),
    }
}

async fn get_job_logs(client: &RestClient, args: &Value) -> CallToolResult {
    let (owner, repo) = match owner_repo(args) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let method = match require_str(args, "method") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(id) = args.get("id").and_then(Value::as_i64) else {
        return CallToolResult::error("argument id is required");
    };
    let path = match method {
        "job" => format!("/repos/{owner}/{repo}/actions/jobs/{id}/logs"),
        "run" => format!("/repos/{owner}/{repo}/actions/runs/{id}/logs"),
        other => return CallToolResult::error(format!("unknown method: {other}")),
    };
    finish(client.get(&path).await)
}
