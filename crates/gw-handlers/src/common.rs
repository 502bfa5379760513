//! Shared argument extraction, REST plumbing, and result formatting used
//! by every provider's handlers (spec.md §4.3 "Common contract").

use secrecy::{ExposeSecret, Secret};
use serde_json::Value;

use gw_mcp::CallToolResult;

/// Extract a required string argument, or produce the exact error
/// `CallToolResult` the common contract mandates.
pub fn require_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, CallToolResult> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CallToolResult::error(format!("argument {key} is required")))
}

pub fn optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

pub fn optional_i64(args: &Value, key: &str) -> Option<i64> {
    args.get(key).and_then(Value::as_i64)
}

pub fn optional_bool(args: &Value, key: &str) -> Option<bool> {
    args.get(key).and_then(Value::as_bool)
}

pub fn optional_array<'a>(args: &'a Value, key: &str) -> Option<&'a [Value]> {
    args.get(key).and_then(Value::as_array).map(Vec::as_slice)
}

/// Render an upstream JSON success body as a tool result.
pub fn ok_json(body: &Value) -> CallToolResult {
    CallToolResult::ok(serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string()))
}

/// A handle to one provider's upstream REST API, pre-authorized with a
/// bearer token resolved for this request (spec.md §4.3 step 2-4).
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    token: Secret<String>,
    /// Extra static headers beyond the bearer token, e.g. Supabase's
    /// `apikey` header, which PostgREST requires alongside `Authorization`.
    extra_headers: Vec<(&'static str, Secret<String>)>,
}

/// The upstream responded, successfully or not. Callers turn this into a
/// `CallToolResult` with [`into_result`](UpstreamResponse::into_result).
pub struct UpstreamResponse {
    pub status: reqwest::StatusCode,
    pub body: Value,
}

impl UpstreamResponse {
    /// 2xx → success result; 4xx/5xx → error result with the upstream
    /// status and message surfaced textually (spec.md §4.3 step 4).
    pub fn into_result(self) -> CallToolResult {
        if self.status.is_success() {
            ok_json(&self.body)
        } else {
            let message = self
                .body
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| self.body.to_string());
            CallToolResult::error(format!("upstream error {}: {message}", self.status.as_u16()))
        }
    }
}

impl RestClient {
    pub fn new(base_url: impl Into<String>, token: Secret<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into(), token, extra_headers: Vec::new() }
    }

    /// Attach a static header sent with every request, e.g. Supabase's
    /// `apikey`, in addition to the bearer `Authorization` header.
    pub fn with_header(mut self, name: &'static str, value: Secret<String>) -> Self {
        self.extra_headers.push((name, value));
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<UpstreamResponse, CallToolResult> {
        let mut request = request.bearer_auth(self.token.expose_secret());
        for (name, value) in &self.extra_headers {
            request = request.header(*name, value.expose_secret());
        }
        let resp = request
            .send()
            .await
            .map_err(|e| CallToolResult::error(format!("request failed: {e}")))?;
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let body = if text.is_empty() { Value::Null } else { serde_json::from_str(&text).unwrap_or(Value::String(text)) };
        Ok(UpstreamResponse { status, body })
    }

    pub async fn get(&self, path: &str) -> Result<UpstreamResponse, CallToolResult> {
        self.send(self.client.get(self.url(path))).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<UpstreamResponse, CallToolResult> {
        self.send(self.client.post(self.url(path)).json(body)).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Result<UpstreamResponse, CallToolResult> {
        self.send(self.client.patch(self.url(path)).json(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<UpstreamResponse, CallToolResult> {
        self.send(self.client.put(self.url(path)).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<UpstreamResponse, CallToolResult> {
        self.send(self.client.delete(self.url(path))).await
    }

    /// A DELETE carrying a JSON body — GitHub's contents API requires the
    /// commit `message` and blob `sha` in the body of an otherwise-bodiless verb.
    pub async fn delete_with_body(&self, path: &str, body: &Value) -> Result<UpstreamResponse, CallToolResult> {
        self.send(self.client.delete(self.url(path)).json(body)).await
    }

    /// Fetch raw (non-JSON) bytes, e.g. a Gmail attachment or Drive file
    /// body, still through the bearer-authorized client.
    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, CallToolResult> {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(|e| CallToolResult::error(format!("request failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(CallToolResult::error(format!("upstream error {}", resp.status().as_u16())));
        }
        resp.bytes().await.map(|b| b.to_vec()).map_err(|e| CallToolResult::error(format!("request failed: {e}")))
    }
}

/// Merge a `Result<UpstreamResponse, CallToolResult>` down to a plain
/// `CallToolResult`, the shape every handler ultimately returns.
pub fn finish(result: Result<UpstreamResponse, CallToolResult>) -> CallToolResult {
    match result {
        Ok(resp) => resp.into_result(),
        Err(result) => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_str_rejects_missing_and_empty() {
        let args = serde_json::json!({ "present": "x", "blank": "" });
        assert!(require_str(&args, "missing").is_err());
        assert!(require_str(&args, "blank").is_err());
        assert_eq!(require_str(&args, "present").unwrap(), "x");
    }

    #[tokio::test]
    async fn upstream_success_formats_as_ok_result() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/repos/octo/hello")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"full_name":"octo/hello"}"#)
            .create_async()
            .await;

        let client = RestClient::new(server.url(), Secret::new("tok".into()));
        let result = finish(client.get("/repos/octo/hello").await);
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn upstream_4xx_formats_as_error_result_with_message() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/repos/octo/missing")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"Not Found"}"#)
            .create_async()
            .await;

        let client = RestClient::new(server.url(), Secret::new("tok".into()));
        let result = finish(client.get("/repos/octo/missing").await);
        assert!(result.is_error);
    }
}
