//! Integration tests driving the gateway's real HTTP surface: a socket is
//! bound, `axum::serve` runs in a background task, and `reqwest` talks to it
//! exactly like a real MCP client would (spec.md §4.1 "Surface").

use std::sync::Arc;

use gw_broker::Broker;
use gw_config::Config;
use gw_mcp::Gateway;
use gw_server::state::AppState;
use gw_store::FileTokenStore;
use tokio::net::TcpListener;

async fn start_server() -> String {
    let dir = tempfile::tempdir().expect("tempdir");
    let store: Arc<dyn gw_store::TokenStore> = Arc::new(FileTokenStore::new(dir.path().join("tokens.json")));
    std::mem::forget(dir);

    let config = Config {
        user_id: "jason".into(),
        oauth_broker_url: None,
        bind: "127.0.0.1".into(),
        port: 0,
        broker_base_url: "http://localhost:8787".into(),
        github: None,
        google: None,
        supabase: None,
        anthropic_api_key: None,
    };
    let gateway = Gateway::new(vec![]).expect("empty gateway never collides");
    let broker = Broker::new(config.clone(), store);
    let state = AppState::new(config, gateway, broker);
    let app = gw_server::build_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server");
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn health_probe_reports_ok_over_a_real_socket() {
    let base = start_server().await;
    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["user_id"], "jason");
}

#[tokio::test]
async fn initialize_round_trips_over_a_real_socket() {
    let base = start_server().await;
    let client = reqwest::Client::new();
    let resp = client
        .post(&base)
        .json(&serde_json::json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {} }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["id"], 1);
    assert_eq!(body["jsonrpc"], "2.0");
}

#[tokio::test]
async fn malformed_json_body_returns_a_json_rpc_shaped_error_not_a_500() {
    let base = start_server().await;
    let client = reqwest::Client::new();
    let resp = client
        .post(&base)
        .header("content-type", "application/json")
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body.get("error").is_some());
}

#[tokio::test]
async fn get_on_the_rpc_path_is_405() {
    let base = start_server().await;
    let resp = reqwest::get(&base).await.unwrap();
    assert_eq!(resp.status(), 405);
}

#[tokio::test]
async fn preflight_options_gets_cors_headers() {
    let base = start_server().await;
    let client = reqwest::Client::new();
    let resp = client
        .request(reqwest::Method::OPTIONS, &base)
        .header("origin", "https://example.com")
        .header("access-control-request-method", "POST")
        .send()
        .await
        .unwrap();
    assert!(resp.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn response_carries_a_propagated_request_id() {
    let base = start_server().await;
    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert!(resp.headers().contains_key("x-request-id"));
}
