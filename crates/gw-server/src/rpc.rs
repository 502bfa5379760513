//! The single JSON-RPC POST endpoint (spec.md §4.1 "Surface").

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::Value;

use gw_mcp::{JsonRpcRequest, JsonRpcResponse, error_codes};

use crate::state::AppState;

/// `POST /` — decode one JSON-RPC request, dispatch it through the
/// `Gateway`, and return its response.
///
/// Malformed JSON still needs a JSON-RPC-shaped error, not an axum
/// rejection body, so the body is taken as raw bytes and parsed here
/// rather than via the `Json<JsonRpcRequest>` extractor.
pub async fn rpc_handler(State(state): State<AppState>, body: axum::body::Bytes) -> impl IntoResponse {
    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            let response = JsonRpcResponse::error(Value::Null, error_codes::INVALID_REQUEST, format!("invalid JSON-RPC request: {e}"));
            return (StatusCode::OK, Json(response));
        },
    };

    let response = state.gateway.handle(&request, &state.config.user_id).await;
    (StatusCode::OK, Json(response))
}

/// Any verb other than POST on the RPC path (spec.md §4.1 "Non-POST on the
/// RPC path").
pub async fn rpc_method_not_allowed() -> impl IntoResponse {
    let response = JsonRpcResponse::error(Value::Null, error_codes::INVALID_REQUEST, "method not allowed; use POST");
    (StatusCode::METHOD_NOT_ALLOWED, Json(response))
}

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "user_id": state.config.user_id,
        "providers": state.gateway.provider_names(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::build_router;
    use crate::test_support::test_state;

    #[tokio::test]
    async fn malformed_json_returns_invalid_request_error_not_a_500() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::post("/").header("content-type", "application/json").body(Body::from("not json")).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn get_on_rpc_path_is_405_with_json_rpc_error_body() {
        let app = build_router(test_state());
        let response = app.oneshot(Request::get("/").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn initialize_round_trips_through_the_real_router() {
        let app = build_router(test_state());
        let body = serde_json::json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {} });
        let response = app
            .oneshot(
                Request::post("/")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn health_probe_reports_ok() {
        let app = build_router(test_state());
        let response = app.oneshot(Request::get("/health").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }
}
