//! The OAuth Flow Runner's HTTP surface (spec.md §4.6).

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BeginAuthQuery {
    pub user_id: String,
}

/// `GET /auth/{provider}?user_id=<id>` → 302 to the provider's
/// authorization URL.
pub async fn begin_auth_handler(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<BeginAuthQuery>,
) -> impl IntoResponse {
    let Some(provider) = gw_store::Provider::parse(&provider) else {
        return (StatusCode::NOT_FOUND, format!("unknown provider: {provider}")).into_response();
    };
    match state.broker.begin_auth(&query.user_id, provider) {
        Ok(url) => Redirect::to(&url).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: String,
    pub state: String,
}

/// `GET /callback/{provider}?code=<c>&state=<user_id>` — exchange the code,
/// persist the token, return a static success page. Neither `code` nor
/// `state` is reflected into the HTML (spec.md §4.6 "must not reflect any
/// untrusted input").
pub async fn callback_handler(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> impl IntoResponse {
    let Some(provider) = gw_store::Provider::parse(&provider) else {
        return (StatusCode::NOT_FOUND, Html("unknown provider".to_string())).into_response();
    };
    match state.broker.complete_auth(provider, &query.code, &query.state).await {
        Ok(()) => (StatusCode::OK, Html(SUCCESS_PAGE.to_string())).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, Html(format!("<html><body>Authorization failed: {}</body></html>", escape_html(&e.kind())))).into_response(),
    }
}

const SUCCESS_PAGE: &str = "<html><body><h1>Authorization complete</h1><p>You can close this tab.</p></body></html>";

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_at: i64,
}

/// `POST /token/{provider}` — the endpoint the Auth Resolver's HTTP
/// transport calls (spec.md §4.4 "Loopback HTTPS transport").
pub async fn token_handler(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Json(request): Json<TokenRequest>,
) -> impl IntoResponse {
    let Some(provider) = gw_store::Provider::parse(&provider) else {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "unknown provider" }))).into_response();
    };
    match state.broker.issue_token(&request.user_id, provider).await {
        Ok(issued) => {
            let body = TokenResponse { access_token: issued.access_token.expose_secret().clone(), expires_at: issued.expires_at };
            (StatusCode::OK, Json(serde_json::to_value(body).unwrap())).into_response()
        },
        Err(e) => (StatusCode::BAD_REQUEST, Json(json!({ "error": e.kind(), "message": e.to_string() }))).into_response(),
    }
}
