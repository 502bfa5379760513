//! Wires the `Gateway`, `Broker`, and Auth Resolver into one axum app: the
//! JSON-RPC endpoint, the OAuth Flow Runner's HTTP routes, and a health
//! probe (spec.md §4.1, §4.6).

pub mod error;
pub mod oauth_routes;
pub mod rpc;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

use axum::{
    Router,
    http::{Method, header},
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

pub use error::{Error, Result};
pub use state::AppState;

/// `OPTIONS` preflight gets the exact headers spec.md §4.1 names: allow-all
/// origin, `POST, OPTIONS`, `Content-Type, Authorization`.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

pub fn build_router(state: AppState) -> Router {
    let rpc_route = post(rpc::rpc_handler).fallback(rpc::rpc_method_not_allowed);

    Router::new()
        .route("/", rpc_route)
        .route("/health", get(rpc::health_handler))
        .route("/auth/{provider}", get(oauth_routes::begin_auth_handler))
        .route("/callback/{provider}", get(oauth_routes::callback_handler))
        .route("/token/{provider}", post(oauth_routes::token_handler))
        // Propagate before the response leaves, generate before tracing sees it.
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
