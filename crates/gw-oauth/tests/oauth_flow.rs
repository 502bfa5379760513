//! Drives a full authorization-code cycle against a mock token endpoint
//! through `gw-oauth`'s public API only (spec.md §4.5).

use secrecy::ExposeSecret;

use gw_oauth::OAuthFlow;
use gw_store::ProviderConfig;

fn config(token_endpoint: &str) -> ProviderConfig {
    ProviderConfig {
        auth_endpoint: "https://github.com/login/oauth/authorize".into(),
        token_endpoint: token_endpoint.into(),
        client_id: "client-123".into(),
        client_secret: "secret-456".into(),
        scope: "repo read:user".into(),
        redirect_uri: "https://gw.example.com/callback/github".into(),
        extra_auth_params: vec![],
    }
}

#[tokio::test]
async fn full_authorize_then_exchange_then_refresh_cycle() {
    let mut server = mockito::Server::new_async().await;
    let exchange_mock = server
        .mock("POST", "/token")
        .match_body(mockito::Matcher::Regex("grant_type=authorization_code".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"tok-1","refresh_token":"ref-1","expires_in":3600}"#)
        .create_async()
        .await;
    let refresh_mock = server
        .mock("POST", "/token")
        .match_body(mockito::Matcher::Regex("grant_type=refresh_token".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"tok-2","expires_in":3600}"#)
        .create_async()
        .await;

    let flow = OAuthFlow::new(config(&format!("{}/token", server.url())));

    let auth_request = flow.authorize_url("jason").unwrap();
    assert!(auth_request.url.starts_with("https://github.com/login/oauth/authorize"));

    let first = flow.exchange("the-code").await.unwrap();
    assert_eq!(first.access_token.expose_secret(), "tok-1");
    let refresh_token = first.refresh_token.unwrap();

    let second = flow.refresh(refresh_token.expose_secret()).await.unwrap();
    assert_eq!(second.access_token.expose_secret(), "tok-2");

    exchange_mock.assert_async().await;
    refresh_mock.assert_async().await;
}

#[tokio::test]
async fn exchange_against_an_unreachable_endpoint_is_an_error() {
    let flow = OAuthFlow::new(config("http://127.0.0.1:1"));
    let result = flow.exchange("the-code").await;
    assert!(result.is_err());
}
