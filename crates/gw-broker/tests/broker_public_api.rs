//! Black-box coverage of `Broker` through its public API only. Redirecting
//! a provider's token endpoint at a mock server uses a `#[cfg(test)]`-only
//! hook internal to the crate, so the refresh cycle itself stays covered by
//! `gw-broker`'s colocated unit tests; this file covers what's reachable
//! from outside the crate (spec.md §4.5).

use std::sync::Arc;

use gw_broker::Broker;
use gw_config::{Config, OAuthClientSecrets};
use gw_store::{FileTokenStore, Provider, TokenRecord, TokenStore, now_millis};
use secrecy::{ExposeSecret, Secret};

fn config() -> Config {
    Config {
        user_id: "jason".into(),
        oauth_broker_url: None,
        bind: "0.0.0.0".into(),
        port: 8787,
        broker_base_url: "https://gw.example.com".into(),
        github: Some(OAuthClientSecrets { client_id: "gh-id".into(), client_secret: "gh-secret".into() }),
        google: None,
        supabase: None,
        anthropic_api_key: None,
    }
}

fn broker() -> (Broker, Arc<FileTokenStore>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileTokenStore::new(dir.path().join("tokens.json")));
    (Broker::new(config(), store.clone()), store, dir)
}

#[tokio::test]
async fn issuing_a_token_with_no_stored_credentials_is_an_error() {
    let (broker, _store, _dir) = broker();
    let err = broker.issue_token("jason", Provider::Github).await.unwrap_err();
    assert_eq!(err.kind(), "no_credentials");
}

#[tokio::test]
async fn an_unexpired_refresh_free_token_is_returned_without_any_network_call() {
    let (broker, store, _dir) = broker();
    store
        .save(&TokenRecord {
            access_token: Secret::new("tok-123".into()),
            refresh_token: None,
            expires_at: now_millis() + 3_600_000,
            scope: "repo".into(),
            provider: Provider::Github,
            user_id: "jason".into(),
        })
        .unwrap();

    let issued = broker.issue_token("jason", Provider::Github).await.unwrap();
    assert_eq!(issued.access_token.expose_secret(), "tok-123");
}

#[test]
fn begin_auth_for_a_provider_without_configured_credentials_errors() {
    let (broker, _store, _dir) = broker();
    assert!(broker.begin_auth("jason", Provider::Google).is_err());
}

#[test]
fn begin_auth_url_embeds_the_user_id_as_state() {
    let (broker, _store, _dir) = broker();
    let url = broker.begin_auth("jason", Provider::Github).unwrap();
    assert!(url.contains("state=jason"));
}
