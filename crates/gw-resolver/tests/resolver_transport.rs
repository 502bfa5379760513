use std::sync::Arc;

use secrecy::{ExposeSecret, Secret};

use gw_resolver::{AuthResolver, Resolver};
use gw_store::{FileTokenStore, Provider, TokenRecord, TokenStore, now_millis};

fn config(broker_base_url: &str) -> gw_config::Config {
    gw_config::Config {
        user_id: "jason".into(),
        oauth_broker_url: None,
        bind: "0.0.0.0".into(),
        port: 8787,
        broker_base_url: broker_base_url.into(),
        github: Some(gw_config::OAuthClientSecrets {
            client_id: "gh-id".into(),
            client_secret: "gh-secret".into(),
        }),
        google: None,
        supabase: None,
        anthropic_api_key: None,
    }
}

#[tokio::test]
async fn bound_transport_round_trips_a_real_broker() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileTokenStore::new(dir.path().join("tokens.json")));
    store
        .save(&TokenRecord {
            access_token: Secret::new("tok-integration".into()),
            refresh_token: None,
            expires_at: now_millis() + 3_600_000,
            scope: "repo".into(),
            provider: Provider::Github,
            user_id: "jason".into(),
        })
        .unwrap();

    let broker = Arc::new(gw_broker::Broker::new(config("https://gw.example.com"), store));
    let resolver = Resolver::for_deployment(Some(broker), None).unwrap();

    let token = resolver.resolve("jason", Provider::Github).await.unwrap();
    assert_eq!(token.expose_secret(), "tok-integration");
}

#[tokio::test]
async fn http_transport_is_used_when_no_broker_is_bound() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("POST", "/token/github")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"tok-over-http","expires_at":999}"#)
        .create_async()
        .await;

    let resolver = Resolver::for_deployment(None, Some(&server.url())).unwrap();
    let token = resolver.resolve("jason", Provider::Github).await.unwrap();
    assert_eq!(token.expose_secret(), "tok-over-http");
}
