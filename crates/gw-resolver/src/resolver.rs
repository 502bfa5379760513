use secrecy::Secret;
use serde::{Deserialize, Serialize};
use tracing::debug;

use gw_store::Provider;

use crate::error::{Error, Result};

/// Hides whether a valid access token comes from an in-process `Broker`
/// call or a loopback HTTP call to one, from a tool handler's point of
/// view (spec.md §4.4).
///
/// Deliberately stateless: the resolver never caches. Token freshness is
/// the `Broker`'s job alone.
#[async_trait::async_trait]
pub trait AuthResolver: Send + Sync {
    async fn resolve(&self, user_id: &str, provider: Provider) -> Result<Secret<String>>;
}

/// Talks to a `Broker` living in the same process — no serialization, no
/// network hop. The preferred transport whenever the gateway and broker
/// share a runtime (spec.md §4.4 "Bound transport").
pub struct BoundResolver {
    broker: std::sync::Arc<gw_broker::Broker>,
}

impl BoundResolver {
    pub fn new(broker: std::sync::Arc<gw_broker::Broker>) -> Self {
        Self { broker }
    }
}

#[async_trait::async_trait]
impl AuthResolver for BoundResolver {
    async fn resolve(&self, user_id: &str, provider: Provider) -> Result<Secret<String>> {
        let issued = self.broker.issue_token(user_id, provider).await?;
        Ok(issued.access_token)
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    user_id: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    expires_at: i64,
}

/// Falls back to a loopback HTTPS call against a broker running as a
/// separate process, when no bound broker is wired into this deployment
/// (spec.md §4.4 "Loopback HTTPS transport", §4.6 `POST /token/{provider}`).
pub struct HttpResolver {
    client: reqwest::Client,
    broker_base_url: String,
}

impl HttpResolver {
    pub fn new(broker_base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), broker_base_url: broker_base_url.into() }
    }
}

#[async_trait::async_trait]
impl AuthResolver for HttpResolver {
    async fn resolve(&self, user_id: &str, provider: Provider) -> Result<Secret<String>> {
        let url = format!("{}/token/{provider}", self.broker_base_url);
        debug!(user_id, %provider, %url, "resolving access token over HTTP");
        let resp = self
            .client
            .post(&url)
            .json(&TokenRequest { user_id })
            .send()
            .await?
            .error_for_status()?
            .json::<TokenResponse>()
            .await?;
        Ok(Secret::new(resp.access_token))
    }
}

/// Picks bound transport when a broker is wired in-process, otherwise
/// falls back to HTTP (spec.md §4.4: "MUST attempt bound transport first,
/// falling back to HTTPS only if the binding is absent").
pub enum Resolver {
    Bound(BoundResolver),
    Http(HttpResolver),
}

impl Resolver {
    pub fn bound(broker: std::sync::Arc<gw_broker::Broker>) -> Self {
        Self::Bound(BoundResolver::new(broker))
    }

    pub fn http(broker_base_url: impl Into<String>) -> Self {
        Self::Http(HttpResolver::new(broker_base_url))
    }

    /// Construct the resolver a deployment should use, per §4.4's
    /// transport-preference rule.
    pub fn for_deployment(
        broker: Option<std::sync::Arc<gw_broker::Broker>>,
        broker_base_url: Option<&str>,
    ) -> Result<Self> {
        match (broker, broker_base_url) {
            (Some(broker), _) => Ok(Self::bound(broker)),
            (None, Some(url)) => Ok(Self::http(url)),
            (None, None) => {
                Err(Error::Message("no broker binding or OAUTH_BROKER_URL configured".into()))
            },
        }
    }
}

#[async_trait::async_trait]
impl AuthResolver for Resolver {
    async fn resolve(&self, user_id: &str, provider: Provider) -> Result<Secret<String>> {
        match self {
            Self::Bound(r) => r.resolve(user_id, provider).await,
            Self::Http(r) => r.resolve(user_id, provider).await,
        }
    }
}
