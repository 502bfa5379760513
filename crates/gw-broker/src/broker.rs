use std::{collections::HashMap, sync::Arc};

use secrecy::Secret;
use tracing::{info, warn};

use gw_config::Config;
use gw_oauth::OAuthFlow;
use gw_store::{Provider, ProviderConfig, TokenRecord, TokenStore, now_millis};

use crate::{
    error::{Error, Result},
    provider_config::provider_config,
};

/// The refresh-ahead window: a token within this many milliseconds of
/// expiry is treated as already expired (spec.md §4.5).
const REFRESH_SKEW_MS: i64 = 60_000;

/// Custodian of `TokenRecord`s. Issues valid access tokens on demand and
/// runs the authorization-code flow end to end (spec.md §4.5).
pub struct Broker {
    config: Config,
    store: Arc<dyn TokenStore>,
    /// Per-provider endpoint overrides, used only by tests to point a
    /// provider's token endpoint at a mock server instead of the real
    /// (compile-time constant) upstream.
    overrides: HashMap<Provider, ProviderConfig>,
}

/// What `issue_token` hands back to a caller — never the refresh token.
#[derive(Debug)]
pub struct IssuedToken {
    pub access_token: Secret<String>,
    pub expires_at: i64,
}

impl Broker {
    pub fn new(config: Config, store: Arc<dyn TokenStore>) -> Self {
        Self { config, store, overrides: HashMap::new() }
    }

    #[cfg(test)]
    fn with_override(mut self, provider: Provider, cfg: ProviderConfig) -> Self {
        self.overrides.insert(provider, cfg);
        self
    }

    fn flow_for(&self, provider: Provider) -> Result<OAuthFlow> {
        let cfg = match self.overrides.get(&provider) {
            Some(cfg) => cfg.clone(),
            None => provider_config(&self.config, provider)
                .ok_or_else(|| Error::UnknownProvider(provider.to_string()))?,
        };
        Ok(OAuthFlow::new(cfg))
    }

    /// Build the authorization URL the caller should 302 the user to.
    /// `state` is the raw `user_id` (spec.md §3.1 `PendingAuth` — accepted
    /// as a deliberate simplification for a single-operator deployment).
    pub fn begin_auth(&self, user_id: &str, provider: Provider) -> Result<String> {
        let flow = self.flow_for(provider)?;
        Ok(flow.authorize_url(user_id)?.url)
    }

    /// Exchange an authorization code and persist the resulting
    /// `TokenRecord` under `(state, provider)`, where `state` is
    /// interpreted as `user_id`.
    pub async fn complete_auth(&self, provider: Provider, code: &str, state: &str) -> Result<()> {
        let flow = self.flow_for(provider)?;
        let resp = flow.exchange(code).await?;

        let expires_at = resp
            .expires_in_secs
            .map(|secs| now_millis() + (secs as i64) * 1000)
            .unwrap_or(i64::MAX);

        let record = TokenRecord {
            access_token: resp.access_token,
            refresh_token: resp.refresh_token,
            expires_at,
            scope: resp.scope.unwrap_or_default(),
            provider,
            user_id: state.to_string(),
        };

        self.store.save(&record)?;
        info!(user_id = state, %provider, "OAuth authorization completed");
        Ok(())
    }

    /// Return a currently-valid access token for `(user_id, provider)`,
    /// refreshing first if the provider's quirks demand it (spec.md §4.5).
    pub async fn issue_token(&self, user_id: &str, provider: Provider) -> Result<IssuedToken> {
        let record = self.store.load(user_id, provider).ok_or(Error::NoCredentials)?;
        let now = now_millis();

        let must_refresh = record.refresh_token.is_some()
            && (record.needs_refresh(now, REFRESH_SKEW_MS) || provider == Provider::Google);

        if !must_refresh {
            return Ok(IssuedToken { access_token: record.access_token, expires_at: record.expires_at });
        }

        let Some(refresh_token) = &record.refresh_token else {
            // Unreachable given the `must_refresh` guard above, but keeps
            // the branch total instead of panicking on a future edit.
            return Ok(IssuedToken { access_token: record.access_token, expires_at: record.expires_at });
        };

        let flow = self.flow_for(provider)?;
        let refreshed = match flow.refresh(secrecy::ExposeSecret::expose_secret(refresh_token)).await {
            Ok(r) => r,
            Err(e) => {
                warn!(user_id, %provider, error = %e, "token refresh failed");
                return Err(Error::RefreshFailed(e.to_string()));
            },
        };

        let expires_at = refreshed
            .expires_in_secs
            .map(|secs| now_millis() + (secs as i64) * 1000)
            .unwrap_or(record.expires_at);

        // Google may rotate the refresh token; GitHub usually doesn't
        // (spec.md §4.5 "Refresh algorithm"). Keep the old one when the
        // provider didn't send a new one.
        let refresh_token = refreshed.refresh_token.or(record.refresh_token);

        let new_record = TokenRecord {
            access_token: refreshed.access_token,
            refresh_token,
            expires_at,
            scope: refreshed.scope.unwrap_or(record.scope),
            provider,
            user_id: user_id.to_string(),
        };

        self.store.save(&new_record)?;
        info!(user_id, %provider, "token refreshed");

        Ok(IssuedToken { access_token: new_record.access_token, expires_at: new_record.expires_at })
    }
}
