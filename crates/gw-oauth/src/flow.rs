use secrecy::Secret;
use url::Url;

use gw_store::ProviderConfig;

use crate::error::{Error, Result};

/// Result of starting the authorization-code flow.
pub struct AuthorizationRequest {
    pub url: String,
}

/// Fields parsed out of a token-endpoint response, before they're wrapped
/// into a `TokenRecord` by the broker (which also knows the `user_id` and
/// `provider` needed to complete that struct).
pub struct TokenResponse {
    pub access_token: Secret<String>,
    pub refresh_token: Option<Secret<String>>,
    pub expires_in_secs: Option<u64>,
    pub scope: Option<String>,
}

/// Drives the OAuth 2.0 authorization-code grant against one provider's
/// endpoints. Provider-specific quirks (Google's mandatory refresh-on-every-
/// issuance, GitHub's lack of a refresh token) are the broker's concern, not
/// this crate's — `OAuthFlow` only knows how to talk the wire protocol.
pub struct OAuthFlow {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl OAuthFlow {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config, client: reqwest::Client::new() }
    }

    /// Build the authorization URL for a given `state` (the broker passes
    /// the raw `user_id` as `state` — spec.md §3.1 `PendingAuth`).
    pub fn authorize_url(&self, state: &str) -> Result<AuthorizationRequest> {
        let mut url = Url::parse(&self.config.auth_endpoint).map_err(Error::InvalidUrl)?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.scope)
            .append_pair("state", state)
            .append_pair("response_type", "code");

        for (key, value) in &self.config.extra_auth_params {
            url.query_pairs_mut().append_pair(key, value);
        }

        Ok(AuthorizationRequest { url: url.to_string() })
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange(&self, code: &str) -> Result<TokenResponse> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        self.post_form(&form).await
    }

    /// Refresh an access token using a refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        self.post_form(&form).await
    }

    async fn post_form(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let resp = self
            .client
            .post(&self.config.token_endpoint)
            .header("Accept", "application/json")
            .form(form)
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        parse_token_response(&resp)
    }
}

fn parse_token_response(resp: &serde_json::Value) -> Result<TokenResponse> {
    let access_token = resp["access_token"]
        .as_str()
        .ok_or_else(|| Error::message("missing access_token in token response"))?
        .to_string();

    Ok(TokenResponse {
        access_token: Secret::new(access_token),
        refresh_token: resp["refresh_token"].as_str().map(|s| Secret::new(s.to_string())),
        expires_in_secs: resp["expires_in"].as_u64(),
        scope: resp["scope"].as_str().map(ToString::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn config(auth_endpoint: &str, token_endpoint: &str) -> ProviderConfig {
        ProviderConfig {
            auth_endpoint: auth_endpoint.into(),
            token_endpoint: token_endpoint.into(),
            client_id: "client-123".into(),
            client_secret: "secret-456".into(),
            scope: "repo read:user".into(),
            redirect_uri: "https://gw.example.com/callback/github".into(),
            extra_auth_params: vec![],
        }
    }

    #[test]
    fn authorize_url_includes_required_params() {
        let flow = OAuthFlow::new(config("https://github.com/login/oauth/authorize", "https://x/token"));
        let req = flow.authorize_url("jason").unwrap();
        let url = Url::parse(&req.url).unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().collect();
        assert_eq!(params.get("client_id").unwrap(), "client-123");
        assert_eq!(params.get("state").unwrap(), "jason");
        assert_eq!(params.get("response_type").unwrap(), "code");
        assert_eq!(
            params.get("redirect_uri").unwrap(),
            "https://gw.example.com/callback/github"
        );
    }

    #[test]
    fn authorize_url_appends_google_specific_extras() {
        let mut cfg = config("https://accounts.google.com/o/oauth2/v2/auth", "https://x/token");
        cfg.extra_auth_params = vec![
            ("access_type".into(), "offline".into()),
            ("prompt".into(), "consent".into()),
        ];
        let flow = OAuthFlow::new(cfg);
        let req = flow.authorize_url("jason").unwrap();
        let url = Url::parse(&req.url).unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().collect();
        assert_eq!(params.get("access_type").unwrap(), "offline");
        assert_eq!(params.get("prompt").unwrap(), "consent");
    }

    #[tokio::test]
    async fn exchange_parses_token_response() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"tok-abc","refresh_token":"ref-xyz","expires_in":3600,"scope":"repo"}"#)
            .create_async()
            .await;

        let flow = OAuthFlow::new(config("https://x/auth", &format!("{}/token", server.url())));
        let resp = flow.exchange("the-code").await.unwrap();
        assert_eq!(resp.access_token.expose_secret(), "tok-abc");
        assert_eq!(resp.refresh_token.unwrap().expose_secret(), "ref-xyz");
        assert_eq!(resp.expires_in_secs, Some(3600));
    }

    #[tokio::test]
    async fn refresh_without_rotated_refresh_token() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"tok-new","expires_in":3600}"#)
            .create_async()
            .await;

        let flow = OAuthFlow::new(config("https://x/auth", &format!("{}/token", server.url())));
        let resp = flow.refresh("ref-xyz").await.unwrap();
        assert_eq!(resp.access_token.expose_secret(), "tok-new");
        assert!(resp.refresh_token.is_none());
    }

    #[tokio::test]
    async fn upstream_error_status_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/token")
            .with_status(401)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let flow = OAuthFlow::new(config("https://x/auth", &format!("{}/token", server.url())));
        assert!(flow.exchange("bad-code").await.is_err());
    }
}
