use gw_config::{Config, provider_defaults};
use gw_store::{Provider, ProviderConfig};

/// Build this deployment's static [`ProviderConfig`] for `provider`, or
/// `None` if the operator never configured that provider's client
/// credentials (spec.md §3.1 `ProviderConfig`).
pub fn provider_config(cfg: &Config, provider: Provider) -> Option<ProviderConfig> {
    let redirect_uri = format!("{}/callback/{provider}", cfg.broker_base_url);

    match provider {
        Provider::Github => {
            let creds = cfg.github.as_ref()?;
            Some(ProviderConfig {
                auth_endpoint: provider_defaults::GITHUB.auth_endpoint.to_string(),
                token_endpoint: provider_defaults::GITHUB.token_endpoint.to_string(),
                client_id: creds.client_id.clone(),
                client_secret: creds.client_secret.clone(),
                scope: provider_defaults::GITHUB.default_scope.to_string(),
                redirect_uri,
                extra_auth_params: vec![],
            })
        },
        Provider::Google => {
            let creds = cfg.google.as_ref()?;
            Some(ProviderConfig {
                auth_endpoint: provider_defaults::GOOGLE.auth_endpoint.to_string(),
                token_endpoint: provider_defaults::GOOGLE.token_endpoint.to_string(),
                client_id: creds.client_id.clone(),
                client_secret: creds.client_secret.clone(),
                scope: provider_defaults::GOOGLE.default_scope.to_string(),
                redirect_uri,
                // Google-specific: request a refresh token and force the
                // consent screen every time (spec.md §4.5 "begin_auth").
                extra_auth_params: vec![
                    ("access_type".to_string(), "offline".to_string()),
                    ("prompt".to_string(), "consent".to_string()),
                ],
            })
        },
    }
}
