use std::sync::Arc;

use gw_broker::Broker;
use gw_config::Config;
use gw_handlers::{CalendarRegistry, DriveRegistry, GithubRegistry, GmailRegistry, SupabaseRegistry};
use gw_mcp::{Gateway, ProviderRegistry};
use gw_resolver::Resolver;
use gw_server::state::AppState;
use gw_store::FileTokenStore;
use secrecy::Secret;
use tracing::info;

fn token_store_path() -> std::path::PathBuf {
    std::env::var("TOKEN_STORE_PATH")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("./tokens.json"))
}

#[tokio::main]
async fn main() -> gw_server::Result<()> {
    gw_common::init_tracing(std::env::var("LOG_JSON").is_ok());

    let config = Config::from_env()?;
    let store: Arc<dyn gw_store::TokenStore> = Arc::new(FileTokenStore::new(token_store_path()));
    let resolver_broker = Arc::new(Broker::new(config.clone(), store.clone()));
    let resolver: Arc<dyn gw_resolver::AuthResolver> = Arc::new(Resolver::bound(resolver_broker));
    let state_broker = Broker::new(config.clone(), store);

    let mut registries: Vec<Arc<dyn ProviderRegistry>> = Vec::new();
    if config.github.is_some() {
        registries.push(Arc::new(GithubRegistry::new(resolver.clone())));
    }
    if config.google.is_some() {
        registries.push(Arc::new(CalendarRegistry::new(resolver.clone())));
        registries.push(Arc::new(DriveRegistry::new(resolver.clone())));
        let anthropic_key = config.anthropic_api_key.clone().map(Secret::new);
        registries.push(Arc::new(GmailRegistry::new(resolver.clone(), anthropic_key)));
    }
    if let Some(supabase) = config.supabase.clone() {
        registries.push(Arc::new(SupabaseRegistry::new(supabase)));
    }

    let gateway = Gateway::new(registries).map_err(|e| gw_server::Error::Message(e.to_string()))?;
    info!(providers = ?gateway.provider_names(), "registered provider tool catalogs");

    let bind = config.bind.clone();
    let port = config.port;
    let state = AppState::new(config, gateway, state_broker);

    let app = gw_server::build_router(state);
    let addr = format!("{bind}:{port}");
    info!(%addr, "starting gateway HTTP server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
