//! The gateway process's single immutable `AppState`, shared across every
//! axum handler via `axum::extract::State` (spec.md §5 "Other shared
//! state... no synchronization needed").

use std::sync::Arc;

use gw_broker::Broker;
use gw_config::Config;
use gw_mcp::Gateway;
use gw_store::Provider;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gateway: Arc<Gateway>,
    pub broker: Arc<Broker>,
}

impl AppState {
    pub fn new(config: Config, gateway: Gateway, broker: Broker) -> Self {
        Self { config: Arc::new(config), gateway: Arc::new(gateway), broker: Arc::new(broker) }
    }
}

pub fn parse_provider(raw: &str) -> Option<Provider> {
    Provider::parse(raw)
}
