use std::sync::Arc;

use gw_broker::Broker;
use gw_config::Config;
use gw_mcp::Gateway;
use gw_store::FileTokenStore;

use crate::state::AppState;

pub fn test_state() -> AppState {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(FileTokenStore::new(dir.path().join("tokens.json")));
    // Leak the guard: these tests never touch the store, and AppState has
    // nowhere to hold a TempDir past this function's return.
    std::mem::forget(dir);

    let config = Config {
        user_id: "jason".into(),
        oauth_broker_url: None,
        bind: "0.0.0.0".into(),
        port: 8787,
        broker_base_url: "http://localhost:8787".into(),
        github: None,
        google: None,
        supabase: None,
        anthropic_api_key: None,
    };

    let gateway = Gateway::new(vec![]).expect("empty gateway never collides");
    let broker = Broker::new(config.clone(), store);

    AppState::new(config, gateway, broker)
}
