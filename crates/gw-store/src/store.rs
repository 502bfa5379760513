use std::{collections::HashMap, path::PathBuf};

use tracing::{debug, info, warn};

use crate::{
    error::Result,
    types::{Provider, TokenRecord},
};

fn storage_key(user_id: &str, provider: Provider) -> String {
    format!("{user_id}_{provider}_token")
}

/// Persistence contract for [`TokenRecord`]s (spec.md §4.5).
///
/// A single key-value mapping keyed by `<user_id>_<provider>_token`; values
/// are `TokenRecord` serialized as JSON. Implementations must provide
/// atomic get/put — concurrent refreshes racing on the same key is an
/// accepted edge case (spec.md §5), not something the store itself needs
/// to serialize.
pub trait TokenStore: Send + Sync {
    fn load(&self, user_id: &str, provider: Provider) -> Option<TokenRecord>;
    fn save(&self, record: &TokenRecord) -> Result<()>;
    fn delete(&self, user_id: &str, provider: Provider) -> Result<()>;
}

/// File-backed token store at a single JSON file, one map entry per
/// `(user_id, provider)` pair. Grounded on the teacher's
/// `moltis_oauth::storage::TokenStore`, generalized from a provider-only key
/// to the `user_id`-partitioned key this spec requires.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_map(&self) -> HashMap<String, TokenRecord> {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|data| serde_json::from_str(&data).ok())
            .unwrap_or_default()
    }

    fn write_map(&self, map: &HashMap<String, TokenRecord>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, &data)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self, user_id: &str, provider: Provider) -> Option<TokenRecord> {
        let key = storage_key(user_id, provider);
        let map = self.read_map();
        match map.get(&key) {
            Some(record) => {
                debug!(path = %self.path.display(), key, "token record loaded");
                Some(record.clone())
            },
            None => {
                debug!(path = %self.path.display(), key, "no token record for key");
                None
            },
        }
    }

    fn save(&self, record: &TokenRecord) -> Result<()> {
        let key = storage_key(&record.user_id, record.provider);
        let mut map = self.read_map();
        map.insert(key.clone(), record.clone());
        self.write_map(&map)?;
        info!(path = %self.path.display(), key, "token record saved");
        Ok(())
    }

    fn delete(&self, user_id: &str, provider: Provider) -> Result<()> {
        let key = storage_key(user_id, provider);
        let mut map = self.read_map();
        if map.remove(&key).is_some() {
            self.write_map(&map)?;
        } else {
            warn!(key, "delete requested for unknown token record");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn sample(user_id: &str, provider: Provider) -> TokenRecord {
        TokenRecord {
            access_token: Secret::new("access".into()),
            refresh_token: Some(Secret::new("refresh".into())),
            expires_at: 123,
            scope: "repo".into(),
            provider,
            user_id: user_id.into(),
        }
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("tokens.json"));
        let record = sample("jason", Provider::Github);
        store.save(&record).unwrap();

        let loaded = store.load("jason", Provider::Github).unwrap();
        assert_eq!(loaded.expires_at, 123);
        assert_eq!(loaded.scope, "repo");
    }

    #[test]
    fn distinct_users_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("tokens.json"));
        store.save(&sample("alice", Provider::Google)).unwrap();
        store.save(&sample("bob", Provider::Google)).unwrap();

        assert!(store.load("alice", Provider::Google).is_some());
        assert!(store.load("bob", Provider::Google).is_some());
        assert!(store.load("alice", Provider::Github).is_none());
    }

    #[test]
    fn load_missing_file_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("does_not_exist.json"));
        assert!(store.load("jason", Provider::Github).is_none());
    }

    #[test]
    fn delete_removes_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("tokens.json"));
        store.save(&sample("jason", Provider::Github)).unwrap();
        store.delete("jason", Provider::Github).unwrap();
        assert!(store.load("jason", Provider::Github).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn file_permissions_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let store = FileTokenStore::new(path.clone());
        store.save(&sample("jason", Provider::Github)).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
