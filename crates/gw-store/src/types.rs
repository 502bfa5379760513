use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

/// The two upstream OAuth providers this deployment brokers credentials for.
///
/// Supabase and Anthropic are not OAuth providers (spec.md §4.4) and so have
/// no `Provider` variant — they're addressed directly by API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Github,
    Google,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::Google => "google",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "github" => Some(Self::Github),
            "google" => Some(Self::Google),
            _ => None,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per `(user_id, provider)` credential state, exclusively owned by the
/// broker (spec.md §3.2).
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    #[serde(serialize_with = "gw_secret_ser")]
    pub access_token: Secret<String>,
    #[serde(
        default,
        serialize_with = "gw_opt_secret_ser",
        skip_serializing_if = "Option::is_none"
    )]
    pub refresh_token: Option<Secret<String>>,
    /// Absolute instant in UTC milliseconds.
    pub expires_at: i64,
    pub scope: String,
    pub provider: Provider,
    pub user_id: String,
}

impl TokenRecord {
    /// `expires_at <= now + skew_ms`, i.e. expired or within `skew_ms` of
    /// expiring. The broker calls this with a 60s skew per spec.md §4.5.
    pub fn needs_refresh(&self, now_ms: i64, skew_ms: i64) -> bool {
        self.expires_at <= now_ms + skew_ms
    }
}

// Manual `Debug`: access/refresh tokens must never be logged in full
// (spec.md §3.1 invariant), grounded on the teacher's `OAuthTokens::fmt`.
impl std::fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRecord")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .field("provider", &self.provider)
            .field("user_id", &self.user_id)
            .finish()
    }
}

fn gw_secret_ser<S: serde::Serializer>(secret: &Secret<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn gw_opt_secret_ser<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

/// Static per-provider metadata loaded from operator-supplied secrets
/// (spec.md §3.1). `redirect_uri` is derived, not configured.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub auth_endpoint: String,
    pub token_endpoint: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
    pub redirect_uri: String,
    /// Extra query parameters appended to the authorization URL — e.g.
    /// Google's `access_type=offline&prompt=consent` (spec.md §4.5
    /// "Google quirk"). Empty for GitHub.
    pub extra_auth_params: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_tokens() {
        let record = TokenRecord {
            access_token: Secret::new("super-secret-access".into()),
            refresh_token: Some(Secret::new("super-secret-refresh".into())),
            expires_at: 0,
            scope: "repo".into(),
            provider: Provider::Github,
            user_id: "jason".into(),
        };
        let debug = format!("{record:?}");
        assert!(!debug.contains("super-secret-access"));
        assert!(!debug.contains("super-secret-refresh"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn needs_refresh_boundary() {
        let record = TokenRecord {
            access_token: Secret::new("t".into()),
            refresh_token: None,
            expires_at: 1_000,
            scope: String::new(),
            provider: Provider::Google,
            user_id: "u".into(),
        };
        assert!(record.needs_refresh(1_000, 0));
        assert!(record.needs_refresh(999, 0));
        assert!(!record.needs_refresh(500, 0));
        assert!(record.needs_refresh(941, 60_000));
    }

    #[test]
    fn serde_roundtrip_exposes_secret_for_storage() {
        let record = TokenRecord {
            access_token: Secret::new("access-xyz".into()),
            refresh_token: Some(Secret::new("refresh-xyz".into())),
            expires_at: 42,
            scope: "a b".into(),
            provider: Provider::Github,
            user_id: "jason".into(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("access-xyz"));
        let parsed: TokenRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.access_token.expose_secret(), "access-xyz");
        assert_eq!(parsed.expires_at, 42);
    }
}
