//! Operator configuration, loaded from environment variables at startup.
//!
//! Config files are deliberately not supported: spec.md §6 names a fixed,
//! small set of canonical environment variables rather than a config
//! schema, so this crate's job is env lookup plus validation, not a
//! layered loader.

pub mod error;
pub mod provider_defaults;
pub mod validate;

use gw_common::FromMessage as _;

pub use error::{Error, Result};
pub use validate::{Diagnostic, Severity, ValidationResult};

/// OAuth client credentials for one provider, read from the environment.
#[derive(Debug, Clone)]
pub struct OAuthClientSecrets {
    pub client_id: String,
    pub client_secret: String,
}

/// Service-role Supabase connection details (no OAuth; full-access key).
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub project_url: String,
    pub service_key: String,
}

/// One immutable configuration value, built once at process startup and
/// passed explicitly into every component — no global config singleton.
#[derive(Debug, Clone)]
pub struct Config {
    /// `USER_ID` — the single operator this deployment serves.
    pub user_id: String,
    /// `OAUTH_BROKER_URL` — absence means the gateway must use the bound
    /// (in-process) transport to reach the broker.
    pub oauth_broker_url: Option<String>,
    /// Address the gateway's HTTP server binds to.
    pub bind: String,
    /// Port the gateway's HTTP server listens on.
    pub port: u16,
    /// This deployment's own externally-reachable base URL, used to derive
    /// each provider's `redirect_uri` as `{broker_base_url}/callback/{provider}`.
    pub broker_base_url: String,
    pub github: Option<OAuthClientSecrets>,
    pub google: Option<OAuthClientSecrets>,
    pub supabase: Option<SupabaseConfig>,
    pub anthropic_api_key: Option<String>,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// `USER_ID` is the only variable that is always required; every other
    /// provider's credentials are optional — a deployment that doesn't wire
    /// up Supabase simply never registers the `supabase_*` tools.
    pub fn from_env() -> Result<Self> {
        let user_id = require_env("USER_ID")?;
        let oauth_broker_url = optional_env("OAUTH_BROKER_URL");
        let bind = std::env::var("GATEWAY_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("GATEWAY_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8787);
        let broker_base_url = std::env::var("BROKER_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"));

        let github = match (optional_env("GITHUB_CLIENT_ID"), optional_env("GITHUB_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(OAuthClientSecrets { client_id, client_secret }),
            (None, None) => None,
            _ => {
                return Err(Error::message(
                    "GITHUB_CLIENT_ID and GITHUB_CLIENT_SECRET must both be set or both unset",
                ));
            },
        };

        let google = match (optional_env("GOOGLE_CLIENT_ID"), optional_env("GOOGLE_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(OAuthClientSecrets { client_id, client_secret }),
            (None, None) => None,
            _ => {
                return Err(Error::message(
                    "GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET must both be set or both unset",
                ));
            },
        };

        let supabase = match (optional_env("SUPABASE_URL"), optional_env("SUPABASE_KEY")) {
            (Some(project_url), Some(service_key)) => Some(SupabaseConfig { project_url, service_key }),
            (None, None) => None,
            _ => {
                return Err(Error::message(
                    "SUPABASE_URL and SUPABASE_KEY must both be set or both unset",
                ));
            },
        };

        let anthropic_api_key = optional_env("ANTHROPIC_API_KEY");

        Ok(Self {
            user_id,
            oauth_broker_url,
            bind,
            port,
            broker_base_url,
            github,
            google,
            supabase,
            anthropic_api_key,
        })
    }

    /// Diagnostics describing which optional providers are unconfigured.
    /// Never fails the process; callers log these at startup.
    pub fn diagnostics(&self) -> ValidationResult {
        let mut result = ValidationResult::default();
        if self.github.is_none() {
            result.push(Diagnostic::warning("github OAuth not configured; github_* tools will 401"));
        }
        if self.google.is_none() {
            result.push(Diagnostic::warning(
                "google OAuth not configured; calendar_*, drive_*, gmail_* tools will 401",
            ));
        }
        if self.supabase.is_none() {
            result.push(Diagnostic::warning("supabase not configured; supabase_* tools will error"));
        }
        if self.anthropic_api_key.is_none() {
            result.push(Diagnostic::warning(
                "ANTHROPIC_API_KEY not set; gmail_extract_dates_from_email falls back to regex-only extraction",
            ));
        }
        result
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| Error::MissingEnv(key.to_string()))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_all() {
        for key in [
            "USER_ID",
            "OAUTH_BROKER_URL",
            "GATEWAY_BIND",
            "GATEWAY_PORT",
            "BROKER_BASE_URL",
            "GITHUB_CLIENT_ID",
            "GITHUB_CLIENT_SECRET",
            "GOOGLE_CLIENT_ID",
            "GOOGLE_CLIENT_SECRET",
            "SUPABASE_URL",
            "SUPABASE_KEY",
            "ANTHROPIC_API_KEY",
        ] {
            // SAFETY: tests are serialized via ENV_LOCK, no concurrent env access.
            unsafe { std::env::remove_var(key) };
        }
    }

    #[test]
    fn missing_user_id_is_an_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        assert!(matches!(Config::from_env(), Err(Error::MissingEnv(k)) if k == "USER_ID"));
    }

    #[test]
    fn minimal_config_defaults_port_and_bind() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        // SAFETY: serialized by ENV_LOCK.
        unsafe { std::env::set_var("USER_ID", "jason") };
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.user_id, "jason");
        assert_eq!(cfg.port, 8787);
        assert_eq!(cfg.bind, "0.0.0.0");
        assert!(cfg.github.is_none());
        assert!(cfg.oauth_broker_url.is_none());
        clear_all();
    }

    #[test]
    fn lopsided_provider_credentials_are_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        // SAFETY: serialized by ENV_LOCK.
        unsafe {
            std::env::set_var("USER_ID", "jason");
            std::env::set_var("GITHUB_CLIENT_ID", "abc");
        }
        assert!(Config::from_env().is_err());
        clear_all();
    }

    #[test]
    fn diagnostics_warn_on_unconfigured_providers() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        // SAFETY: serialized by ENV_LOCK.
        unsafe { std::env::set_var("USER_ID", "jason") };
        let cfg = Config::from_env().unwrap();
        let diags = cfg.diagnostics();
        assert_eq!(diags.diagnostics.len(), 4);
        clear_all();
    }
}
