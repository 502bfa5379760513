//! Fixed upstream endpoint URLs for the two OAuth providers.
//!
//! These are not operator-configurable: GitHub and Google publish one
//! authorization/token endpoint pair each. Only the client id/secret pair
//! and consent scope vary per deployment (read from the environment in
//! [`crate::Config`]).

/// Static, non-secret metadata for a single OAuth provider.
pub struct ProviderEndpoints {
    pub auth_endpoint: &'static str,
    pub token_endpoint: &'static str,
    pub default_scope: &'static str,
}

pub const GITHUB: ProviderEndpoints = ProviderEndpoints {
    auth_endpoint: "https://github.com/login/oauth/authorize",
    token_endpoint: "https://github.com/login/oauth/access_token",
    default_scope: "repo read:user",
};

pub const GOOGLE: ProviderEndpoints = ProviderEndpoints {
    auth_endpoint: "https://accounts.google.com/o/oauth2/v2/auth",
    token_endpoint: "https://oauth2.googleapis.com/token",
    default_scope: "https://www.googleapis.com/auth/gmail.modify https://www.googleapis.com/auth/calendar https://www.googleapis.com/auth/drive",
};
