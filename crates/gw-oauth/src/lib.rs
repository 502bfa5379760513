//! Drives the OAuth 2.0 authorization-code grant against GitHub and Google.
//! Provider-agnostic — see `gw-broker` for the provider-specific refresh
//! quirks (spec.md §4.5).

pub mod error;
pub mod flow;

pub use error::{Error, Result};
pub use flow::{AuthorizationRequest, OAuthFlow, TokenResponse};
