//! Custodian of `TokenRecord`s. Owns the `FileTokenStore`, runs the
//! authorization-code flow end to end, and decides when a stored token
//! needs refreshing before it's handed to a caller (spec.md §4.5).

pub mod broker;
pub mod error;
pub mod provider_config;

pub use broker::{Broker, IssuedToken};
pub use error::{Error, Result};
