//! Gives tool handlers one call — `resolve(user_id, provider)` — that
//! hides whether the broker is reachable in-process or over HTTP
//! (spec.md §4.4).

pub mod error;
pub mod resolver;

pub use error::{Error, Result};
pub use resolver::{AuthResolver, BoundResolver, HttpResolver, Resolver};
