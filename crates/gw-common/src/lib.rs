//! Shared error plumbing and process-wide logging setup.
//!
//! Every other crate in the workspace defines its own `Error` type rather
//! than sharing one enum; this crate only provides the `FromMessage` trait
//! and the `impl_context!` macro used to give each crate's `Result` a
//! `.context()` / `.with_context()` extension, plus `init_tracing` for the
//! one process entry point.

pub mod error;
pub mod logging;

pub use error::FromMessage;
pub use logging::init_tracing;
