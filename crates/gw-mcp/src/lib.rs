//! The JSON-RPC 2.0 gateway: envelope parsing, method dispatch, and the
//! `initialize` handshake, plus the handler-registry composition that
//! backs `tools/list` and `tools/call` (spec.md §4.1, §4.2).

pub mod error;
pub mod gateway;
pub mod registry;
pub mod types;

pub use error::{Error, Result};
pub use gateway::Gateway;
pub use registry::{ProviderRegistry, ToolContext};
pub use types::{CallToolResult, JsonRpcRequest, JsonRpcResponse, Tool, ToolContent, error_codes};
