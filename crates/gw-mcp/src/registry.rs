use crate::types::{CallToolResult, Tool};

/// Per-tool-call context. Carries what a handler needs to resolve
/// credentials and address the right upstream, without handlers needing
/// to know which transport or deployment wired them up (spec.md §4.2).
pub struct ToolContext {
    pub user_id: String,
}

/// One provider's tool catalog plus the dispatch table behind it
/// (spec.md §4.2 "Handler Registry"). One implementation per provider:
/// `github`, `calendar`, `drive`, `gmail`, `supabase`.
#[async_trait::async_trait]
pub trait ProviderRegistry: Send + Sync {
    /// The provider tag this registry namespaces its tools under
    /// (e.g. `"github"`, `"gmail"`).
    fn name(&self) -> &'static str;

    /// Every tool this provider declares, in a stable order.
    fn list_tools(&self) -> Vec<Tool>;

    /// Dispatch `inner_name` (the tool name with the provider prefix
    /// already stripped by the caller) with `arguments`.
    async fn call_tool(&self, inner_name: &str, arguments: serde_json::Value, ctx: &ToolContext) -> CallToolResult;
}
