/// MCP Tool handlers for docscout.
///
/// 1. search_docs – rank catalog titles and return snippets
/// 2. fetch_doc   – full page content, or the catalog when no uri is given
use crate::mcp::server::McpContext;
use rmcp::handler::server::ServerHandler;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{ErrorData as McpError, handler::server::tool::ToolRouter, model::*, tool, tool_router};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ── Parameter structs ────────────────────────────────────────────────

#[derive(Deserialize, JsonSchema)]
struct SearchDocsParams {
    /// Search query (natural language)
    query: String,
    /// Max results (default: 5)
    k: Option<usize>,
}

#[derive(Deserialize, JsonSchema)]
struct FetchDocParams {
    /// Document URL (http/https). Omit to list every known document.
    #[serde(default)]
    uri: Option<String>,
}

// ── Response helpers ─────────────────────────────────────────────────

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("serialization failed: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn error_result(msg: &str) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(msg.to_string())]))
}

// ── Tool implementations ─────────────────────────────────────────────

#[derive(Clone)]
pub struct AppTools {
    pub ctx: McpContext,
    pub tool_router: ToolRouter<Self>,
}

impl ServerHandler for AppTools {}

#[tool_router]
impl AppTools {
    pub fn new(ctx: McpContext) -> Self {
        Self {
            ctx,
            tool_router: Self::tool_router(),
        }
    }

    // ── Tool 1: search_docs ─────────────────────────────────────────

    #[tool(
        description = "Search the curated documentation and return ranked results. Each result has url, title, score (0-1, higher is better) and a content snippet."
    )]
    async fn search_docs(
        &self,
        params: Parameters<SearchDocsParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        if p.query.trim().is_empty() {
            return error_result("query is required");
        }

        let k = p.k.unwrap_or(self.ctx.config.search_top_k);

        match self.ctx.service.search_docs(&p.query, k).await {
            Ok(hits) => json_result(&hits),
            Err(e) => error_result(&format!("documentation catalog unavailable: {e}")),
        }
    }

    // ── Tool 2: fetch_doc ───────────────────────────────────────────

    #[tool(
        description = "Fetch the full content of a documentation page by URL. Without a uri, returns the list of all known documents as {urls: [{url, title}]}."
    )]
    async fn fetch_doc(
        &self,
        params: Parameters<FetchDocParams>,
    ) -> Result<CallToolResult, McpError> {
        let response = self.ctx.service.fetch_doc(params.0.uri.as_deref()).await;
        json_result(&response)
    }
}
