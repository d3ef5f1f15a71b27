use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars::JsonSchema,
};
use serde::Deserialize;

use crate::cache::list_generation_records;
use crate::tools::{ToolContext, internal_error};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListHistoryRequest {
    #[schemars(description = "User id whose history to list")]
    pub user_id: String,
    #[schemars(description = "Maximum number of records, default 10")]
    pub limit: Option<u32>,
}

/// Past generations for one user, most recent first.
pub async fn list_history(
    context: &ToolContext,
    Parameters(request): Parameters<ListHistoryRequest>,
) -> Result<CallToolResult, McpError> {
    if request.user_id.trim().is_empty() {
        return Err(McpError::invalid_params("user_id must not be empty", None));
    }
    let limit = request.limit.unwrap_or(10).max(1) as usize;
    let records = list_generation_records(&context.storage, request.user_id.trim(), limit)
        .await
        .map_err(|err| internal_error("list history failed", err))?;
    let json = serde_json::to_string(&records)
        .map_err(|err| internal_error("serialize history records failed", err))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
