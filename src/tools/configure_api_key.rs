use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars::JsonSchema,
};
use serde::Deserialize;

use crate::keys::Service;
use crate::tools::{ToolContext, invalid_params};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConfigureApiKeyRequest {
    #[schemars(description = "User id the key belongs to")]
    pub user_id: String,
    #[schemars(description = "Service: runware, huggingface or removebg")]
    pub service: Service,
    #[schemars(description = "The API key to store")]
    pub api_key: String,
}

pub async fn configure_api_key(
    context: &ToolContext,
    Parameters(request): Parameters<ConfigureApiKeyRequest>,
) -> Result<CallToolResult, McpError> {
    if request.user_id.trim().is_empty() {
        return Err(McpError::invalid_params("user_id must not be empty", None));
    }
    context
        .keys
        .set(request.user_id.trim(), request.service, &request.api_key)
        .await
        .map_err(|err| invalid_params("store api key failed", err))?;
    Ok(CallToolResult::success(vec![Content::text(format!(
        "{} api key stored",
        request.service.name()
    ))]))
}
