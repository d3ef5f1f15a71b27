use chrono::Utc;
use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars::JsonSchema,
};
use serde::Deserialize;

use crate::cache::{GenerationRecord, save_generation_record};
use crate::keys::Service;
use crate::providers::huggingface;
use crate::tools::results::store_unique_result;
use crate::tools::{
    ToolContext, ToolResponse, internal_error, invalid_params, serialize_response,
};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateTextRequest {
    #[schemars(description = "User id; the generation is recorded in this user's history")]
    pub user_id: String,
    #[schemars(description = "Prompt for the text model")]
    pub prompt: String,
    #[schemars(description = "Hugging Face model id, default microsoft/DialoGPT-large")]
    pub model: Option<String>,
    #[schemars(description = "Hugging Face API key override; otherwise the stored key is used")]
    pub api_key: Option<String>,
}

pub async fn generate_text(
    context: &ToolContext,
    Parameters(request): Parameters<GenerateTextRequest>,
) -> Result<CallToolResult, McpError> {
    let prompt = request.prompt.trim().to_string();
    if prompt.is_empty() {
        return Err(McpError::invalid_params("prompt must not be empty", None));
    }

    let api_key = context
        .keys
        .resolve(
            &request.user_id,
            Service::Huggingface,
            request.api_key.as_deref(),
        )
        .await
        .map_err(|err| invalid_params("missing huggingface api key", err))?;

    let text = huggingface::generate_text(&prompt, request.model.as_deref(), &api_key)
        .await
        .map_err(|err| internal_error("generate text failed", err))?;

    let key_input = format!(
        "text:{}:{}:{}",
        request.user_id,
        prompt,
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    );
    let url = store_unique_result(&context.storage, &key_input, text.as_bytes(), "text/plain")
        .await?;

    let record = GenerationRecord {
        user_id: request.user_id.clone(),
        prompt,
        result_url: url.clone(),
        created_at: Utc::now().to_rfc3339(),
        seed: None,
    };
    if let Err(err) = save_generation_record(&context.storage, &record).await {
        tracing::warn!(error = %err, "failed to record generation history");
    }

    let response = ToolResponse {
        url,
        name: "generated-text".to_string(),
        mime_type: "text/plain".to_string(),
        text,
    };
    Ok(CallToolResult::success(vec![Content::text(
        serialize_response(&response)?,
    )]))
}
