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
use crate::providers::runware::{self, GenerateImageOptions};
use crate::tools::{
    ToolContext, ToolResponse, internal_error, invalid_params, serialize_response,
};

const MIN_DIMENSION: u32 = 128;
const MAX_DIMENSION: u32 = 2048;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateImageRequest {
    #[schemars(description = "User id; the generation is recorded in this user's history")]
    pub user_id: String,
    #[schemars(description = "Image description")]
    pub prompt: String,
    #[schemars(description = "Output width in pixels, multiple of 64, default 512")]
    pub width: Option<u32>,
    #[schemars(description = "Output height in pixels, multiple of 64, default 512")]
    pub height: Option<u32>,
    #[schemars(description = "Runware model identifier, default runware:100@1")]
    pub model: Option<String>,
    #[schemars(description = "Runware API key override; otherwise the stored key is used")]
    pub api_key: Option<String>,
}

fn check_dimension(name: &'static str, value: u32) -> Result<(), McpError> {
    if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) || value % 64 != 0 {
        return Err(invalid_params(
            "invalid output dimensions",
            format!("{name} must be a multiple of 64 within [{MIN_DIMENSION}, {MAX_DIMENSION}], got {value}"),
        ));
    }
    Ok(())
}

pub async fn generate_image(
    context: &ToolContext,
    Parameters(request): Parameters<GenerateImageRequest>,
) -> Result<CallToolResult, McpError> {
    let prompt = request.prompt.trim().to_string();
    if prompt.is_empty() {
        return Err(McpError::invalid_params("prompt must not be empty", None));
    }
    let width = request.width.unwrap_or(512);
    let height = request.height.unwrap_or(512);
    check_dimension("width", width)?;
    check_dimension("height", height)?;

    let api_key = context
        .keys
        .resolve(&request.user_id, Service::Runware, request.api_key.as_deref())
        .await
        .map_err(|err| invalid_params("missing runware api key", err))?;

    let generated = runware::generate_image(
        GenerateImageOptions {
            prompt: prompt.clone(),
            width,
            height,
            model: request.model.clone(),
            output_format: None,
        },
        &api_key,
    )
    .await
    .map_err(|err| internal_error("generate image failed", err))?;

    let record = GenerationRecord {
        user_id: request.user_id.clone(),
        prompt,
        result_url: generated.image_url.clone(),
        created_at: Utc::now().to_rfc3339(),
        seed: generated.seed,
    };
    if let Err(err) = save_generation_record(&context.storage, &record).await {
        tracing::warn!(error = %err, "failed to record generation history");
    }

    let response = ToolResponse {
        url: generated.image_url,
        name: "generated-image".to_string(),
        mime_type: "image/webp".to_string(),
        text: "Image generated.".to_string(),
    };
    Ok(CallToolResult::success(vec![Content::text(
        serialize_response(&response)?,
    )]))
}
