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
use crate::providers::runware::{self, GenerateVideoOptions};
use crate::tools::{
    ToolContext, ToolResponse, internal_error, invalid_params, serialize_response,
};

const MIN_DURATION: u32 = 1;
const MAX_DURATION: u32 = 10;
const MIN_FPS: u32 = 1;
const MAX_FPS: u32 = 30;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateVideoRequest {
    #[schemars(description = "User id; the generation is recorded in this user's history")]
    pub user_id: String,
    #[schemars(description = "Video description")]
    pub prompt: String,
    #[schemars(description = "Clip length in seconds, 1-10, default 3")]
    pub duration: Option<u32>,
    #[schemars(description = "Frames per second, 1-30, default 8")]
    pub fps: Option<u32>,
    #[schemars(description = "Runware model identifier, default runware:100@1")]
    pub model: Option<String>,
    #[schemars(description = "Runware API key override; otherwise the stored key is used")]
    pub api_key: Option<String>,
}

pub async fn generate_video(
    context: &ToolContext,
    Parameters(request): Parameters<GenerateVideoRequest>,
) -> Result<CallToolResult, McpError> {
    let prompt = request.prompt.trim().to_string();
    if prompt.is_empty() {
        return Err(McpError::invalid_params("prompt must not be empty", None));
    }
    let duration = request.duration.unwrap_or(3);
    if !(MIN_DURATION..=MAX_DURATION).contains(&duration) {
        return Err(invalid_params(
            "invalid duration",
            format!("duration must be within [{MIN_DURATION}, {MAX_DURATION}] seconds, got {duration}"),
        ));
    }
    let fps = request.fps.unwrap_or(8);
    if !(MIN_FPS..=MAX_FPS).contains(&fps) {
        return Err(invalid_params(
            "invalid fps",
            format!("fps must be within [{MIN_FPS}, {MAX_FPS}], got {fps}"),
        ));
    }

    let api_key = context
        .keys
        .resolve(&request.user_id, Service::Runware, request.api_key.as_deref())
        .await
        .map_err(|err| invalid_params("missing runware api key", err))?;

    let video_url = runware::generate_video(
        GenerateVideoOptions {
            prompt: prompt.clone(),
            duration_seconds: duration,
            fps,
            model: request.model.clone(),
        },
        &api_key,
    )
    .await
    .map_err(|err| internal_error("generate video failed", err))?;

    let record = GenerationRecord {
        user_id: request.user_id.clone(),
        prompt,
        result_url: video_url.clone(),
        created_at: Utc::now().to_rfc3339(),
        seed: None,
    };
    if let Err(err) = save_generation_record(&context.storage, &record).await {
        tracing::warn!(error = %err, "failed to record generation history");
    }

    let response = ToolResponse {
        url: video_url,
        name: "generated-video".to_string(),
        mime_type: "video/mp4".to_string(),
        text: "Video generated.".to_string(),
    };
    Ok(CallToolResult::success(vec![Content::text(
        serialize_response(&response)?,
    )]))
}
