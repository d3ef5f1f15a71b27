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

const MIN_DURATION: u32 = 5;
const MAX_DURATION: u32 = 30;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateMusicRequest {
    #[schemars(description = "User id; the generation is recorded in this user's history")]
    pub user_id: String,
    #[schemars(description = "Description of the music")]
    pub prompt: String,
    #[schemars(description = "Genre prefix for the prompt, default ambient")]
    pub genre: Option<String>,
    #[schemars(description = "Clip length in seconds, 5-30, default 10")]
    pub duration: Option<u32>,
    #[schemars(description = "Hugging Face API key override; otherwise the stored key is used")]
    pub api_key: Option<String>,
}

pub async fn generate_music(
    context: &ToolContext,
    Parameters(request): Parameters<GenerateMusicRequest>,
) -> Result<CallToolResult, McpError> {
    let prompt = request.prompt.trim().to_string();
    if prompt.is_empty() {
        return Err(McpError::invalid_params("prompt must not be empty", None));
    }
    let duration = request.duration.unwrap_or(10);
    if !(MIN_DURATION..=MAX_DURATION).contains(&duration) {
        return Err(invalid_params(
            "invalid duration",
            format!("duration must be within [{MIN_DURATION}, {MAX_DURATION}] seconds, got {duration}"),
        ));
    }
    let genre = request.genre.as_deref().unwrap_or("ambient");
    let full_prompt = format!("{genre} music, {duration} seconds, {prompt}");

    let api_key = context
        .keys
        .resolve(
            &request.user_id,
            Service::Huggingface,
            request.api_key.as_deref(),
        )
        .await
        .map_err(|err| invalid_params("missing huggingface api key", err))?;

    let audio = huggingface::generate_music(&full_prompt, duration, &api_key)
        .await
        .map_err(|err| internal_error("generate music failed", err))?;

    let key_input = format!(
        "music:{}:{}:{}",
        request.user_id,
        full_prompt,
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    );
    let url =
        store_unique_result(&context.storage, &key_input, &audio.bytes, &audio.mime_type).await?;

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
        name: "generated-music".to_string(),
        mime_type: audio.mime_type,
        text: "Music generated.".to_string(),
    };
    Ok(CallToolResult::success(vec![Content::text(
        serialize_response(&response)?,
    )]))
}
