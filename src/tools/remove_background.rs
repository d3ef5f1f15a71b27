use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars::JsonSchema,
};
use serde::Deserialize;

use crate::effects;
use crate::image_processing;
use crate::keys::Service;
use crate::providers::removebg;
use crate::tools::fetch::{fetch_image_pixels, fetch_url_bytes};
use crate::tools::results::{image_contents, lookup_cached, store_image_result};
use crate::tools::{
    ToolContext, ToolResponse, internal_error, invalid_params, serialize_response,
};

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundMode {
    /// Local luminance threshold: near-white and near-black pixels become
    /// transparent. Fast and offline, but destroys bright or dark subjects.
    Threshold,
    /// remove.bg segmentation; requires an API key for the user.
    Service,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RemoveBackgroundRequest {
    #[schemars(description = "User id, used to resolve the stored remove.bg key")]
    pub user_id: String,
    #[schemars(description = "Image URL")]
    pub url: String,
    #[schemars(description = "threshold (local, naive) or service (remove.bg)")]
    pub mode: BackgroundMode,
    #[schemars(description = "remove.bg API key override; otherwise the stored key is used")]
    pub api_key: Option<String>,
}

pub async fn remove_background(
    context: &ToolContext,
    Parameters(request): Parameters<RemoveBackgroundRequest>,
) -> Result<CallToolResult, McpError> {
    let mode_name = match request.mode {
        BackgroundMode::Threshold => "threshold",
        BackgroundMode::Service => "service",
    };
    let cache_key_input = format!("remove_background:{mode_name}:{}", request.url);
    if let Some((url, mime_type)) = lookup_cached(&context.storage, &cache_key_input).await {
        let response = ToolResponse {
            url,
            name: "background-removed".to_string(),
            mime_type,
            text: "Background removed.".to_string(),
        };
        return Ok(CallToolResult::success(vec![Content::text(
            serialize_response(&response)?,
        )]));
    }

    let png = match request.mode {
        BackgroundMode::Threshold => {
            let (pixels, width, height) = fetch_image_pixels(&request.url).await?;
            let cleared = effects::remove_background(&pixels, width, height)
                .map_err(|err| internal_error("remove background failed", err))?;
            image_processing::encode_png(&cleared, width, height)
                .map_err(|err| internal_error("encode image failed", err))?
        }
        BackgroundMode::Service => {
            let api_key = context
                .keys
                .resolve(&request.user_id, Service::Removebg, request.api_key.as_deref())
                .await
                .map_err(|err| invalid_params("missing remove.bg api key", err))?;
            let file = fetch_url_bytes(&request.url).await?;
            removebg::remove_background(file.bytes, "image.png", &api_key)
                .await
                .map_err(|err| internal_error("remove.bg request failed", err))?
        }
    };

    let stored = store_image_result(&context.storage, &cache_key_input, &png, "image/png").await;
    Ok(CallToolResult::success(image_contents(
        stored,
        "background-removed",
        "Background removed.",
    )?))
}
