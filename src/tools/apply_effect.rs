use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars::JsonSchema,
};
use serde::Deserialize;

use crate::effects::{self, Effect};
use crate::image_processing;
use crate::tools::fetch::fetch_image_pixels;
use crate::tools::results::{image_contents, lookup_cached, store_image_result};
use crate::tools::{ToolContext, ToolResponse, internal_error, serialize_response};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ApplyEffectRequest {
    #[schemars(description = "Image URL; pass a previous result URL to stack effects")]
    pub url: String,
    #[schemars(description = "Effect: grayscale, sepia, invert, vintage or sharpen")]
    pub effect: Effect,
}

pub async fn apply_effect(
    context: &ToolContext,
    Parameters(request): Parameters<ApplyEffectRequest>,
) -> Result<CallToolResult, McpError> {
    let cache_key_input = format!("effect:{}:{}", request.url, request.effect.name());
    if let Some((url, mime_type)) = lookup_cached(&context.storage, &cache_key_input).await {
        let response = ToolResponse {
            url,
            name: format!("{}-image", request.effect.name()),
            mime_type,
            text: format!("{} effect applied.", request.effect.name()),
        };
        return Ok(CallToolResult::success(vec![Content::text(
            serialize_response(&response)?,
        )]));
    }

    let (pixels, width, height) = fetch_image_pixels(&request.url).await?;
    let transformed = effects::apply_effect(&pixels, width, height, request.effect)
        .map_err(|err| internal_error("apply effect failed", err))?;
    let png = image_processing::encode_png(&transformed, width, height)
        .map_err(|err| internal_error("encode image failed", err))?;

    let stored = store_image_result(&context.storage, &cache_key_input, &png, "image/png").await;
    Ok(CallToolResult::success(image_contents(
        stored,
        &format!("{}-image", request.effect.name()),
        &format!("{} effect applied.", request.effect.name()),
    )?))
}
