use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars::JsonSchema,
};
use serde::Deserialize;

use crate::image_processing::{self, crop_square_pixels, square_side};
use crate::tools::fetch::fetch_image_pixels;
use crate::tools::results::{image_contents, lookup_cached, store_image_result};
use crate::tools::{ToolContext, ToolResponse, internal_error, serialize_response};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CropSquareRequest {
    #[schemars(description = "Image URL")]
    pub url: String,
}

/// Crops to the centered `min(width, height)` square.
pub async fn crop_square(
    context: &ToolContext,
    Parameters(request): Parameters<CropSquareRequest>,
) -> Result<CallToolResult, McpError> {
    let cache_key_input = format!("crop_square:{}", request.url);
    if let Some((url, mime_type)) = lookup_cached(&context.storage, &cache_key_input).await {
        let response = ToolResponse {
            url,
            name: "cropped-image".to_string(),
            mime_type,
            text: "Image cropped to square.".to_string(),
        };
        return Ok(CallToolResult::success(vec![Content::text(
            serialize_response(&response)?,
        )]));
    }

    let (pixels, width, height) = fetch_image_pixels(&request.url).await?;
    let cropped = crop_square_pixels(&pixels, width, height)
        .map_err(|err| internal_error("crop failed", err))?;
    let side = square_side(width, height);
    let png = image_processing::encode_png(&cropped, side, side)
        .map_err(|err| internal_error("encode image failed", err))?;

    let stored = store_image_result(&context.storage, &cache_key_input, &png, "image/png").await;
    Ok(CallToolResult::success(image_contents(
        stored,
        "cropped-image",
        &format!("Image cropped to {side}x{side}."),
    )?))
}
