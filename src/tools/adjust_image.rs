use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars::JsonSchema,
};
use serde::Deserialize;

use crate::filters::{Adjustments, apply_adjustments};
use crate::image_processing;
use crate::tools::fetch::fetch_image_pixels;
use crate::tools::results::{image_contents, lookup_cached, store_image_result};
use crate::tools::{
    ToolContext, ToolResponse, internal_error, invalid_params, serialize_response,
};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AdjustImageRequest {
    #[schemars(description = "Image URL")]
    pub url: String,
    #[schemars(description = "Brightness percentage, 0-200, default 100")]
    pub brightness: Option<f32>,
    #[schemars(description = "Contrast percentage, 0-200, default 100")]
    pub contrast: Option<f32>,
    #[schemars(description = "Saturation percentage, 0-200, default 100")]
    pub saturation: Option<f32>,
    #[schemars(description = "Blur radius in pixels, 0-10, default 0")]
    pub blur: Option<f32>,
    #[schemars(description = "Rotation in degrees, -360 to 360, default 0")]
    pub rotation: Option<f32>,
    #[schemars(description = "Mirror the image horizontally")]
    pub flip_horizontal: Option<bool>,
    #[schemars(description = "Mirror the image vertically")]
    pub flip_vertical: Option<bool>,
}

impl AdjustImageRequest {
    fn to_adjustments(&self) -> Adjustments {
        let defaults = Adjustments::default();
        Adjustments {
            brightness: self.brightness.unwrap_or(defaults.brightness),
            contrast: self.contrast.unwrap_or(defaults.contrast),
            saturation: self.saturation.unwrap_or(defaults.saturation),
            blur: self.blur.unwrap_or(defaults.blur),
            rotation: self.rotation.unwrap_or(defaults.rotation),
            flip_horizontal: self.flip_horizontal.unwrap_or(false),
            flip_vertical: self.flip_vertical.unwrap_or(false),
        }
    }
}

pub async fn adjust_image(
    context: &ToolContext,
    Parameters(request): Parameters<AdjustImageRequest>,
) -> Result<CallToolResult, McpError> {
    let adjustments = request.to_adjustments();
    adjustments
        .validate()
        .map_err(|err| invalid_params("invalid adjustment parameters", err))?;

    let cache_key_input = format!(
        "adjust:{}:{}:{}:{}:{}:{}:{}:{}",
        request.url,
        adjustments.brightness,
        adjustments.contrast,
        adjustments.saturation,
        adjustments.blur,
        adjustments.rotation,
        adjustments.flip_horizontal,
        adjustments.flip_vertical,
    );
    if let Some((url, mime_type)) = lookup_cached(&context.storage, &cache_key_input).await {
        let response = ToolResponse {
            url,
            name: "adjusted-image".to_string(),
            mime_type,
            text: "Adjustments applied.".to_string(),
        };
        return Ok(CallToolResult::success(vec![Content::text(
            serialize_response(&response)?,
        )]));
    }

    let (pixels, width, height) = fetch_image_pixels(&request.url).await?;
    let adjusted = apply_adjustments(&pixels, width, height, &adjustments)
        .map_err(|err| internal_error("apply adjustments failed", err))?;
    let png = image_processing::encode_png(&adjusted, width, height)
        .map_err(|err| internal_error("encode image failed", err))?;

    let stored = store_image_result(&context.storage, &cache_key_input, &png, "image/png").await;
    Ok(CallToolResult::success(image_contents(
        stored,
        "adjusted-image",
        "Adjustments applied.",
    )?))
}
