use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars::JsonSchema,
};
use serde::Deserialize;

use crate::image_processing;
use crate::pdf_ops::{self, PdfImage};
use crate::tools::fetch::fetch_image_pixels;
use crate::tools::results::{lookup_cached, store_result};
use crate::tools::{ToolContext, ToolResponse, internal_error, serialize_response};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ImagesToPdfRequest {
    #[schemars(description = "Image URLs, one page per image in order")]
    pub urls: Vec<String>,
}

/// Combines the given images into one PDF, one letter-size page each.
pub async fn images_to_pdf(
    context: &ToolContext,
    Parameters(request): Parameters<ImagesToPdfRequest>,
) -> Result<CallToolResult, McpError> {
    if request.urls.is_empty() {
        return Err(McpError::invalid_params(
            "at least one image url is required",
            None,
        ));
    }

    let cache_key_input = format!("images_to_pdf:{}", request.urls.join("|"));
    if let Some((url, mime_type)) = lookup_cached(&context.storage, &cache_key_input).await {
        let response = ToolResponse {
            url,
            name: "converted-images".to_string(),
            mime_type,
            text: "Images converted to PDF.".to_string(),
        };
        return Ok(CallToolResult::success(vec![Content::text(
            serialize_response(&response)?,
        )]));
    }

    let mut images = Vec::with_capacity(request.urls.len());
    for url in &request.urls {
        let (pixels, width, height) = fetch_image_pixels(url).await?;
        let jpeg = image_processing::encode_jpeg(&pixels, width, height)
            .map_err(|err| internal_error("encode image failed", err))?;
        images.push(PdfImage {
            jpeg,
            width,
            height,
        });
    }
    let pdf = pdf_ops::images_to_pdf(&images)
        .map_err(|err| internal_error("build pdf failed", err))?;

    let url = store_result(&context.storage, &cache_key_input, &pdf, "application/pdf").await?;
    let response = ToolResponse {
        url,
        name: "converted-images".to_string(),
        mime_type: "application/pdf".to_string(),
        text: format!("{} images converted to PDF.", request.urls.len()),
    };
    Ok(CallToolResult::success(vec![Content::text(
        serialize_response(&response)?,
    )]))
}
