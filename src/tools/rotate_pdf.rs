use rmcp::{
    ErrorData as McpError, handler::server::wrapper::Parameters, model::CallToolResult,
    schemars::JsonSchema,
};
use serde::Deserialize;

use crate::pdf_ops;
use crate::tools::ToolContext;
use crate::tools::fetch::fetch_url_bytes;
use crate::tools::results::{lookup_cached, store_result};
use crate::tools::split_pdf::{PdfFileOutcome, outcomes_result};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RotatePdfRequest {
    #[schemars(description = "PDF URLs; each file is rotated independently")]
    pub urls: Vec<String>,
    #[schemars(description = "Rotation angle: 90, 180 or 270")]
    pub angle: i64,
}

pub async fn rotate_pdf(
    context: &ToolContext,
    Parameters(request): Parameters<RotatePdfRequest>,
) -> Result<CallToolResult, McpError> {
    if request.urls.is_empty() {
        return Err(McpError::invalid_params("at least one pdf url is required", None));
    }
    if !matches!(request.angle, 90 | 180 | 270) {
        return Err(McpError::invalid_params(
            "angle must be 90, 180 or 270",
            None,
        ));
    }

    let mut outcomes = Vec::with_capacity(request.urls.len());
    for url in &request.urls {
        outcomes.push(rotate_one(context, url, request.angle).await);
    }
    outcomes_result(outcomes)
}

async fn rotate_one(context: &ToolContext, url: &str, angle: i64) -> PdfFileOutcome {
    let cache_key_input = format!("rotate_pdf:{url}:{angle}");
    if let Some((result_url, _)) = lookup_cached(&context.storage, &cache_key_input).await {
        return PdfFileOutcome::ok(url, result_url);
    }
    let file = match fetch_url_bytes(url).await {
        Ok(file) => file,
        Err(err) => return PdfFileOutcome::failed(url, format!("{err:?}")),
    };
    let rotated = match pdf_ops::rotate_pdf(&file.bytes, angle) {
        Ok(bytes) => bytes,
        Err(err) => return PdfFileOutcome::failed(url, err),
    };
    match store_result(&context.storage, &cache_key_input, &rotated, "application/pdf").await {
        Ok(result_url) => PdfFileOutcome::ok(url, result_url),
        Err(err) => PdfFileOutcome::failed(url, format!("{err:?}")),
    }
}
