use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars::JsonSchema,
};
use serde::Deserialize;

use crate::pdf_ops;
use crate::tools::fetch::fetch_url_bytes;
use crate::tools::results::{lookup_cached, store_result};
use crate::tools::{ToolContext, ToolResponse, internal_error, serialize_response};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MergePdfRequest {
    #[schemars(description = "PDF URLs, merged in order; at least two")]
    pub urls: Vec<String>,
}

pub async fn merge_pdf(
    context: &ToolContext,
    Parameters(request): Parameters<MergePdfRequest>,
) -> Result<CallToolResult, McpError> {
    if request.urls.len() < 2 {
        return Err(McpError::invalid_params(
            "at least two pdf urls are required",
            None,
        ));
    }

    let cache_key_input = format!("merge:{}", request.urls.join("|"));
    if let Some((url, mime_type)) = lookup_cached(&context.storage, &cache_key_input).await {
        let response = ToolResponse {
            url,
            name: "merged-document".to_string(),
            mime_type,
            text: "PDFs merged.".to_string(),
        };
        return Ok(CallToolResult::success(vec![Content::text(
            serialize_response(&response)?,
        )]));
    }

    let mut inputs = Vec::with_capacity(request.urls.len());
    for url in &request.urls {
        inputs.push(fetch_url_bytes(url).await?.bytes);
    }
    let merged =
        pdf_ops::merge_pdfs(&inputs).map_err(|err| internal_error("merge pdfs failed", err))?;

    let url = store_result(&context.storage, &cache_key_input, &merged, "application/pdf").await?;
    let response = ToolResponse {
        url,
        name: "merged-document".to_string(),
        mime_type: "application/pdf".to_string(),
        text: format!("{} PDFs merged.", request.urls.len()),
    };
    Ok(CallToolResult::success(vec![Content::text(
        serialize_response(&response)?,
    )]))
}
