use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars::JsonSchema,
};
use serde::{Deserialize, Serialize};

use crate::pdf_ops::{self, parse_page_range};
use crate::tools::fetch::fetch_url_bytes;
use crate::tools::results::{lookup_cached, store_result};
use crate::tools::{ToolContext, internal_error};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SplitPdfRequest {
    #[schemars(description = "PDF URLs; each file is split independently")]
    pub urls: Vec<String>,
    #[schemars(description = "1-based inclusive page range, e.g. \"2-5\"")]
    pub pages: String,
}

/// Outcome for one input file; a bad range or fetch failure is reported
/// here instead of failing the whole call.
#[derive(Serialize)]
pub struct PdfFileOutcome {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PdfFileOutcome {
    pub fn ok(url: &str, result_url: String) -> Self {
        Self {
            url: url.to_string(),
            result_url: Some(result_url),
            error: None,
        }
    }

    pub fn failed(url: &str, error: impl ToString) -> Self {
        Self {
            url: url.to_string(),
            result_url: None,
            error: Some(error.to_string()),
        }
    }
}

pub(crate) fn outcomes_result(outcomes: Vec<PdfFileOutcome>) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string(&outcomes)
        .map_err(|err| internal_error("serialize tool response failed", err))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

pub async fn split_pdf(
    context: &ToolContext,
    Parameters(request): Parameters<SplitPdfRequest>,
) -> Result<CallToolResult, McpError> {
    if request.urls.is_empty() {
        return Err(McpError::invalid_params("at least one pdf url is required", None));
    }

    let range = match parse_page_range(&request.pages) {
        Ok(range) => range,
        Err(err) => {
            // the range applies to every file, so every file reports it
            let outcomes = request
                .urls
                .iter()
                .map(|url| PdfFileOutcome::failed(url, &err))
                .collect();
            return outcomes_result(outcomes);
        }
    };

    let mut outcomes = Vec::with_capacity(request.urls.len());
    for url in &request.urls {
        outcomes.push(split_one(context, url, range).await);
    }
    outcomes_result(outcomes)
}

async fn split_one(
    context: &ToolContext,
    url: &str,
    range: pdf_ops::PageRange,
) -> PdfFileOutcome {
    let cache_key_input = format!("split:{url}:{}-{}", range.start, range.end);
    if let Some((result_url, _)) = lookup_cached(&context.storage, &cache_key_input).await {
        return PdfFileOutcome::ok(url, result_url);
    }
    let file = match fetch_url_bytes(url).await {
        Ok(file) => file,
        Err(err) => return PdfFileOutcome::failed(url, format!("{err:?}")),
    };
    let split = match pdf_ops::split_pdf(&file.bytes, range) {
        Ok(bytes) => bytes,
        Err(err) => return PdfFileOutcome::failed(url, err),
    };
    match store_result(&context.storage, &cache_key_input, &split, "application/pdf").await {
        Ok(result_url) => PdfFileOutcome::ok(url, result_url),
        Err(err) => PdfFileOutcome::failed(url, format!("{err:?}")),
    }
}
