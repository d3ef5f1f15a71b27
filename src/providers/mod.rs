pub mod huggingface;
pub mod removebg;
pub mod runware;

use anyhow::{Result, anyhow};

pub(crate) async fn assert_ok_response(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    Err(anyhow!("{provider} request failed: {status} {text}"))
}
