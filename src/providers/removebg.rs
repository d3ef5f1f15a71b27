//! remove.bg segmentation. Multipart upload keyed by the `X-Api-Key`
//! header; success is raw PNG bytes, failure a JSON `errors` payload.

use anyhow::{Result, anyhow};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

const REMOVEBG_ENDPOINT: &str = "https://api.remove.bg/v1.0/removebg";

#[derive(Debug, Deserialize)]
struct RemoveBgErrorResponse {
    errors: Option<Vec<RemoveBgError>>,
}

#[derive(Debug, Deserialize)]
struct RemoveBgError {
    title: Option<String>,
}

/// Sends the image and returns the cut-out as PNG bytes.
pub async fn remove_background(image: Vec<u8>, file_name: &str, api_key: &str) -> Result<Vec<u8>> {
    let client = Client::new();
    let part = Part::bytes(image).file_name(file_name.to_string());
    let form = Form::new().part("image_file", part).text("size", "auto");
    let response = client
        .post(REMOVEBG_ENDPOINT)
        .header("X-Api-Key", api_key)
        .multipart(form)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let title = serde_json::from_str::<RemoveBgErrorResponse>(&body)
            .ok()
            .and_then(|payload| payload.errors)
            .and_then(|errors| errors.into_iter().next())
            .and_then(|err| err.title)
            .unwrap_or(body);
        return Err(anyhow!("remove.bg request failed: {status} {title}"));
    }
    Ok(response.bytes().await?.to_vec())
}
