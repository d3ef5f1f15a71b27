//! Hugging Face hosted inference, bearer-keyed. Text models answer with
//! `[{generated_text}]`; failures come back as `{error}` in an otherwise
//! 2xx-or-not body.

use anyhow::{Result, anyhow};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::providers::assert_ok_response;

const INFERENCE_BASE_URL: &str = "https://api-inference.huggingface.co/models";
const DEFAULT_TEXT_MODEL: &str = "microsoft/DialoGPT-large";
const MUSIC_MODEL: &str = "facebook/musicgen-small";

pub struct GeneratedAudio {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextInferenceResponse {
    Generated(Vec<GeneratedText>),
    Error { error: String },
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: Option<String>,
}

pub async fn generate_text(prompt: &str, model: Option<&str>, api_key: &str) -> Result<String> {
    let client = Client::new();
    let model = model.unwrap_or(DEFAULT_TEXT_MODEL);
    let response = client
        .post(format!("{INFERENCE_BASE_URL}/{model}"))
        .bearer_auth(api_key)
        .json(&json!({
            "inputs": prompt,
            "parameters": {
                "max_new_tokens": 250,
                "return_full_text": false,
            }
        }))
        .send()
        .await?;

    let response = assert_ok_response("huggingface", response).await?;
    let payload: TextInferenceResponse = response.json().await?;
    match payload {
        TextInferenceResponse::Error { error } => {
            Err(anyhow!("huggingface returned an error: {error}"))
        }
        TextInferenceResponse::Generated(items) => items
            .into_iter()
            .next()
            .and_then(|item| item.generated_text)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| anyhow!("huggingface returned no generated text")),
    }
}

/// Music generation via musicgen. A successful response body is raw audio;
/// the mime type comes from the Content-Type header.
pub async fn generate_music(
    prompt: &str,
    duration_seconds: u32,
    api_key: &str,
) -> Result<GeneratedAudio> {
    let client = Client::new();
    let response = client
        .post(format!("{INFERENCE_BASE_URL}/{MUSIC_MODEL}"))
        .bearer_auth(api_key)
        .json(&json!({
            "inputs": prompt,
            "parameters": {
                "duration": duration_seconds,
            }
        }))
        .send()
        .await?;

    let response = assert_ok_response("huggingface", response).await?;
    let mime_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
        .unwrap_or_else(|| "audio/wav".to_string());
    Ok(GeneratedAudio {
        bytes: response.bytes().await?.to_vec(),
        mime_type,
    })
}
