//! Runware inference. Every call is one POST carrying a task array: an
//! authentication task with the user's API key followed by the inference
//! task; the response `data` array is searched for the matching result.

use anyhow::{Result, anyhow};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::providers::assert_ok_response;

const RUNWARE_ENDPOINT: &str = "https://api.runware.ai/v1";
const DEFAULT_MODEL: &str = "runware:100@1";

pub struct GenerateImageOptions {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub model: Option<String>,
    pub output_format: Option<String>,
}

pub struct GeneratedImage {
    pub image_url: String,
    pub seed: Option<i64>,
}

pub struct GenerateVideoOptions {
    pub prompt: String,
    pub duration_seconds: u32,
    pub fps: u32,
    pub model: Option<String>,
}

pub struct TextInferenceOptions {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
struct RunwareResponse {
    data: Option<Vec<RunwareTaskResult>>,
    error: Option<serde_json::Value>,
    errors: Option<Vec<RunwareError>>,
    #[serde(rename = "errorMessage")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunwareTaskResult {
    #[serde(rename = "taskType")]
    task_type: Option<String>,
    #[serde(rename = "imageURL")]
    image_url: Option<String>,
    #[serde(rename = "videoURL")]
    video_url: Option<String>,
    text: Option<String>,
    seed: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RunwareError {
    message: Option<String>,
}

/// Posts the authentication task plus one inference task and returns the
/// result whose `taskType` matches.
async fn run_task(
    task_type: &str,
    task: serde_json::Value,
    api_key: &str,
) -> Result<RunwareTaskResult> {
    let client = Client::new();
    let response = client
        .post(RUNWARE_ENDPOINT)
        .json(&json!([
            {
                "taskType": "authentication",
                "apiKey": api_key,
            },
            task
        ]))
        .send()
        .await?;

    let response = assert_ok_response("runware", response).await?;
    let payload: RunwareResponse = response.json().await?;
    if payload.error.is_some() || payload.errors.is_some() {
        let message = payload
            .error_message
            .or_else(|| {
                payload
                    .errors
                    .and_then(|errors| errors.into_iter().next())
                    .and_then(|err| err.message)
            })
            .unwrap_or_else(|| "generation failed".to_string());
        return Err(anyhow!("runware returned an error: {message}"));
    }

    payload
        .data
        .and_then(|data| {
            data.into_iter()
                .find(|item| item.task_type.as_deref() == Some(task_type))
        })
        .ok_or_else(|| anyhow!("runware returned no {task_type} result"))
}

pub async fn generate_image(
    options: GenerateImageOptions,
    api_key: &str,
) -> Result<GeneratedImage> {
    let task_uuid = uuid::Uuid::new_v4().to_string();
    let model = options.model.as_deref().unwrap_or(DEFAULT_MODEL);
    let output_format = options.output_format.as_deref().unwrap_or("WEBP");

    debug!(task_uuid, model, "runware imageInference request");
    let result = run_task(
        "imageInference",
        json!({
            "taskType": "imageInference",
            "taskUUID": task_uuid,
            "positivePrompt": options.prompt,
            "width": options.width,
            "height": options.height,
            "model": model,
            "numberResults": 1,
            "outputFormat": output_format,
            "CFGScale": 1,
            "scheduler": "FlowMatchEulerDiscreteScheduler",
        }),
        api_key,
    )
    .await?;
    let image_url = result
        .image_url
        .ok_or_else(|| anyhow!("runware returned no image url"))?;
    Ok(GeneratedImage {
        image_url,
        seed: result.seed,
    })
}

/// Video generation at a fixed 512x512, returning the hosted video URL.
pub async fn generate_video(options: GenerateVideoOptions, api_key: &str) -> Result<String> {
    let task_uuid = uuid::Uuid::new_v4().to_string();
    let model = options.model.as_deref().unwrap_or(DEFAULT_MODEL);

    debug!(task_uuid, model, "runware videoInference request");
    let result = run_task(
        "videoInference",
        json!({
            "taskType": "videoInference",
            "taskUUID": task_uuid,
            "positivePrompt": options.prompt,
            "width": 512,
            "height": 512,
            "duration": options.duration_seconds,
            "fps": options.fps,
            "model": model,
        }),
        api_key,
    )
    .await?;
    result
        .video_url
        .ok_or_else(|| anyhow!("runware returned no video url"))
}

/// Plain text inference, used for code generation.
pub async fn text_inference(options: TextInferenceOptions, api_key: &str) -> Result<String> {
    let task_uuid = uuid::Uuid::new_v4().to_string();

    debug!(task_uuid, "runware textInference request");
    let result = run_task(
        "textInference",
        json!({
            "taskType": "textInference",
            "taskUUID": task_uuid,
            "prompt": options.prompt,
            "maxTokens": options.max_tokens,
            "temperature": options.temperature,
        }),
        api_key,
    )
    .await?;
    result
        .text
        .map(|text| text.trim().to_string())
        .ok_or_else(|| anyhow!("runware returned no generated text"))
}
