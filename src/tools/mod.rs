pub mod adjust_image;
pub mod apply_effect;
pub mod configure_api_key;
pub mod crop_square;
pub mod fetch;
pub mod generate_code;
pub mod generate_image;
pub mod generate_music;
pub mod generate_text;
pub mod generate_video;
pub mod images_to_pdf;
pub mod list_history;
pub mod merge_pdf;
pub mod remove_background;
pub mod results;
pub mod rotate_pdf;
pub mod split_pdf;
pub mod url_validation;

use std::sync::Arc;

use rmcp::ErrorData as McpError;
use serde::Serialize;

use crate::cache::LocalFileStorage;
use crate::keys::ApiKeyStore;

/// Shared state handed to every tool: the result storage and the per-user
/// API key store.
#[derive(Clone)]
pub struct ToolContext {
    pub storage: Arc<LocalFileStorage>,
    pub keys: ApiKeyStore,
}

impl ToolContext {
    pub fn new(storage: Arc<LocalFileStorage>) -> Self {
        let keys = ApiKeyStore::new(storage.clone());
        Self { storage, keys }
    }
}

#[derive(Serialize)]
pub struct ToolResponse {
    pub url: String,
    pub name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub text: String,
}

pub(crate) fn internal_error(context: &'static str, err: impl ToString) -> McpError {
    McpError::internal_error(context, Some(serde_json::Value::String(err.to_string())))
}

pub(crate) fn invalid_params(context: &'static str, err: impl ToString) -> McpError {
    McpError::invalid_params(context, Some(serde_json::Value::String(err.to_string())))
}

pub(crate) fn serialize_response(response: &ToolResponse) -> Result<String, McpError> {
    serde_json::to_string(response).map_err(|err| internal_error("serialize tool response failed", err))
}

pub use adjust_image::{AdjustImageRequest, adjust_image};
pub use apply_effect::{ApplyEffectRequest, apply_effect};
pub use configure_api_key::{ConfigureApiKeyRequest, configure_api_key};
pub use crop_square::{CropSquareRequest, crop_square};
pub use generate_code::{GenerateCodeRequest, generate_code};
pub use generate_image::{GenerateImageRequest, generate_image};
pub use generate_music::{GenerateMusicRequest, generate_music};
pub use generate_text::{GenerateTextRequest, generate_text};
pub use generate_video::{GenerateVideoRequest, generate_video};
pub use images_to_pdf::{ImagesToPdfRequest, images_to_pdf};
pub use list_history::{ListHistoryRequest, list_history};
pub use merge_pdf::{MergePdfRequest, merge_pdf};
pub use remove_background::{RemoveBackgroundRequest, remove_background};
pub use rotate_pdf::{RotatePdfRequest, rotate_pdf};
pub use split_pdf::{SplitPdfRequest, split_pdf};
pub use url_validation::validate_http_url;
