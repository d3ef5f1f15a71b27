use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};

use crate::tools::{
    AdjustImageRequest, ApplyEffectRequest, ConfigureApiKeyRequest, CropSquareRequest,
    GenerateCodeRequest, GenerateImageRequest, GenerateMusicRequest, GenerateTextRequest,
    GenerateVideoRequest, ImagesToPdfRequest, ListHistoryRequest, MergePdfRequest,
    RemoveBackgroundRequest, RotatePdfRequest, SplitPdfRequest, ToolContext,
};

#[derive(Clone)]
pub struct StudioServer {
    tool_router: ToolRouter<Self>,
    context: ToolContext,
}

impl StudioServer {
    pub fn new(storage: Arc<crate::cache::LocalFileStorage>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            context: ToolContext::new(storage),
        }
    }
}

#[tool_router]
impl StudioServer {
    #[tool(
        description = "Generate an image from a text prompt (Runware). The result is recorded in the user's generation history. Display the result with ![](url)."
    )]
    async fn generate_image(
        &self,
        Parameters(request): Parameters<GenerateImageRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::generate_image(&self.context, Parameters(request)).await
    }

    #[tool(
        description = "Generate text from a prompt (Hugging Face hosted inference). The result is recorded in the user's generation history."
    )]
    async fn generate_text(
        &self,
        Parameters(request): Parameters<GenerateTextRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::generate_text(&self.context, Parameters(request)).await
    }

    #[tool(
        description = "Generate a short 512x512 video clip from a text prompt (Runware). The result is recorded in the user's generation history."
    )]
    async fn generate_video(
        &self,
        Parameters(request): Parameters<GenerateVideoRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::generate_video(&self.context, Parameters(request)).await
    }

    #[tool(
        description = "Generate source code from a description (Runware text inference). Markdown fences are stripped; the code is stored and recorded in the user's generation history."
    )]
    async fn generate_code(
        &self,
        Parameters(request): Parameters<GenerateCodeRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::generate_code(&self.context, Parameters(request)).await
    }

    #[tool(
        description = "Generate a short music clip from a description (Hugging Face musicgen). The result is recorded in the user's generation history."
    )]
    async fn generate_music(
        &self,
        Parameters(request): Parameters<GenerateMusicRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::generate_music(&self.context, Parameters(request)).await
    }

    #[tool(
        description = "Apply continuous adjustments to an image: brightness, contrast and saturation (0-200%), blur (0-10px), rotation (-360..360 degrees) and flips, in one pass over the original. Display the result with ![](url)."
    )]
    async fn adjust_image(
        &self,
        Parameters(request): Parameters<AdjustImageRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::adjust_image(&self.context, Parameters(request)).await
    }

    #[tool(
        description = "Apply a one-shot effect to an image: grayscale, sepia, invert, vintage or sharpen. Effects compound: pass a previous result URL to stack them, or the original URL to start over."
    )]
    async fn apply_effect(
        &self,
        Parameters(request): Parameters<ApplyEffectRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::apply_effect(&self.context, Parameters(request)).await
    }

    #[tool(description = "Crop an image to the centered square of side min(width, height).")]
    async fn crop_square(
        &self,
        Parameters(request): Parameters<CropSquareRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::crop_square(&self.context, Parameters(request)).await
    }

    #[tool(
        description = "Remove an image background, either with the local luminance threshold (fast, naive, offline) or via remove.bg (needs an API key)."
    )]
    async fn remove_background(
        &self,
        Parameters(request): Parameters<RemoveBackgroundRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::remove_background(&self.context, Parameters(request)).await
    }

    #[tool(
        description = "Split PDFs: keep only the given 1-based page range of each input. Failures are reported per file."
    )]
    async fn split_pdf(
        &self,
        Parameters(request): Parameters<SplitPdfRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::split_pdf(&self.context, Parameters(request)).await
    }

    #[tool(
        description = "Combine images into one PDF document, one letter-size page per image, in order."
    )]
    async fn images_to_pdf(
        &self,
        Parameters(request): Parameters<ImagesToPdfRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::images_to_pdf(&self.context, Parameters(request)).await
    }

    #[tool(description = "Merge two or more PDFs into one document, in order.")]
    async fn merge_pdf(
        &self,
        Parameters(request): Parameters<MergePdfRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::merge_pdf(&self.context, Parameters(request)).await
    }

    #[tool(
        description = "Rotate every page of each PDF by 90, 180 or 270 degrees. Failures are reported per file."
    )]
    async fn rotate_pdf(
        &self,
        Parameters(request): Parameters<RotatePdfRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::rotate_pdf(&self.context, Parameters(request)).await
    }

    #[tool(description = "List a user's past generations, most recent first.")]
    async fn list_history(
        &self,
        Parameters(request): Parameters<ListHistoryRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::list_history(&self.context, Parameters(request)).await
    }

    #[tool(
        description = "Store a provider API key (runware, huggingface or removebg) for a user. Stored keys are used when a tool call carries no key override."
    )]
    async fn configure_api_key(
        &self,
        Parameters(request): Parameters<ConfigureApiKeyRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::configure_api_key(&self.context, Parameters(request)).await
    }
}

#[tool_handler]
impl ServerHandler for StudioServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
