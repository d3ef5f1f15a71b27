use chrono::Utc;
use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars::JsonSchema,
};
use serde::Deserialize;

use crate::cache::{GenerationRecord, save_generation_record};
use crate::keys::Service;
use crate::providers::runware::{self, TextInferenceOptions};
use crate::tools::results::store_unique_result;
use crate::tools::{
    ToolContext, ToolResponse, internal_error, invalid_params, serialize_response,
};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateCodeRequest {
    #[schemars(description = "User id; the generation is recorded in this user's history")]
    pub user_id: String,
    #[schemars(description = "What the code should do")]
    pub prompt: String,
    #[schemars(description = "Target language, default javascript")]
    pub language: Option<String>,
    #[schemars(description = "Framework to use, omitted or \"none\" for plain code")]
    pub framework: Option<String>,
    #[schemars(description = "Runware API key override; otherwise the stored key is used")]
    pub api_key: Option<String>,
}

fn build_prompt(language: &str, framework: Option<&str>, request: &str) -> String {
    let framework_clause = match framework {
        Some(name) if !name.is_empty() && name != "none" => format!(" using {name}"),
        _ => String::new(),
    };
    format!(
        "You are a professional {language} developer. Generate clean, well-documented \
         {language} code{framework_clause}. Include comments explaining key parts. Follow \
         best practices and modern conventions. Only return the code, no explanations.\n\n\
         User request: {request}\n\nCode:"
    )
}

/// Model output often wraps the code in a markdown fence; keep only the
/// fenced body when one is present.
fn strip_code_fences(text: &str) -> String {
    let Some(start) = text.find("```") else {
        return text.trim().to_string();
    };
    let after = &text[start + 3..];
    let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after[body_start..];
    let end = body.find("```").unwrap_or(body.len());
    body[..end].trim().to_string()
}

fn extension_for_language(language: &str) -> &'static str {
    match language {
        "javascript" => "js",
        "typescript" => "ts",
        "python" => "py",
        "html" => "html",
        "css" => "css",
        "json" => "json",
        "java" => "java",
        "cpp" => "cpp",
        "csharp" => "cs",
        _ => "txt",
    }
}

pub async fn generate_code(
    context: &ToolContext,
    Parameters(request): Parameters<GenerateCodeRequest>,
) -> Result<CallToolResult, McpError> {
    let prompt = request.prompt.trim().to_string();
    if prompt.is_empty() {
        return Err(McpError::invalid_params("prompt must not be empty", None));
    }
    let language = request
        .language
        .as_deref()
        .unwrap_or("javascript")
        .to_lowercase();

    let api_key = context
        .keys
        .resolve(&request.user_id, Service::Runware, request.api_key.as_deref())
        .await
        .map_err(|err| invalid_params("missing runware api key", err))?;

    let raw = runware::text_inference(
        TextInferenceOptions {
            prompt: build_prompt(&language, request.framework.as_deref(), &prompt),
            max_tokens: 1500,
            temperature: 0.3,
        },
        &api_key,
    )
    .await
    .map_err(|err| internal_error("generate code failed", err))?;
    let code = strip_code_fences(&raw);
    if code.is_empty() {
        return Err(internal_error("generate code failed", "no code generated"));
    }

    let key_input = format!(
        "code:{}:{}:{}",
        request.user_id,
        prompt,
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    );
    let url = store_unique_result(&context.storage, &key_input, code.as_bytes(), "text/plain")
        .await?;

    let record = GenerationRecord {
        user_id: request.user_id.clone(),
        prompt,
        result_url: url.clone(),
        created_at: Utc::now().to_rfc3339(),
        seed: None,
    };
    if let Err(err) = save_generation_record(&context.storage, &record).await {
        tracing::warn!(error = %err, "failed to record generation history");
    }

    let response = ToolResponse {
        url,
        name: format!("generated.{}", extension_for_language(&language)),
        mime_type: "text/plain".to_string(),
        text: code,
    };
    Ok(CallToolResult::success(vec![Content::text(
        serialize_response(&response)?,
    )]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_body_is_extracted() {
        let raw = "Here you go:\n```python\nprint(\"hi\")\n```\nEnjoy!";
        assert_eq!(strip_code_fences(raw), "print(\"hi\")");
    }

    #[test]
    fn unfenced_text_is_trimmed_through() {
        assert_eq!(strip_code_fences("  let x = 1;\n"), "let x = 1;");
    }

    #[test]
    fn unterminated_fence_keeps_the_rest() {
        assert_eq!(strip_code_fences("```js\nlet x = 1;"), "let x = 1;");
    }

    #[test]
    fn framework_appears_in_prompt_unless_none() {
        assert!(build_prompt("python", Some("django"), "a view").contains("using django"));
        assert!(!build_prompt("python", Some("none"), "a view").contains("using"));
        assert!(!build_prompt("python", None, "a view").contains("using"));
    }

    #[test]
    fn language_extensions() {
        assert_eq!(extension_for_language("typescript"), "ts");
        assert_eq!(extension_for_language("csharp"), "cs");
        assert_eq!(extension_for_language("fortran"), "txt");
    }
}
