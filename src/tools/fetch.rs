//! Shared download scaffolding for tools that take their input by URL.

use rmcp::ErrorData as McpError;

use crate::image_processing;
use crate::tools::{internal_error, validate_http_url};

pub struct FetchedFile {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Downloads a validated http(s) URL. The mime type comes from magic bytes
/// when recognizable, falling back to the Content-Type header.
pub async fn fetch_url_bytes(raw_url: &str) -> Result<FetchedFile, McpError> {
    let url = validate_http_url(raw_url)?;
    let response = reqwest::get(url)
        .await
        .map_err(|err| internal_error("fetch file failed", err))?;
    let status = response.status();
    if !status.is_success() {
        return Err(internal_error("fetch file failed", format!("HTTP {status}")));
    }
    let headers = response.headers().clone();
    let bytes = response
        .bytes()
        .await
        .map_err(|err| internal_error("read file bytes failed", err))?;

    let mime_from_header = headers
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or(value).trim().to_string());
    let detected = image_processing::detect_mime_type(bytes.as_ref());
    let mime_type = resolve_mime_type(detected, mime_from_header)?;

    Ok(FetchedFile {
        bytes: bytes.to_vec(),
        mime_type,
    })
}

/// Magic bytes win over the Content-Type header; a file with neither is a
/// client-input problem, not a server fault.
fn resolve_mime_type(
    detected: Option<&'static str>,
    header: Option<String>,
) -> Result<String, McpError> {
    detected
        .map(str::to_string)
        .or(header)
        .ok_or_else(|| McpError::invalid_params("unsupported file type", None))
}

/// Like `fetch_url_bytes`, then decodes the image into raw RGBA.
pub async fn fetch_image_pixels(raw_url: &str) -> Result<(Vec<u8>, u32, u32), McpError> {
    let file = fetch_url_bytes(raw_url).await?;
    image_processing::decode_image(&file.bytes, &file.mime_type)
        .map_err(|err| internal_error("decode image failed", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::ErrorCode;

    #[test]
    fn unknown_file_type_is_a_client_error() {
        let err = resolve_mime_type(None, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }

    #[test]
    fn magic_bytes_win_over_header() {
        assert_eq!(
            resolve_mime_type(Some("image/png"), Some("text/html".to_string())).unwrap(),
            "image/png"
        );
        assert_eq!(
            resolve_mime_type(None, Some("image/webp".to_string())).unwrap(),
            "image/webp"
        );
    }
}
