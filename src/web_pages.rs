use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::account::AccountStore;
use crate::cache::{LocalFileStorage, get_extension_from_mime_type, hash::compute_bytes_hash};

const UPLOAD_HTML: &str = include_str!("../templates/upload.html");

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct UploadResponse {
    url: String,
    key: String,
}

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn extension_from_filename(file_name: &str) -> Option<String> {
    if let Some((_, ext)) = file_name.rsplit_once('.') {
        let trimmed = ext.trim();
        if !trimmed.is_empty() && trimmed != file_name {
            return Some(trimmed.to_lowercase());
        }
    }
    None
}

fn resolve_extension(file_name: &str, content_type: Option<&str>) -> String {
    if let Some(ext) = extension_from_filename(file_name) {
        return ext;
    }
    if let Some(content_type) = content_type {
        let ext = get_extension_from_mime_type(content_type);
        if ext != "bin" {
            return ext.to_string();
        }
    }
    "bin".to_string()
}

pub async fn upload_page() -> Html<&'static str> {
    Html(UPLOAD_HTML)
}

/// Accepts one multipart `file` field (image or PDF) and stores it so the
/// tools can address it by URL.
pub async fn handle_file_upload(
    State(storage): State<Arc<LocalFileStorage>>,
    mut multipart: Multipart,
) -> Response {
    let mut file_name = None;
    let mut content_type = None;
    let mut bytes = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() == Some("file") {
                    content_type = field.content_type().map(|value| value.to_string());
                    file_name = Some(field.file_name().unwrap_or("").to_string());
                    match field.bytes().await {
                        Ok(data) => bytes = Some(data),
                        Err(err) => {
                            return json_error(
                                StatusCode::BAD_REQUEST,
                                &format!("reading upload failed: {err}"),
                            );
                        }
                    }
                    break;
                }
            }
            Ok(None) => break,
            Err(err) => {
                return json_error(
                    StatusCode::BAD_REQUEST,
                    &format!("reading form failed: {err}"),
                );
            }
        }
    }

    if let Some(content_type) = content_type.as_deref() {
        if !content_type.starts_with("image/") && content_type != "application/pdf" {
            return json_error(StatusCode::BAD_REQUEST, "unsupported file type");
        }
    }
    let file_name = match file_name {
        Some(value) => value,
        None => return json_error(StatusCode::BAD_REQUEST, "no file in upload"),
    };
    let bytes = match bytes {
        Some(data) => data,
        None => return json_error(StatusCode::BAD_REQUEST, "no file in upload"),
    };
    if bytes.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "uploaded file is empty");
    }

    // content-addressed, so re-uploading the same file yields the same URL
    let ext = resolve_extension(&file_name, content_type.as_deref());
    let hash = compute_bytes_hash(bytes.as_ref());
    let key = format!("uploads/{hash}.{ext}");
    if let Err(err) = storage.put(&key, bytes.as_ref()).await {
        return json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("saving upload failed: {err}"),
        );
    }

    let url = storage.get_public_url(&key);
    info!(key, size = bytes.len(), "file uploaded");
    (StatusCode::OK, Json(UploadResponse { url, key })).into_response()
}

pub async fn handle_sign_up(
    State(storage): State<Arc<LocalFileStorage>>,
    Json(request): Json<CredentialsRequest>,
) -> Response {
    let accounts = AccountStore::new(storage);
    match accounts.sign_up(&request.email, &request.password).await {
        Ok(session) => (StatusCode::CREATED, Json(session)).into_response(),
        Err(err) => json_error(StatusCode::BAD_REQUEST, &err.to_string()),
    }
}

pub async fn handle_sign_in(
    State(storage): State<Arc<LocalFileStorage>>,
    Json(request): Json<CredentialsRequest>,
) -> Response {
    let accounts = AccountStore::new(storage);
    match accounts.sign_in(&request.email, &request.password).await {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(err) => json_error(StatusCode::UNAUTHORIZED, &err.to_string()),
    }
}
