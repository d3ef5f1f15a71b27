//! Content-addressed result cache shared by the processing tools: outputs
//! live under `results/<hash>/output.<ext>` with a `meta.json` sidecar, so
//! an identical request is answered from storage.

use base64::Engine;
use chrono::Utc;
use rmcp::{ErrorData as McpError, model::Content};
use tracing::warn;

use crate::cache::{
    LocalFileStorage, ProcessedResultMetadata, compute_hash, get_extension_from_mime_type,
};
use crate::tools::{ToolResponse, internal_error, serialize_response};

/// Returns the stored (url, mime type) for this cache key, if present.
pub async fn lookup_cached(
    storage: &LocalFileStorage,
    cache_key_input: &str,
) -> Option<(String, String)> {
    let hash = compute_hash(cache_key_input);
    let prefix = LocalFileStorage::get_result_prefix(&hash);
    let meta_key = LocalFileStorage::get_meta_key(&prefix);
    let meta_bytes = storage.get(&meta_key).await.ok().flatten()?;
    let metadata = serde_json::from_slice::<ProcessedResultMetadata>(&meta_bytes).ok()?;
    Some((metadata.cached_url, metadata.mime_type))
}

/// Writes the output and its metadata sidecar, returning the public URL.
pub async fn store_result(
    storage: &LocalFileStorage,
    cache_key_input: &str,
    bytes: &[u8],
    mime_type: &str,
) -> Result<String, McpError> {
    let hash = compute_hash(cache_key_input);
    let prefix = LocalFileStorage::get_result_prefix(&hash);
    let ext = get_extension_from_mime_type(mime_type);
    let output_key = LocalFileStorage::get_output_key(&prefix, ext);
    storage
        .put(&output_key, bytes)
        .await
        .map_err(|err| internal_error("save result failed", err))?;
    let cached_url = storage.get_public_url(&output_key);

    let metadata = ProcessedResultMetadata {
        cache_key_input: cache_key_input.to_string(),
        cached_key: output_key,
        cached_url: cached_url.clone(),
        mime_type: mime_type.to_string(),
        created_at: Utc::now().to_rfc3339(),
    };
    let meta_json = serde_json::to_vec(&metadata)
        .map_err(|err| internal_error("serialize cache metadata failed", err))?;
    let meta_key = LocalFileStorage::get_meta_key(&prefix);
    storage
        .put(&meta_key, &meta_json)
        .await
        .map_err(|err| internal_error("save cache metadata failed", err))?;
    Ok(cached_url)
}

/// Stores a one-off output without the metadata sidecar. Generation results
/// are keyed by values that never repeat, so a cache lookup could never hit
/// and the sidecar would be dead weight.
pub async fn store_unique_result(
    storage: &LocalFileStorage,
    key_input: &str,
    bytes: &[u8],
    mime_type: &str,
) -> Result<String, McpError> {
    let hash = compute_hash(key_input);
    let prefix = LocalFileStorage::get_result_prefix(&hash);
    let ext = get_extension_from_mime_type(mime_type);
    let output_key = LocalFileStorage::get_output_key(&prefix, ext);
    storage
        .put(&output_key, bytes)
        .await
        .map_err(|err| internal_error("save result failed", err))?;
    Ok(storage.get_public_url(&output_key))
}

/// An image result, either stored behind a URL or, when the cache write
/// failed, carried inline as base64 so the call still succeeds.
pub enum ImageResult {
    Stored(String),
    Inline(String),
}

pub async fn store_image_result(
    storage: &LocalFileStorage,
    cache_key_input: &str,
    bytes: &[u8],
    mime_type: &str,
) -> ImageResult {
    let hash = compute_hash(cache_key_input);
    let prefix = LocalFileStorage::get_result_prefix(&hash);
    let ext = get_extension_from_mime_type(mime_type);
    let output_key = LocalFileStorage::get_output_key(&prefix, ext);
    if let Err(err) = storage.put(&output_key, bytes).await {
        warn!(error = %err, "cache write failed, returning inline image");
        return ImageResult::Inline(base64::engine::general_purpose::STANDARD.encode(bytes));
    }
    let cached_url = storage.get_public_url(&output_key);

    let metadata = ProcessedResultMetadata {
        cache_key_input: cache_key_input.to_string(),
        cached_key: output_key,
        cached_url: cached_url.clone(),
        mime_type: mime_type.to_string(),
        created_at: Utc::now().to_rfc3339(),
    };
    let meta_write = match serde_json::to_vec(&metadata) {
        Ok(meta_json) => {
            let meta_key = LocalFileStorage::get_meta_key(&prefix);
            storage.put(&meta_key, &meta_json).await
        }
        Err(err) => Err(err.into()),
    };
    if let Err(err) = meta_write {
        // the output itself is in place, only the cache lookup is lost
        warn!(error = %err, "cache metadata write failed");
    }
    ImageResult::Stored(cached_url)
}

/// Contents for an image tool reply: the JSON summary, preceded by the
/// inline image when no URL exists.
pub fn image_contents(
    result: ImageResult,
    name: &str,
    text: &str,
) -> Result<Vec<Content>, McpError> {
    Ok(match result {
        ImageResult::Stored(url) => {
            let response = ToolResponse {
                url,
                name: name.to_string(),
                mime_type: "image/png".to_string(),
                text: text.to_string(),
            };
            vec![Content::text(serialize_response(&response)?)]
        }
        ImageResult::Inline(base64_image) => {
            let response = ToolResponse {
                url: String::new(),
                name: name.to_string(),
                mime_type: "image/png".to_string(),
                text: text.to_string(),
            };
            vec![
                Content::image(base64_image, "image/png"),
                Content::text(serialize_response(&response)?),
            ]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(name: &str) -> LocalFileStorage {
        let dir = std::env::temp_dir().join(format!(
            "ai_studio_results_{name}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        LocalFileStorage::new(dir, "http://localhost:3000/cache".to_string())
    }

    #[tokio::test]
    async fn unique_result_writes_no_metadata_sidecar() {
        let storage = storage("unique");
        let key_input = "text:alice:hello:1234";
        let url = store_unique_result(&storage, key_input, b"generated text", "text/plain")
            .await
            .unwrap();
        assert!(url.ends_with("/output.txt"));

        let prefix = LocalFileStorage::get_result_prefix(&compute_hash(key_input));
        let output_key = LocalFileStorage::get_output_key(&prefix, "txt");
        let meta_key = LocalFileStorage::get_meta_key(&prefix);
        assert!(storage.exists(&output_key).await.unwrap());
        assert!(!storage.exists(&meta_key).await.unwrap());
    }

    #[tokio::test]
    async fn cached_result_round_trips_through_metadata() {
        let storage = storage("cached");
        let url = store_result(&storage, "effect:x:invert", b"png-bytes", "image/png")
            .await
            .unwrap();
        let (cached_url, mime_type) = lookup_cached(&storage, "effect:x:invert").await.unwrap();
        assert_eq!(cached_url, url);
        assert_eq!(mime_type, "image/png");
        assert!(lookup_cached(&storage, "effect:y:invert").await.is_none());
    }
}
