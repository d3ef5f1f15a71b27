pub mod hash;
pub mod history;
pub mod storage;

pub use hash::compute_hash;
pub use history::{GenerationRecord, list_generation_records, save_generation_record};
pub use storage::LocalFileStorage;

use serde::{Deserialize, Serialize};

/// Sidecar metadata for a cached processed result, written next to the
/// output as `meta.json` so an identical request can be answered without
/// recomputing.
#[derive(Serialize, Deserialize)]
pub struct ProcessedResultMetadata {
    pub cache_key_input: String,
    pub cached_key: String,
    pub cached_url: String,
    pub mime_type: String,
    pub created_at: String,
}

pub fn get_extension_from_mime_type(mime_type: &str) -> &str {
    match mime_type.to_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/bmp" => "bmp",
        "application/pdf" => "pdf",
        "text/plain" => "txt",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/flac" => "flac",
        "audio/mpeg" => "mp3",
        _ => "bin",
    }
}
