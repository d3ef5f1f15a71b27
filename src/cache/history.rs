use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::cache::{LocalFileStorage, compute_hash};

const HISTORY_DIR: &str = "history";

/// One past generation. Created on success, never mutated, no delete path.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub user_id: String,
    pub prompt: String,
    pub result_url: String,
    pub created_at: String,
    pub seed: Option<i64>,
}

pub async fn save_generation_record(
    storage: &LocalFileStorage,
    record: &GenerationRecord,
) -> Result<()> {
    // colons are not filename-safe everywhere; the RFC3339 stamp still sorts
    let created_at = record.created_at.replace(':', "-");
    let hash_source = format!("{}:{}:{}", record.user_id, record.result_url, record.prompt);
    let hash = compute_hash(&hash_source);
    let file_key = format!("{HISTORY_DIR}/{}/{created_at}_{hash}.json", record.user_id);
    let payload = serde_json::to_vec_pretty(record)?;
    storage.put(&file_key, &payload).await?;
    Ok(())
}

/// Records for one user, most recent first, at most `limit` entries.
pub async fn list_generation_records(
    storage: &LocalFileStorage,
    user_id: &str,
    limit: usize,
) -> Result<Vec<GenerationRecord>> {
    let dir_path = storage.resolve_path(&format!("{HISTORY_DIR}/{user_id}"));
    let mut entries: Vec<PathBuf> = Vec::new();
    let mut dir = match fs::read_dir(&dir_path).await {
        Ok(dir) => dir,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };
    while let Some(entry) = dir.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            entries.push(path);
        }
    }
    entries.sort_by(|a, b| b.cmp(a));

    let mut records = Vec::new();
    for path in entries {
        if records.len() >= limit {
            break;
        }
        let bytes = fs::read(&path).await?;
        if let Ok(record) = serde_json::from_slice::<GenerationRecord>(&bytes) {
            if record.user_id == user_id {
                records.push(record);
            }
        }
    }
    Ok(records)
}
