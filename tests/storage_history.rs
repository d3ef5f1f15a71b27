use std::sync::Arc;

use ai_studio_rmcp::cache::{
    GenerationRecord, LocalFileStorage, list_generation_records, save_generation_record,
};

fn temp_dir(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "ai_studio_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn storage(name: &str) -> Arc<LocalFileStorage> {
    Arc::new(LocalFileStorage::new(
        temp_dir(name),
        "http://localhost:3000/cache".to_string(),
    ))
}

#[tokio::test]
async fn put_get_round_trip() {
    let storage = storage("put_get");
    storage.put("results/a/output.png", b"png-bytes").await.unwrap();
    assert!(storage.exists("results/a/output.png").await.unwrap());
    assert_eq!(
        storage.get("results/a/output.png").await.unwrap().unwrap(),
        b"png-bytes"
    );
    assert!(storage.get("results/missing").await.unwrap().is_none());
}

#[tokio::test]
async fn history_lists_newest_first_per_user() {
    let storage = storage("history_order");
    for (i, stamp) in [
        "2026-08-20T10:00:00Z",
        "2026-08-21T10:00:00Z",
        "2026-08-22T10:00:00Z",
    ]
    .iter()
    .enumerate()
    {
        let record = GenerationRecord {
            user_id: "alice".to_string(),
            prompt: format!("prompt {i}"),
            result_url: format!("http://example.com/{i}.webp"),
            created_at: stamp.to_string(),
            seed: Some(i as i64),
        };
        save_generation_record(&storage, &record).await.unwrap();
    }
    // a record for another user must not leak into alice's history
    let other = GenerationRecord {
        user_id: "bob".to_string(),
        prompt: "bob's prompt".to_string(),
        result_url: "http://example.com/bob.webp".to_string(),
        created_at: "2026-08-23T10:00:00Z".to_string(),
        seed: None,
    };
    save_generation_record(&storage, &other).await.unwrap();

    let records = list_generation_records(&storage, "alice", 10).await.unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].prompt, "prompt 2");
    assert_eq!(records[2].prompt, "prompt 0");
    assert!(records.iter().all(|record| record.user_id == "alice"));
}

#[tokio::test]
async fn history_limit_is_honored() {
    let storage = storage("history_limit");
    for i in 0..5 {
        let record = GenerationRecord {
            user_id: "carol".to_string(),
            prompt: format!("p{i}"),
            result_url: format!("http://example.com/{i}"),
            created_at: format!("2026-08-2{i}T00:00:00Z"),
            seed: None,
        };
        save_generation_record(&storage, &record).await.unwrap();
    }
    let records = list_generation_records(&storage, "carol", 2).await.unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn history_of_unknown_user_is_empty() {
    let storage = storage("history_empty");
    let records = list_generation_records(&storage, "nobody", 10).await.unwrap();
    assert!(records.is_empty());
}
