use std::sync::Arc;

use ai_studio_rmcp::cache::LocalFileStorage;
use ai_studio_rmcp::keys::{ApiKeyStore, Service};

fn store(name: &str) -> ApiKeyStore {
    let dir = std::env::temp_dir().join(format!(
        "ai_studio_keys_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    ApiKeyStore::new(Arc::new(LocalFileStorage::new(
        dir,
        "http://localhost:3000/cache".to_string(),
    )))
}

#[tokio::test]
async fn set_then_get_per_user_and_service() {
    let store = store("set_get");
    store.set("alice", Service::Runware, "rw-key").await.unwrap();
    store.set("alice", Service::Removebg, "rb-key").await.unwrap();
    store.set("bob", Service::Runware, "bob-key").await.unwrap();

    assert_eq!(
        store.get("alice", Service::Runware).await.unwrap().as_deref(),
        Some("rw-key")
    );
    assert_eq!(
        store.get("bob", Service::Runware).await.unwrap().as_deref(),
        Some("bob-key")
    );
    assert!(store.get("alice", Service::Huggingface).await.unwrap().is_none());
    assert!(store.has("alice", Service::Removebg).await.unwrap());
}

#[tokio::test]
async fn empty_key_is_rejected_and_keys_are_trimmed() {
    let store = store("trim");
    assert!(store.set("alice", Service::Runware, "   ").await.is_err());
    store.set("alice", Service::Runware, "  padded  ").await.unwrap();
    assert_eq!(
        store.get("alice", Service::Runware).await.unwrap().as_deref(),
        Some("padded")
    );
}

#[tokio::test]
async fn resolve_prefers_explicit_override() {
    let store = store("resolve");
    store.set("alice", Service::Runware, "stored").await.unwrap();

    let resolved = store
        .resolve("alice", Service::Runware, Some("override"))
        .await
        .unwrap();
    assert_eq!(resolved, "override");

    // a blank override falls back to the stored key
    let resolved = store
        .resolve("alice", Service::Runware, Some("  "))
        .await
        .unwrap();
    assert_eq!(resolved, "stored");

    let err = store
        .resolve("alice", Service::Huggingface, None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("huggingface"));
}

#[tokio::test]
async fn clear_removes_all_keys_for_user() {
    let store = store("clear");
    store.set("alice", Service::Runware, "k1").await.unwrap();
    store.set("alice", Service::Huggingface, "k2").await.unwrap();
    store.clear("alice").await.unwrap();
    assert!(!store.has("alice", Service::Runware).await.unwrap());
    assert!(!store.has("alice", Service::Huggingface).await.unwrap());
}
