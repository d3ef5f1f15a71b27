use std::sync::Arc;

use ai_studio_rmcp::account::AccountStore;
use ai_studio_rmcp::cache::LocalFileStorage;

fn accounts(name: &str) -> AccountStore {
    let dir = std::env::temp_dir().join(format!(
        "ai_studio_accounts_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    AccountStore::new(Arc::new(LocalFileStorage::new(
        dir,
        "http://localhost:3000/cache".to_string(),
    )))
}

#[tokio::test]
async fn sign_up_then_sign_in_round_trip() {
    let accounts = accounts("round_trip");
    let created = accounts.sign_up("user@example.com", "hunter22").await.unwrap();
    assert_eq!(created.email, "user@example.com");
    assert!(!created.uid.is_empty());

    let session = accounts.sign_in("user@example.com", "hunter22").await.unwrap();
    assert_eq!(session, created);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let accounts = accounts("duplicate");
    accounts.sign_up("user@example.com", "hunter22").await.unwrap();
    let err = accounts
        .sign_up("User@Example.COM", "another-pass")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("already exists"));
}

#[tokio::test]
async fn wrong_password_and_unknown_email_fail_alike() {
    let accounts = accounts("wrong_password");
    accounts.sign_up("user@example.com", "hunter22").await.unwrap();

    let wrong = accounts
        .sign_in("user@example.com", "not-the-password")
        .await
        .unwrap_err();
    let unknown = accounts
        .sign_in("other@example.com", "hunter22")
        .await
        .unwrap_err();
    assert_eq!(wrong.to_string(), unknown.to_string());
}

#[tokio::test]
async fn short_password_never_reaches_storage() {
    let accounts = accounts("short_password");
    let err = accounts.sign_up("user@example.com", "12345").await.unwrap_err();
    assert!(err.to_string().contains("at least 6 characters"));
    // the email stays free for a valid retry
    assert!(accounts.sign_up("user@example.com", "123456").await.is_ok());
}
