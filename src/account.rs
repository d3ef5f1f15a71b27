//! Email+password accounts. Validation runs before any storage access;
//! sign-in hands back only the narrow `UserSession { uid, email }` value,
//! never a storage record.

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::cache::{LocalFileStorage, compute_hash};

const ACCOUNT_DIR: &str = "accounts";
const MIN_PASSWORD_LEN: usize = 6;

/// What the rest of the suite sees of an authenticated user.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSession {
    pub uid: String,
    pub email: String,
}

#[derive(Serialize, Deserialize)]
struct AccountRecord {
    uid: String,
    email: String,
    password_salt: String,
    password_digest: String,
    created_at: String,
}

pub fn validate_email(email: &str) -> Result<()> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("email is required"));
    }
    if trimmed.len() > 254 {
        return Err(anyhow!("email must be at most 254 characters long"));
    }
    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(anyhow!("invalid email format"));
    };
    let domain_ok = domain
        .rsplit_once('.')
        .is_some_and(|(host, tld)| !host.is_empty() && tld.len() >= 2)
        && !domain.contains(' ');
    if local.is_empty() || !domain_ok || trimmed.contains(' ') {
        return Err(anyhow!("invalid email format"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(anyhow!("password is required"));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(anyhow!("password must be at least 6 characters long"));
    }
    Ok(())
}

fn account_key(email: &str) -> String {
    format!(
        "{ACCOUNT_DIR}/{}.json",
        compute_hash(&email.trim().to_lowercase())
    )
}

fn digest_password(password: &str, salt: &str) -> String {
    compute_hash(&format!("{salt}:{password}"))
}

pub struct AccountStore {
    storage: std::sync::Arc<LocalFileStorage>,
}

impl AccountStore {
    pub fn new(storage: std::sync::Arc<LocalFileStorage>) -> Self {
        Self { storage }
    }

    /// Registers a new account. Validation failures are reported before the
    /// store is touched; an existing account with the same email is an error.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<UserSession> {
        validate_email(email)?;
        validate_password(password)?;

        let key = account_key(email);
        if self.storage.exists(&key).await? {
            return Err(anyhow!("an account with this email already exists"));
        }

        let uid = uuid::Uuid::new_v4().to_string();
        let salt = uuid::Uuid::new_v4().simple().to_string();
        let record = AccountRecord {
            uid: uid.clone(),
            email: email.trim().to_string(),
            password_digest: digest_password(password, &salt),
            password_salt: salt,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        self.storage
            .put(&key, &serde_json::to_vec_pretty(&record)?)
            .await?;
        Ok(UserSession {
            uid,
            email: record.email,
        })
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserSession> {
        validate_email(email)?;
        if password.is_empty() {
            return Err(anyhow!("password is required"));
        }

        let bytes = self
            .storage
            .get(&account_key(email))
            .await?
            .ok_or_else(|| anyhow!("invalid email or password"))?;
        let record: AccountRecord = serde_json::from_slice(&bytes)?;
        if digest_password(password, &record.password_salt) != record.password_digest {
            return Err(anyhow!("invalid email or password"));
        }
        Ok(UserSession {
            uid: record.uid,
            email: record.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_password_is_rejected_before_any_io() {
        // five characters, one short of the minimum
        let err = validate_password("12345").unwrap_err();
        assert!(err.to_string().contains("at least 6 characters"));
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn empty_password_is_rejected() {
        assert!(validate_password("").is_err());
    }

    #[test]
    fn email_shapes() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("user.name+tag@sub.example.org").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("user@nodot").is_err());
        assert!(validate_email("user@host.x").is_err());
        assert!(validate_email("user name@example.com").is_err());
    }

    #[test]
    fn account_key_is_case_insensitive_on_email() {
        assert_eq!(
            account_key("User@Example.com"),
            account_key("user@example.com")
        );
    }
}
