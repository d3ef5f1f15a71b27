//! Per-user API keys for the generation providers, keyed by
//! (user id, service) and persisted as one JSON blob per user under the
//! shared storage. The store is passed to each tool explicitly; nothing
//! reads keys from ambient global state.

use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use rmcp::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::cache::LocalFileStorage;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    Runware,
    Huggingface,
    Removebg,
}

impl Service {
    pub fn name(&self) -> &'static str {
        match self {
            Service::Runware => "runware",
            Service::Huggingface => "huggingface",
            Service::Removebg => "removebg",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ApiKeyStore {
    storage: std::sync::Arc<LocalFileStorage>,
}

impl ApiKeyStore {
    pub fn new(storage: std::sync::Arc<LocalFileStorage>) -> Self {
        Self { storage }
    }

    fn key_file(user_id: &str) -> String {
        format!("keys/{user_id}.json")
    }

    async fn load(&self, user_id: &str) -> Result<BTreeMap<String, String>> {
        match self.storage.get(&Self::key_file(user_id)).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(BTreeMap::new()),
        }
    }

    pub async fn set(&self, user_id: &str, service: Service, key: &str) -> Result<()> {
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("api key must not be empty"));
        }
        let mut keys = self.load(user_id).await?;
        keys.insert(service.name().to_string(), trimmed.to_string());
        let payload = serde_json::to_vec_pretty(&keys)?;
        self.storage.put(&Self::key_file(user_id), &payload).await
    }

    pub async fn get(&self, user_id: &str, service: Service) -> Result<Option<String>> {
        Ok(self.load(user_id).await?.remove(service.name()))
    }

    pub async fn has(&self, user_id: &str, service: Service) -> Result<bool> {
        Ok(self.get(user_id, service).await?.is_some())
    }

    pub async fn clear(&self, user_id: &str) -> Result<()> {
        self.storage.put(&Self::key_file(user_id), b"{}").await
    }

    /// Resolves the key for a call: an explicit override wins, otherwise the
    /// stored key; missing both is a validation error naming the service.
    pub async fn resolve(
        &self,
        user_id: &str,
        service: Service,
        explicit: Option<&str>,
    ) -> Result<String> {
        if let Some(key) = explicit {
            let trimmed = key.trim();
            if !trimmed.is_empty() {
                return Ok(trimmed.to_string());
            }
        }
        self.get(user_id, service)
            .await?
            .ok_or_else(|| anyhow!("no {} api key stored for this user", service.name()))
    }
}
