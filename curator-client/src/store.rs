//! The backing store interface and its HTTP implementation.
//!
//! The engine never talks to the network directly; everything goes
//! through `EntityStore`, which keeps the whole client testable against
//! a stub server.

use crate::error::{Result, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use curator_core::entity::{EntityField, WebEntity};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// A single persisted change to one entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Mutation {
    pub entity_id: String,
    #[serde(flatten)]
    pub op: MutationOp,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MutationOp {
    SetField { field: EntityField, value: String },
    AddTag { category: String, value: String },
    RemoveTag { category: String, value: String },
    AddPrefix { lru: String },
    RemovePrefix { lru: String },
}

impl Mutation {
    pub fn set_field(entity_id: impl Into<String>, field: EntityField, value: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            op: MutationOp::SetField {
                field,
                value: value.into(),
            },
        }
    }

    pub fn add_tag(
        entity_id: impl Into<String>,
        category: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            op: MutationOp::AddTag {
                category: category.into(),
                value: value.into(),
            },
        }
    }

    pub fn remove_tag(
        entity_id: impl Into<String>,
        category: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            op: MutationOp::RemoveTag {
                category: category.into(),
                value: value.into(),
            },
        }
    }

    pub fn add_prefix(entity_id: impl Into<String>, lru: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            op: MutationOp::AddPrefix { lru: lru.into() },
        }
    }

    pub fn remove_prefix(entity_id: impl Into<String>, lru: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            op: MutationOp::RemovePrefix { lru: lru.into() },
        }
    }
}

/// The store's verdict on a submitted mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum MutationOutcome {
    Accepted {
        /// The store may rewrite the value (e.g. a normalized prefix).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        normalized_value: Option<String>,
        /// Recomputed server-side on every accepted mutation.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        last_modified: Option<DateTime<Utc>>,
    },
    Rejected {
        reason: String,
        #[serde(default)]
        retryable: bool,
    },
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Fetch one entity record, including prefixes, tags by category,
    /// children ids and crawl metadata.
    async fn load(&self, id: &str) -> Result<WebEntity>;

    /// Persist one mutation.
    async fn submit(&self, mutation: &Mutation) -> Result<MutationOutcome>;

    /// The externally-owned set of status values. Editors validate
    /// against this, never a closed local enum.
    async fn status_vocabulary(&self) -> Result<Vec<String>>;
}

/// `EntityStore` over plain HTTP+JSON:
/// `GET  {base}/webentities/{id}`
/// `PATCH {base}/webentities/{id}`
/// `GET  {base}/status-vocabulary`
pub struct HttpStore {
    client: Client,
    base: Url,
}

impl HttpStore {
    pub fn new(base: Url) -> Self {
        Self::with_timeout(base, 10)
    }

    pub fn with_timeout(base: Url, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .user_agent("Curator/0.2 (https://github.com/trapdoorsec/curator)")
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .connect_timeout(std::time::Duration::from_secs(timeout_secs / 2))
            .build()
            .expect("Failed to create HTTP client");
        Self { client, base }
    }

    fn entity_url(&self, id: &str) -> Result<Url> {
        self.base
            .join(&format!("webentities/{}", id))
            .map_err(|e| StoreError::InvalidUrl(e.to_string()))
    }
}

#[async_trait]
impl EntityStore for HttpStore {
    async fn load(&self, id: &str) -> Result<WebEntity> {
        let url = self.entity_url(id)?;
        debug!(%url, "loading entity");
        let response = self.client.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let response = response.error_for_status()?;
        let entity: WebEntity = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(entity)
    }

    async fn submit(&self, mutation: &Mutation) -> Result<MutationOutcome> {
        let url = self.entity_url(&mutation.entity_id)?;
        debug!(%url, op = ?mutation.op, "submitting mutation");
        let response = self
            .client
            .patch(url)
            .json(mutation)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(mutation.entity_id.clone()));
        }
        let response = response.error_for_status()?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn status_vocabulary(&self) -> Result<Vec<String>> {
        let url = self
            .base
            .join("status-vocabulary")
            .map_err(|e| StoreError::InvalidUrl(e.to_string()))?;
        let response = self.client.get(url).send().await?.error_for_status()?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}
