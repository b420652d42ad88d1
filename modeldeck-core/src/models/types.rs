//! Core model type definitions.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sources::ModelSource;

/// Tag for models that support streamed responses.
pub const TAG_STREAM: &str = "stream";
/// Tag for chat-completion models.
pub const TAG_CHAT: &str = "chat";

/// Errors that can occur while storing model records.
#[derive(Debug, Error)]
pub enum ModelStoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Unknown source: {0}")]
    UnknownSource(String),
}

/// A model as returned by the vendor's listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorModelDescriptor {
    pub id: String,
    /// Creation time in unix seconds.
    #[serde(default)]
    pub created: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owned_by: Option<String>,
}

impl VendorModelDescriptor {
    /// Descriptor with just an id and creation time.
    pub fn new(id: impl Into<String>, created: i64) -> Self {
        Self {
            id: id.into(),
            created,
            object: None,
            owned_by: None,
        }
    }
}

/// A display-ready model record, owned by one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    /// "<source_id>-<vendor_id>", unique per (source, vendor model)
    pub id: String,
    pub label: String,
    /// Creation time in unix seconds, as reported by the vendor.
    pub created: i64,
    pub description: String,
    pub tags: BTreeSet<String>,
    /// Context window size in tokens
    pub context_tokens: u32,
    pub source_id: String,
    /// The owning source
    pub source: ModelSource,
    /// Per-model overrides; empty at creation
    #[serde(default)]
    pub settings: serde_json::Map<String, serde_json::Value>,
}

impl ModelRecord {
    /// Creation time as a timestamp, if the vendor reported a valid one.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created, 0)
    }

    /// Check for a tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::Vendor;

    fn record(source_id: &str, vendor_id: &str) -> ModelRecord {
        ModelRecord {
            id: format!("{source_id}-{vendor_id}"),
            label: "x".into(),
            created: 1_687_882_411,
            description: String::new(),
            tags: BTreeSet::new(),
            context_tokens: 4000,
            source_id: source_id.into(),
            source: ModelSource {
                id: source_id.into(),
                label: "OpenAI".into(),
                vendor: Vendor::OpenAi,
            },
            settings: Default::default(),
        }
    }

    #[test]
    fn test_created_at() {
        let created = record("openai", "gpt-4").created_at().unwrap();
        assert_eq!(created.timestamp(), 1_687_882_411);
    }

    #[test]
    fn test_descriptor_parses_wire_json() {
        let json = r#"{"id":"gpt-4","object":"model","created":1687882411,"owned_by":"openai"}"#;
        let descriptor: VendorModelDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.id, "gpt-4");
        assert_eq!(descriptor.created, 1_687_882_411);
        assert_eq!(descriptor.owned_by.as_deref(), Some("openai"));
    }
}
