// src/api/responses.rs
//! Wire shapes of the Notion API responses this crate reads.
//!
//! Only the fields the pipeline consumes are modelled; everything
//! type-specific on a block is kept as raw JSON for the transforms.

use crate::model::{Block, DocumentMetadata, PropertyValue};
use crate::types::{BlockId, DocumentId};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;

/// Generic paginated response wrapper
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct PaginatedResponse<T> {
    #[serde(default)]
    pub results: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// A page record as returned by `GET /pages/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PageRecord {
    pub object: String,
    pub id: DocumentId,
    pub created_time: DateTime<Utc>,
    pub last_edited_time: DateTime<Utc>,
    #[serde(default)]
    pub properties: Option<IndexMap<String, PropertyValue>>,
}

impl PageRecord {
    /// Whether the record is a page carrying properties.
    pub fn is_document(&self) -> bool {
        self.object == "page" && self.properties.is_some()
    }

    /// Converts into metadata; `None` for non-document records.
    pub fn into_metadata(self, id: DocumentId) -> Option<DocumentMetadata> {
        if !self.is_document() {
            return None;
        }
        let properties = self.properties?;
        Some(DocumentMetadata::new(
            id,
            self.created_time,
            self.last_edited_time,
            properties,
        ))
    }
}

/// A block as returned in a children listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBlock {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub has_children: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RawBlock {
    /// Moves the payload keyed by the block's type into a domain block.
    pub fn into_block(mut self) -> Block {
        let data = self
            .extra
            .remove(&self.block_type)
            .unwrap_or(serde_json::Value::Null);
        Block::new(self.id, self.block_type, self.has_children, data)
    }
}

/// Error body returned by the Notion API on non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct NotionApiError {
    pub status: u16,
    pub code: String,
    pub message: String,
}
