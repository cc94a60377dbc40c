// src/model/article.rs
//! Conversion results and the processed article record.

use super::DocumentMetadata;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;

/// A media file materialized locally while converting a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    pub original_url: String,
    pub local_path: PathBuf,
    pub document_path: String,
}

/// Output of converting one block tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversionResult {
    pub document: String,
    pub media: Vec<MediaRef>,
}

/// Document metadata plus the attributes derived from its properties.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleMetadata {
    #[serde(flatten)]
    pub document: DocumentMetadata,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl From<DocumentMetadata> for ArticleMetadata {
    fn from(document: DocumentMetadata) -> Self {
        Self {
            tags: document.tags(),
            author: document.author(),
            status: document.status(),
            document,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedMedia {
    #[serde(flatten)]
    pub media: MediaRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl From<MediaRef> for ProcessedMedia {
    fn from(media: MediaRef) -> Self {
        Self {
            format: media_format(&media.original_url),
            media,
        }
    }
}

/// One fully processed article.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedArticle {
    pub metadata: ArticleMetadata,
    pub document: String,
    pub media: Vec<ProcessedMedia>,
    pub processed_at: DateTime<Utc>,
    pub processing_time_ms: u64,
}

static FORMAT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.([a-zA-Z0-9]+)(?:\?|$)").unwrap_or_else(|e| panic!("invalid regex: {}", e))
});

/// Lower-cased extension at the end of a URL path (before any query).
pub fn media_format(url: &str) -> Option<String> {
    FORMAT_PATTERN
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|ext| ext.as_str().to_lowercase())
}
