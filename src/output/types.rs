// src/output/types.rs
//! Type definitions for output operations.
//!
//! A plan is built from pure data first and executed by the writer,
//! so everything up to the actual I/O stays testable.

use super::paths::article_output_paths;
use crate::error::AppError;
use crate::model::{ArticleMetadata, ProcessedArticle, ProcessedMedia};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Represents a complete output plan.
#[derive(Debug, Clone, Default)]
pub struct OutputPlan {
    /// List of operations to perform
    pub operations: Vec<DeliveryTarget>,
}

impl OutputPlan {
    /// Creates a new empty output plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an operation to the plan.
    pub fn with_operation(mut self, operation: DeliveryTarget) -> Self {
        self.operations.push(operation);
        self
    }

    /// Document and metadata files for one processed article.
    pub fn for_article(
        self,
        article: &ProcessedArticle,
        output_dir: &Path,
    ) -> Result<Self, AppError> {
        let paths = article_output_paths(output_dir, article.metadata.document.id.as_str());
        let record = ArticleRecord {
            metadata: &article.metadata,
            processed_at: article.processed_at,
            processing_time_ms: article.processing_time_ms,
            media: &article.media,
        };
        let json = serde_json::to_string_pretty(&record)?;

        Ok(self
            .with_operation(DeliveryTarget::WriteFile {
                path: paths.document,
                content: article.document.clone(),
            })
            .with_operation(DeliveryTarget::WriteFile {
                path: paths.metadata,
                content: json,
            }))
    }
}

/// The JSON written next to each document.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ArticleRecord<'a> {
    #[serde(flatten)]
    metadata: &'a ArticleMetadata,
    processed_at: DateTime<Utc>,
    processing_time_ms: u64,
    media: &'a [ProcessedMedia],
}

/// Represents a single output operation.
#[derive(Debug, Clone)]
pub enum DeliveryTarget {
    /// Write content to a file, creating parent directories
    WriteFile { path: PathBuf, content: String },
}

impl DeliveryTarget {
    pub fn path(&self) -> &Path {
        match self {
            DeliveryTarget::WriteFile { path, .. } => path,
        }
    }
}

/// Result of executing an output plan.
#[derive(Debug, Clone, Default)]
pub struct OutputReport {
    /// Successfully completed operations
    pub completed: Vec<CompletedOperation>,
    /// Failed operations with errors
    pub failed: Vec<FailedOperation>,
    /// Execution statistics
    pub stats: ExecutionStats,
}

impl OutputReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a completed operation to the report.
    pub fn with_completed(mut self, operation: CompletedOperation) -> Self {
        self.stats.operations_completed += 1;
        self.stats.bytes_written += operation.bytes_written;
        self.completed.push(operation);
        self
    }

    /// Adds a failed operation to the report.
    pub fn with_failed(mut self, operation: FailedOperation) -> Self {
        self.stats.operations_failed += 1;
        self.failed.push(operation);
        self
    }

    /// Checks if all operations succeeded.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A successfully completed operation.
#[derive(Debug, Clone)]
pub struct CompletedOperation {
    pub operation: DeliveryTarget,
    pub bytes_written: usize,
}

/// A failed operation with error information.
#[derive(Debug, Clone)]
pub struct FailedOperation {
    pub operation: DeliveryTarget,
    pub error: String,
}

/// Execution statistics.
#[derive(Debug, Clone, Default)]
pub struct ExecutionStats {
    pub operations_completed: usize,
    pub operations_failed: usize,
    pub bytes_written: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentMetadata, MediaRef};
    use crate::types::DocumentId;
    use indexmap::IndexMap;

    #[test]
    fn article_plan_writes_document_and_metadata_record() {
        let metadata = DocumentMetadata::new(
            DocumentId::parse("doc1").unwrap(),
            Utc::now(),
            Utc::now(),
            IndexMap::new(),
        );
        let article = ProcessedArticle {
            metadata: metadata.into(),
            document: "# Hi".to_string(),
            media: vec![ProcessedMedia::from(MediaRef {
                original_url: "https://cdn.example/a.jpg".to_string(),
                local_path: PathBuf::from("images/a_0.jpg"),
                document_path: "/images/a_0.jpg".to_string(),
            })],
            processed_at: Utc::now(),
            processing_time_ms: 12,
        };

        let plan = OutputPlan::new()
            .for_article(&article, Path::new("out"))
            .unwrap();

        let [DeliveryTarget::WriteFile { path: doc, content }, DeliveryTarget::WriteFile { path: json, content: record }] =
            plan.operations.as_slice()
        else {
            panic!("unexpected plan: {:?}", plan.operations);
        };
        assert_eq!(doc, &PathBuf::from("out/doc1.md"));
        assert_eq!(content, "# Hi");
        assert_eq!(json, &PathBuf::from("out/doc1.json"));

        let record: serde_json::Value = serde_json::from_str(record).unwrap();
        assert_eq!(record["id"], "doc1");
        assert_eq!(record["title"], "Untitled");
        assert_eq!(record["processingTimeMs"], 12);
        assert_eq!(record["media"][0]["documentPath"], "/images/a_0.jpg");
        assert_eq!(record["media"][0]["format"], "jpg");
    }
}
