// src/lib.rs
//! notion2article library: turns Notion pages into Markdown articles with
//! locally stored media.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `ErrorCode`, `ValidationError`
//! - **Configuration**: `ProcessorSettings`, `ProcessorConfig`
//! - **Retrieval**: `ContentStore`, `NotionHttpClient`, `BlockFetcher`
//! - **Conversion**: `DocumentConverter`, `TransformRegistry`, `MediaLocalizer`
//! - **Orchestration**: `ArticleProcessor`, `process_many`, retry policies
//! - **Output**: `OutputPlan`, `deliver`

pub mod api;
pub mod batch;
pub mod config;
pub mod constants;
pub mod error;
pub mod error_recovery;
pub mod formatting;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod types;

// --- Error Handling ---
pub use crate::error::{AppError, ErrorCode, NotionErrorCode};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{
    check_environment, check_environment_with, CommandLineInput, EnvironmentReport,
    ProcessorConfig, ProcessorSettings,
};

// --- Domain Model ---
pub use crate::model::{
    ArticleMetadata, Block, BlockTree, Children, ConversionResult, DocumentMetadata, MediaRef,
    ProcessedArticle, ProcessedMedia, PropertyValue,
};

// --- Domain Types ---
pub use crate::types::{ApiKey, Annotations, BlockId, DocumentId, RichTextItem};

// --- Retrieval ---
pub use crate::api::{
    BlockFetcher, ContentStore, FetchedArticle, NotionHttpClient, PageRecord, PaginatedResponse,
    RawBlock,
};

// --- Conversion ---
pub use crate::formatting::{
    transform, BlockTransform, CustomTransforms, DocumentConverter, TransformContext,
    TransformRegistry,
};
pub use crate::output::{MediaLocalizer, MediaResponse, MediaTransport};

// --- Retry ---
pub use crate::error_recovery::{
    classify, retry_with_backoff, retry_with_decision, Backoff, ErrorKind, RetryDecision,
    RetryPolicy,
};

// --- Orchestration ---
pub use crate::batch::{process_many, BatchOptions, BatchResult, FailedArticle};
pub use crate::pipeline::{
    process_article_with_retry, process_many_with_retry, ArticlePipeline, ArticleProcessor,
    RetryingPipeline, ARTICLE_RETRY_POLICY, BATCH_RETRY_POLICY,
};

// --- Output ---
pub use crate::output::{deliver, DeliveryTarget, OutputPlan, OutputReport};
