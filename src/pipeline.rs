// src/pipeline.rs
//! The article pipeline: fetch, then convert, then enrich.
//!
//! [`ArticlePipeline`] is the seam the batch runner and the retry
//! wrappers compose over, so each can be exercised against fakes.

use crate::api::{BlockFetcher, ContentStore, NotionHttpClient};
use crate::batch::{self, BatchOptions, BatchResult};
use crate::config::ProcessorConfig;
use crate::constants::{
    ARTICLE_RETRY_ATTEMPTS, ARTICLE_RETRY_DELAY, BATCH_RETRY_ATTEMPTS, BATCH_RETRY_DELAY,
};
use crate::error::AppError;
use crate::error_recovery::{
    classify, retry_with_backoff, retry_with_decision, Backoff, RetryDecision, RetryPolicy,
};
use crate::formatting::{DocumentConverter, TransformRegistry};
use crate::model::{ProcessedArticle, ProcessedMedia};
use crate::output::{MediaLocalizer, MediaTransport};
use crate::types::DocumentId;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

/// Retry defaults for a single article run: classification-aware, exponential.
pub const ARTICLE_RETRY_POLICY: RetryPolicy = RetryPolicy {
    max_retries: ARTICLE_RETRY_ATTEMPTS,
    base_delay: ARTICLE_RETRY_DELAY,
    backoff: Backoff::Exponential,
};

/// Retry defaults for article runs inside a batch: linear.
pub const BATCH_RETRY_POLICY: RetryPolicy = RetryPolicy {
    max_retries: BATCH_RETRY_ATTEMPTS,
    base_delay: BATCH_RETRY_DELAY,
    backoff: Backoff::Linear,
};

/// Produces one processed article from its id.
#[async_trait::async_trait]
pub trait ArticlePipeline: Send + Sync {
    async fn process_article(&self, id: &DocumentId) -> Result<ProcessedArticle, AppError>;
}

#[derive(Clone)]
pub struct ArticleProcessor {
    fetcher: BlockFetcher,
    converter: DocumentConverter,
    media_per_article: bool,
}

impl ArticleProcessor {
    /// Wires the Notion HTTP client and a reqwest media transport.
    pub fn new(config: &ProcessorConfig) -> Result<Self, AppError> {
        let store = Arc::new(NotionHttpClient::new(&config.api_key)?);
        let transport = Arc::new(reqwest::Client::builder().build()?);
        Ok(Self::with_collaborators(config, store, transport))
    }

    pub fn with_collaborators(
        config: &ProcessorConfig,
        store: Arc<dyn ContentStore>,
        transport: Arc<dyn MediaTransport>,
    ) -> Self {
        let fetcher = BlockFetcher::new(store, config.fetch_policy());
        let media = MediaLocalizer::new(
            config.image_directory.clone(),
            config.image_url_prefix.clone(),
            transport,
        );
        let registry = TransformRegistry::with_overrides(&config.custom_transformers);
        let converter = DocumentConverter::new(fetcher.clone(), registry, media);
        Self {
            fetcher,
            converter,
            media_per_article: config.media_per_article,
        }
    }

    pub fn fetcher(&self) -> &BlockFetcher {
        &self.fetcher
    }

    pub fn converter(&self) -> &DocumentConverter {
        &self.converter
    }

    /// Whether `page_id` can be retrieved with the configured credential.
    pub async fn test_connection(&self, page_id: &DocumentId) -> bool {
        match self.fetcher.fetch_metadata(page_id).await {
            Ok(metadata) => {
                log::info!("Connection OK: retrieved '{}'", metadata.title);
                true
            }
            Err(e) => {
                log::error!("Connection test failed: {}", e);
                false
            }
        }
    }

    pub async fn process_many(
        &self,
        ids: &[DocumentId],
        options: &BatchOptions,
    ) -> Result<BatchResult, AppError> {
        batch::process_many(self, ids, options).await
    }

    pub async fn process_article_with_retry(
        &self,
        id: &DocumentId,
        policy: &RetryPolicy,
    ) -> Result<ProcessedArticle, AppError> {
        process_article_with_retry(self, id, policy).await
    }

    pub async fn process_many_with_retry(
        &self,
        ids: &[DocumentId],
        options: &BatchOptions,
        policy: &RetryPolicy,
    ) -> Result<BatchResult, AppError> {
        process_many_with_retry(self, ids, options, policy).await
    }
}

#[async_trait::async_trait]
impl ArticlePipeline for ArticleProcessor {
    async fn process_article(&self, id: &DocumentId) -> Result<ProcessedArticle, AppError> {
        let started = Instant::now();

        let outcome = async {
            let article = self.fetcher.fetch_article(id).await?;
            let converted = if self.media_per_article {
                self.converter
                    .convert_scoped(&article.blocks, id.as_str())
                    .await?
            } else {
                self.converter.convert(&article.blocks).await?
            };
            Ok::<_, AppError>((article.metadata, converted))
        }
        .await;

        let (metadata, converted) = outcome.map_err(|e| AppError::ProcessFailed {
            id: id.to_string(),
            source: Box::new(e),
        })?;

        let article = ProcessedArticle {
            metadata: metadata.into(),
            document: converted.document,
            media: converted
                .media
                .into_iter()
                .map(ProcessedMedia::from)
                .collect(),
            processed_at: Utc::now(),
            processing_time_ms: started.elapsed().as_millis() as u64,
        };
        log::debug!(
            "Converted {} with {} media file(s) in {}ms",
            id,
            article.media.len(),
            article.processing_time_ms
        );
        Ok(article)
    }
}

/// Retries one article run, but only for failures classified as transient.
///
/// Retryable failures wait their kind's cool-down on top of the policy's
/// backoff; anything else is returned as-is on first occurrence.
pub async fn process_article_with_retry<P>(
    pipeline: &P,
    id: &DocumentId,
    policy: &RetryPolicy,
) -> Result<ProcessedArticle, AppError>
where
    P: ArticlePipeline + ?Sized,
{
    retry_with_decision(
        &format!("Processing article {}", id),
        policy,
        || pipeline.process_article(id),
        |error| {
            let kind = classify(error);
            if kind.should_retry() {
                log::debug!("Article {} hit a {} failure", id, kind);
                RetryDecision::Retry {
                    extra_delay: kind.recovery_delay(),
                }
            } else {
                RetryDecision::Stop
            }
        },
        |_, _| {},
    )
    .await
}

/// A pipeline whose every run is retried under a fixed policy.
pub struct RetryingPipeline<'a, P: ?Sized> {
    inner: &'a P,
    policy: RetryPolicy,
}

impl<'a, P: ?Sized> RetryingPipeline<'a, P> {
    pub fn new(inner: &'a P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait::async_trait]
impl<P> ArticlePipeline for RetryingPipeline<'_, P>
where
    P: ArticlePipeline + ?Sized,
{
    async fn process_article(&self, id: &DocumentId) -> Result<ProcessedArticle, AppError> {
        retry_with_backoff(
            &format!("Processing article {}", id),
            &self.policy,
            || self.inner.process_article(id),
            |_, _| {},
        )
        .await
    }
}

/// [`batch::process_many`] with every article run retried under `policy`.
pub async fn process_many_with_retry<P>(
    pipeline: &P,
    ids: &[DocumentId],
    options: &BatchOptions,
    policy: &RetryPolicy,
) -> Result<BatchResult, AppError>
where
    P: ArticlePipeline + ?Sized,
{
    let retrying = RetryingPipeline::new(pipeline, *policy);
    batch::process_many(&retrying, ids, options).await
}
