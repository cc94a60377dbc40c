// src/batch.rs
//! Runs many article pipelines in fixed-size waves.
//!
//! Ids are split into consecutive chunks of `concurrency`; every run in a
//! chunk executes concurrently and the next chunk starts only after the
//! whole chunk has settled. A slow article therefore holds back the next
//! wave; there is no pipelining across chunk boundaries.

use crate::constants::DEFAULT_BATCH_CONCURRENCY;
use crate::error::AppError;
use crate::model::ProcessedArticle;
use crate::pipeline::ArticlePipeline;
use crate::types::DocumentId;
use futures::future::join_all;
use parking_lot::Mutex;
use serde::ser::SerializeStruct;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

pub type ProgressHook = Arc<dyn Fn(usize, usize) + Send + Sync>;
pub type ErrorHook = Arc<dyn Fn(&AppError, &DocumentId) + Send + Sync>;

#[derive(Clone)]
pub struct BatchOptions {
    /// Articles per wave; must be at least 1.
    pub concurrency: usize,
    /// When false, the first failed wave ends the batch with that error.
    pub continue_on_error: bool,
    /// Called with `(completed, total)` after every article.
    pub on_progress: Option<ProgressHook>,
    /// Called for every failed article, before its progress report.
    pub on_error: Option<ErrorHook>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_BATCH_CONCURRENCY,
            continue_on_error: true,
            on_progress: None,
            on_error: None,
        }
    }
}

impl BatchOptions {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn fail_fast(mut self) -> Self {
        self.continue_on_error = false;
        self
    }

    pub fn on_progress(mut self, hook: impl Fn(usize, usize) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(hook));
        self
    }

    pub fn on_error(
        mut self,
        hook: impl Fn(&AppError, &DocumentId) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for BatchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchOptions")
            .field("concurrency", &self.concurrency)
            .field("continue_on_error", &self.continue_on_error)
            .field("on_progress", &self.on_progress.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// An article that could not be processed.
#[derive(Debug)]
pub struct FailedArticle {
    pub id: DocumentId,
    pub error: AppError,
}

impl Serialize for FailedArticle {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("FailedArticle", 3)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("code", self.error.code().as_str())?;
        state.serialize_field("message", &self.error.to_string())?;
        state.end()
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub successful: Vec<ProcessedArticle>,
    pub failed: Vec<FailedArticle>,
    pub total_processed: usize,
    pub total_time_ms: u64,
}

#[derive(Default)]
struct Progress {
    successful: Vec<ProcessedArticle>,
    failed: Vec<FailedArticle>,
    completed: usize,
}

/// Consecutive chunks of `size` (the last may be shorter), in order.
pub fn chunk<T>(items: &[T], size: usize) -> Vec<&[T]> {
    items.chunks(size.max(1)).collect()
}

/// Processes `ids` wave by wave through `pipeline`.
pub async fn process_many<P>(
    pipeline: &P,
    ids: &[DocumentId],
    options: &BatchOptions,
) -> Result<BatchResult, AppError>
where
    P: ArticlePipeline + ?Sized,
{
    if options.concurrency == 0 {
        return Err(AppError::InvalidConfig(
            "batch concurrency must be at least 1".to_string(),
        ));
    }

    let started = Instant::now();
    let total = ids.len();
    let progress = Mutex::new(Progress::default());

    for (wave, ids_in_wave) in chunk(ids, options.concurrency).into_iter().enumerate() {
        log::debug!("Wave {}: {} article(s)", wave + 1, ids_in_wave.len());
        let failed_before = progress.lock().failed.len();

        let runs = ids_in_wave.iter().map(|id| {
            let progress = &progress;
            async move {
                let outcome = pipeline.process_article(id).await;
                record(progress, id, outcome, options, total);
            }
        });
        join_all(runs).await;

        log::debug!("Wave {} finished", wave + 1);

        if !options.continue_on_error {
            let mut state = progress.lock();
            if state.failed.len() > failed_before {
                let first = state.failed.remove(failed_before);
                log::warn!("Stopping batch after failure of {}", first.id);
                return Err(first.error);
            }
        }
    }

    let state = progress.into_inner();
    let result = BatchResult {
        successful: state.successful,
        failed: state.failed,
        total_processed: total,
        total_time_ms: started.elapsed().as_millis() as u64,
    };
    log::info!(
        "Batch complete: {} succeeded, {} failed in {}ms",
        result.successful.len(),
        result.failed.len(),
        result.total_time_ms
    );
    Ok(result)
}

fn record(
    progress: &Mutex<Progress>,
    id: &DocumentId,
    outcome: Result<ProcessedArticle, AppError>,
    options: &BatchOptions,
    total: usize,
) {
    let completed = match outcome {
        Ok(article) => {
            log::info!("Processed {} ({})", id, article.metadata.document.title);
            let mut state = progress.lock();
            state.successful.push(article);
            state.completed += 1;
            state.completed
        }
        Err(error) => {
            log::error!("Failed to process {}: {}", id, error);
            if let Some(hook) = &options.on_error {
                hook(&error, id);
            }
            let mut state = progress.lock();
            state.failed.push(FailedArticle {
                id: id.clone(),
                error,
            });
            state.completed += 1;
            state.completed
        }
    };

    if let Some(hook) = &options.on_progress {
        hook(completed, total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_preserve_order_and_size() {
        let items: Vec<u32> = (0..10).collect();
        for k in 1..=12 {
            let chunks = chunk(&items, k);
            let (last, full) = chunks.split_last().unwrap();
            assert!(full.iter().all(|c| c.len() == k));
            assert!(!last.is_empty() && last.len() <= k);
            assert_eq!(chunks.concat(), items);
        }
        assert!(chunk::<u32>(&[], 3).is_empty());
    }

    #[test]
    fn failed_article_serializes_code_and_message() {
        let failed = FailedArticle {
            id: DocumentId::parse("bad").unwrap(),
            error: AppError::PageNotFound {
                id: "bad".into(),
                source: None,
            },
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "bad", "code": "PAGE_NOT_FOUND", "message": "Page not found: bad"})
        );
    }
}
