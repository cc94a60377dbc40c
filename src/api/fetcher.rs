// src/api/fetcher.rs
//! Retrieves document metadata and full block trees.
//!
//! Every remote call is retried on its own. Child recursion walks blocks
//! one at a time in listed order, depth first, which keeps request bursts
//! against the store's rate limit flat at the cost of latency on deep trees.

use super::simple_pagination::fetch_all_pages_simple;
use super::ContentStore;
use crate::error::AppError;
use crate::error_recovery::{retry_with_decision, RetryDecision, RetryPolicy};
use crate::model::{Block, BlockTree, DocumentMetadata};
use crate::types::{BlockId, DocumentId};
use futures::future::BoxFuture;
use std::sync::Arc;

/// Metadata and content of one document.
#[derive(Debug, Clone)]
pub struct FetchedArticle {
    pub metadata: DocumentMetadata,
    pub blocks: BlockTree,
}

#[derive(Clone)]
pub struct BlockFetcher {
    store: Arc<dyn ContentStore>,
    policy: RetryPolicy,
}

impl BlockFetcher {
    pub fn new(store: Arc<dyn ContentStore>, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    /// Retrieves the document record and derives its metadata.
    pub async fn fetch_metadata(&self, id: &DocumentId) -> Result<DocumentMetadata, AppError> {
        let record = self
            .call("Retrieve page properties", || self.store.retrieve_page(id))
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    AppError::PageNotFound {
                        id: id.to_string(),
                        source: Some(Box::new(e)),
                    }
                } else {
                    e
                }
            })?;

        record
            .into_metadata(id.clone())
            .ok_or_else(|| AppError::PageNotFound {
                id: id.to_string(),
                source: None,
            })
    }

    /// Retrieves the complete block tree under `parent`.
    pub async fn fetch_blocks(&self, parent: &BlockId) -> Result<BlockTree, AppError> {
        let roots = self.list_all_children(parent).await?;
        let nested = with_children(&roots);
        let mut tree = BlockTree::from_roots(roots);
        for id in nested {
            self.load_descendants(&mut tree, id).await?;
        }
        log::debug!("Fetched {} blocks under {}", tree.len(), parent);
        Ok(tree)
    }

    /// Retrieves metadata and blocks concurrently.
    pub async fn fetch_article(&self, id: &DocumentId) -> Result<FetchedArticle, AppError> {
        let root = id.cast();
        let result = tokio::try_join!(self.fetch_metadata(id), self.fetch_blocks(&root));

        match result {
            Ok((metadata, blocks)) => Ok(FetchedArticle { metadata, blocks }),
            Err(e) if e.is_fetch_error() => Err(e),
            Err(e) => Err(AppError::FetchArticle {
                id: id.to_string(),
                source: Box::new(e),
            }),
        }
    }

    fn load_descendants<'a>(
        &'a self,
        tree: &'a mut BlockTree,
        parent: BlockId,
    ) -> BoxFuture<'a, Result<(), AppError>> {
        Box::pin(async move {
            let children = self.list_all_children(&parent).await?;
            let nested = with_children(&children);
            tree.attach_children(&parent, children);
            for id in nested {
                self.load_descendants(&mut *tree, id).await?;
            }
            Ok(())
        })
    }

    async fn list_all_children(&self, parent: &BlockId) -> Result<Vec<Block>, AppError> {
        let raw = fetch_all_pages_simple(|page_size, cursor| async move {
            self.call("List block children", || {
                self.store
                    .list_children(parent, cursor.as_deref(), page_size)
            })
            .await
        })
        .await
        .map_err(|e| {
            if e.is_not_found() && !matches!(e, AppError::BlockNotFound { .. }) {
                AppError::BlockNotFound {
                    id: parent.to_string(),
                    source: Some(Box::new(e)),
                }
            } else {
                e
            }
        })?;

        Ok(raw.into_iter().map(|b| b.into_block()).collect())
    }

    /// One remote call under the retry policy. Absent objects are final.
    async fn call<T, F, Fut>(&self, operation: &str, f: F) -> Result<T, AppError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, AppError>>,
    {
        retry_with_decision(
            operation,
            &self.policy,
            f,
            |e| {
                if e.is_not_found() {
                    RetryDecision::Stop
                } else {
                    RetryDecision::RETRY
                }
            },
            |_, _| {},
        )
        .await
    }
}

fn with_children(blocks: &[Block]) -> Vec<BlockId> {
    blocks
        .iter()
        .filter(|b| b.has_children)
        .map(|b| b.id.clone())
        .collect()
}
