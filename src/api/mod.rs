// src/api/mod.rs
//! Notion API interaction: the ability to retrieve content from a workspace.
//!
//! Business logic depends on [`ContentStore`], never on HTTP details.
//! [`NotionHttpClient`] is the production implementation and
//! [`BlockFetcher`] layers retries, pagination and recursion on top.

pub mod client;
pub mod fetcher;
pub mod parser;
pub mod responses;
mod simple_pagination;

use crate::error::AppError;
use crate::types::{BlockId, DocumentId};

pub use client::NotionHttpClient;
pub use fetcher::{BlockFetcher, FetchedArticle};
pub use responses::{PageRecord, PaginatedResponse, RawBlock};

/// The ability to retrieve content from a remote store.
#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    /// Retrieves a document record by id.
    async fn retrieve_page(&self, id: &DocumentId) -> Result<PageRecord, AppError>;

    /// Lists one page of children of a block or document.
    async fn list_children(
        &self,
        parent: &BlockId,
        start_cursor: Option<&str>,
        page_size: u32,
    ) -> Result<PaginatedResponse<RawBlock>, AppError>;
}
