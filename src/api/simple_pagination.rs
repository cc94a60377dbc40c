// src/api/simple_pagination.rs
//! Cursor-driven pagination without BoxFuture.

use super::responses::PaginatedResponse;
use crate::constants::NOTION_API_PAGE_SIZE;
use crate::error::AppError;

/// Fetches every page in cursor order, concatenating results.
///
/// `fetch_fn` receives the page size and the cursor returned by the
/// previous page (`None` for the first request).
pub async fn fetch_all_pages_simple<T, F, Fut>(mut fetch_fn: F) -> Result<Vec<T>, AppError>
where
    F: FnMut(u32, Option<String>) -> Fut,
    Fut: std::future::Future<Output = Result<PaginatedResponse<T>, AppError>>,
{
    let mut all_items = Vec::new();
    let mut cursor = None;
    let mut pages_fetched = 0u32;

    loop {
        let response = fetch_fn(NOTION_API_PAGE_SIZE as u32, cursor).await?;

        cursor = response.next_cursor;
        all_items.extend(response.results);
        pages_fetched += 1;

        if cursor.is_none() {
            break;
        }
    }

    log::debug!("Fetched {} item(s) over {} page(s)", all_items.len(), pages_fetched);
    Ok(all_items)
}
