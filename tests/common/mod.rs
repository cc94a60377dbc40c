// tests/common/mod.rs
//! In-memory fakes shared by the integration tests.
#![allow(dead_code)]

use chrono::Utc;
use indexmap::IndexMap;
use notion2article::{
    AppError, ArticlePipeline, BlockId, ContentStore, DocumentId, DocumentMetadata,
    MediaResponse, MediaTransport, NotionErrorCode, PageRecord, PaginatedResponse,
    ProcessedArticle, RawBlock,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

/// A content store backed by JSON fixtures.
#[derive(Default)]
pub struct FakeStore {
    pages: HashMap<String, Value>,
    children: HashMap<String, Vec<Value>>,
    missing: HashSet<String>,
    denied: HashSet<String>,
    transient_failures: Mutex<HashMap<String, u32>>,
    page_limit: Option<usize>,
    page_calls: AtomicUsize,
    children_calls: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, id: &str, title: &str) -> Self {
        self.with_page_properties(id, json!({ "Name": title_property(title) }))
    }

    pub fn with_page_status(self, id: &str, title: &str, status: &str) -> Self {
        self.with_page_properties(
            id,
            json!({
                "Name": title_property(title),
                "Status": {"id": "s", "type": "status", "status": {"id": "1", "name": status}}
            }),
        )
    }

    pub fn with_page_properties(mut self, id: &str, properties: Value) -> Self {
        self.pages.insert(
            id.to_string(),
            json!({
                "object": "page",
                "id": id,
                "created_time": "2024-01-01T00:00:00.000Z",
                "last_edited_time": "2024-01-02T00:00:00.000Z",
                "properties": properties
            }),
        );
        self
    }

    pub fn with_children(mut self, parent: &str, blocks: Vec<Value>) -> Self {
        self.children.insert(parent.to_string(), blocks);
        self
    }

    /// Both page and children lookups report the object as absent.
    pub fn with_missing(mut self, id: &str) -> Self {
        self.missing.insert(id.to_string());
        self
    }

    /// Every call for `id` is rejected as unauthorized.
    pub fn with_denied(mut self, id: &str) -> Self {
        self.denied.insert(id.to_string());
        self
    }

    /// The first `count` calls touching `id` fail with a transient error.
    pub fn with_transient_failures(self, id: &str, count: u32) -> Self {
        self.transient_failures.lock().insert(id.to_string(), count);
        self
    }

    /// Caps how many children a single listing returns.
    pub fn with_page_limit(mut self, limit: usize) -> Self {
        self.page_limit = Some(limit);
        self
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    /// `(parent, cursor)` of every children listing, in call order.
    pub fn children_calls(&self) -> Vec<(String, Option<String>)> {
        self.children_calls.lock().clone()
    }

    fn check(&self, id: &str) -> Result<(), AppError> {
        if self.missing.contains(id) {
            return Err(service_error(NotionErrorCode::ObjectNotFound, 404));
        }
        if self.denied.contains(id) {
            return Err(service_error(NotionErrorCode::Unauthorized, 401));
        }
        let mut failures = self.transient_failures.lock();
        if let Some(remaining) = failures.get_mut(id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(AppError::MalformedResponse("connection reset".into()));
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ContentStore for FakeStore {
    async fn retrieve_page(&self, id: &DocumentId) -> Result<PageRecord, AppError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.check(id.as_str())?;
        let page = self
            .pages
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| service_error(NotionErrorCode::ObjectNotFound, 404))?;
        Ok(serde_json::from_value(page)?)
    }

    async fn list_children(
        &self,
        parent: &BlockId,
        start_cursor: Option<&str>,
        page_size: u32,
    ) -> Result<PaginatedResponse<RawBlock>, AppError> {
        self.children_calls
            .lock()
            .push((parent.to_string(), start_cursor.map(str::to_string)));
        self.check(parent.as_str())?;

        let all = self.children.get(parent.as_str()).cloned().unwrap_or_default();
        let start: usize = start_cursor.map_or(0, |c| c.parse().unwrap_or(0));
        let size = self
            .page_limit
            .map_or(page_size as usize, |limit| limit.min(page_size as usize));
        let end = (start + size).min(all.len());
        let has_more = end < all.len();

        Ok(serde_json::from_value(json!({
            "object": "list",
            "results": all[start..end].to_vec(),
            "next_cursor": if has_more { Some(end.to_string()) } else { None },
            "has_more": has_more
        }))?)
    }
}

/// Serves fixed bytes for every URL and records what was requested.
#[derive(Default)]
pub struct FakeTransport {
    failing: HashSet<String>,
    echo_url: bool,
    requests: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests for `url` answer with a 404.
    pub fn with_failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    /// Answers every request with the requested URL as the body.
    pub fn echoing_url(mut self) -> Self {
        self.echo_url = true;
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait::async_trait]
impl MediaTransport for FakeTransport {
    async fn get(&self, url: &Url) -> Result<MediaResponse, AppError> {
        self.requests.lock().push(url.to_string());
        if self.failing.contains(url.as_str()) {
            return Ok(MediaResponse {
                status: 404,
                body: Vec::new(),
            });
        }
        let body = if self.echo_url {
            url.as_str().as_bytes().to_vec()
        } else {
            b"fake-bytes".to_vec()
        };
        Ok(MediaResponse { status: 200, body })
    }
}

pub fn service_error(code: NotionErrorCode, status: u16) -> AppError {
    AppError::NotionService {
        message: code.to_string(),
        code,
        status,
    }
}

pub fn title_property(title: &str) -> Value {
    json!({"id": "title", "type": "title", "title": [{"type": "text", "plain_text": title}]})
}

fn text(content: &str) -> Value {
    json!([{"type": "text", "plain_text": content, "text": {"content": content}}])
}

pub fn block(id: &str, block_type: &str, has_children: bool, payload: Value) -> Value {
    let mut value = json!({
        "object": "block",
        "id": id,
        "type": block_type,
        "has_children": has_children
    });
    value[block_type] = payload;
    value
}

pub fn paragraph(id: &str, content: &str) -> Value {
    block(id, "paragraph", false, json!({ "rich_text": text(content) }))
}

pub fn heading(id: &str, level: u8, content: &str) -> Value {
    block(
        id,
        &format!("heading_{}", level),
        false,
        json!({ "rich_text": text(content) }),
    )
}

pub fn bulleted(id: &str, content: &str, has_children: bool) -> Value {
    block(
        id,
        "bulleted_list_item",
        has_children,
        json!({ "rich_text": text(content) }),
    )
}

pub fn image(id: &str, url: &str, caption: &str) -> Value {
    block(
        id,
        "image",
        false,
        json!({ "type": "external", "external": {"url": url}, "caption": text(caption) }),
    )
}

pub fn id(raw: &str) -> DocumentId {
    DocumentId::parse(raw).unwrap()
}

/// An article pipeline driven by per-id scripts instead of a store.
///
/// Records `start:<id>` and `end:<id>` events so tests can observe how
/// runs were scheduled.
#[derive(Default)]
pub struct ScriptedPipeline {
    failures: HashMap<String, (u32, fn(&str) -> AppError)>,
    delays: HashMap<String, Duration>,
    attempts: Mutex<HashMap<String, u32>>,
    events: Mutex<Vec<String>>,
}

impl ScriptedPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every run of `id` fails with a page-not-found error.
    pub fn failing(self, id: &str) -> Self {
        self.failing_times(id, u32::MAX, not_found)
    }

    /// The first `times` runs of `id` fail with `error(id)`.
    pub fn failing_times(mut self, id: &str, times: u32, error: fn(&str) -> AppError) -> Self {
        self.failures.insert(id.to_string(), (times, error));
        self
    }

    pub fn slow(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(id.to_string(), delay);
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn attempts(&self, id: &str) -> u32 {
        self.attempts.lock().get(id).copied().unwrap_or(0)
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }
}

#[async_trait::async_trait]
impl ArticlePipeline for ScriptedPipeline {
    async fn process_article(&self, id: &DocumentId) -> Result<ProcessedArticle, AppError> {
        let key = id.to_string();
        let attempt = {
            let mut attempts = self.attempts.lock();
            let count = attempts.entry(key.clone()).or_insert(0);
            *count += 1;
            *count
        };
        self.events.lock().push(format!("start:{}", key));
        if let Some(delay) = self.delays.get(&key) {
            tokio::time::sleep(*delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.events.lock().push(format!("end:{}", key));

        match self.failures.get(&key) {
            Some((times, error)) if attempt <= *times => Err(error(&key)),
            _ => Ok(article(id)),
        }
    }
}

pub fn not_found(id: &str) -> AppError {
    AppError::PageNotFound {
        id: id.to_string(),
        source: None,
    }
}

pub fn connection_reset(_: &str) -> AppError {
    AppError::MalformedResponse("connection reset".into())
}

pub fn unauthorized(_: &str) -> AppError {
    service_error(NotionErrorCode::Unauthorized, 401)
}

pub fn article(id: &DocumentId) -> ProcessedArticle {
    let metadata = DocumentMetadata::new(id.clone(), Utc::now(), Utc::now(), IndexMap::new());
    ProcessedArticle {
        metadata: metadata.into(),
        document: format!("# {}", id),
        media: Vec::new(),
        processed_at: Utc::now(),
        processing_time_ms: 0,
    }
}

pub fn ids(raw: &[&str]) -> Vec<DocumentId> {
    raw.iter().map(|r| id(r)).collect()
}
