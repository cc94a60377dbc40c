// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Notion API boundaries
// ---------------------------------------------------------------------------

/// How many blocks the Notion API returns per page of children.
///
/// The Notion API maximum is 100. We use the maximum to minimize
/// round-trips during recursive block retrieval.
pub const NOTION_API_PAGE_SIZE: usize = 100;

/// API version header sent with every request.
pub const NOTION_API_VERSION: &str = "2022-06-28";

/// Base URL of the Notion REST API.
pub const NOTION_API_BASE_URL: &str = "https://api.notion.com/v1";

// ---------------------------------------------------------------------------
// Configuration defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_IMAGE_DIRECTORY: &str = "./images";
pub const DEFAULT_IMAGE_URL_PREFIX: &str = "/images";
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Upper bound accepted for `max_retries`.
pub const MAX_ALLOWED_RETRIES: u32 = 10;

/// Title used when a page carries no title property.
pub const UNTITLED: &str = "Untitled";

// ---------------------------------------------------------------------------
// Batch processing
// ---------------------------------------------------------------------------

/// How many articles run concurrently inside one wave.
pub const DEFAULT_BATCH_CONCURRENCY: usize = 3;

/// Retries applied to each article run by the batch retry wrapper.
pub const BATCH_RETRY_ATTEMPTS: u32 = 2;
pub const BATCH_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Retries applied by the single-article retry wrapper.
pub const ARTICLE_RETRY_ATTEMPTS: u32 = 3;
pub const ARTICLE_RETRY_DELAY: Duration = Duration::from_millis(1000);

// ---------------------------------------------------------------------------
// Error recovery cool-downs
// ---------------------------------------------------------------------------

/// Cool-down before retrying after the remote store reported a rate limit.
pub const API_LIMIT_COOLDOWN: Duration = Duration::from_millis(5000);

/// Cool-down before retrying after a transport failure.
pub const NETWORK_COOLDOWN: Duration = Duration::from_millis(1000);

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

/// Extension given to media files whose URL carries none.
pub const DEFAULT_MEDIA_EXTENSION: &str = ".png";

/// Basename used when a media URL has an empty last path segment.
pub const DEFAULT_MEDIA_BASENAME: &str = "image";

// ---------------------------------------------------------------------------
// String capacity hints (performance, not correctness)
// ---------------------------------------------------------------------------

/// Estimated characters per block, used to pre-allocate output strings.
pub const CHARS_PER_BLOCK_ESTIMATE: usize = 256;

/// Maximum characters shown when previewing error response bodies.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 500;
