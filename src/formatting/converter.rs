// src/formatting/converter.rs
//! Block tree to document conversion with media localization.

use super::transforms::{TransformContext, TransformRegistry};
use crate::api::BlockFetcher;
use crate::constants::CHARS_PER_BLOCK_ESTIMATE;
use crate::error::AppError;
use crate::model::{BlockTree, ConversionResult};
use crate::output::MediaLocalizer;
use crate::types::BlockId;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static MEDIA_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").unwrap_or_else(|e| panic!("invalid regex: {}", e))
});

const BLOCK_SEPARATOR: &str = "\n\n";

#[derive(Clone)]
pub struct DocumentConverter {
    fetcher: BlockFetcher,
    registry: TransformRegistry,
    media: MediaLocalizer,
}

impl DocumentConverter {
    pub fn new(fetcher: BlockFetcher, registry: TransformRegistry, media: MediaLocalizer) -> Self {
        Self {
            fetcher,
            registry,
            media,
        }
    }

    /// Converts an already fetched block tree.
    pub async fn convert(&self, blocks: &BlockTree) -> Result<ConversionResult, AppError> {
        self.convert_with(blocks, &self.media).await
    }

    /// Converts `blocks` with media kept under its own `scope` of the
    /// media directory, see [`MediaLocalizer::scoped`].
    pub async fn convert_scoped(
        &self,
        blocks: &BlockTree,
        scope: &str,
    ) -> Result<ConversionResult, AppError> {
        self.convert_with(blocks, &self.media.scoped(scope)).await
    }

    async fn convert_with(
        &self,
        blocks: &BlockTree,
        media: &MediaLocalizer,
    ) -> Result<ConversionResult, AppError> {
        let document = self.render(blocks);
        localize_media(media, document)
            .await
            .map_err(|e| conversion_error(e, || "document conversion failed".to_string()))
    }

    /// Fetches the tree under `id` and converts it.
    pub async fn convert_by_id(&self, id: &BlockId) -> Result<ConversionResult, AppError> {
        let result = async {
            let blocks = self.fetcher.fetch_blocks(id).await?;
            self.convert(&blocks).await
        }
        .await;

        result.map_err(|e| {
            if e.is_conversion_error() || e.is_fetch_error() {
                e
            } else {
                AppError::PageConversion {
                    id: id.to_string(),
                    source: Box::new(e),
                }
            }
        })
    }

    /// Runs each top-level transform in order and joins the results.
    pub fn render(&self, blocks: &BlockTree) -> String {
        let ctx = TransformContext::new(blocks, &self.registry);
        let mut output = String::with_capacity(blocks.root_count() * CHARS_PER_BLOCK_ESTIMATE);
        for block in blocks.roots() {
            output.push_str(&self.registry.apply(block, &ctx));
            output.push_str(BLOCK_SEPARATOR);
        }
        output.trim().to_string()
    }
}

/// Rewrites embedded media to local copies, one at a time in document order.
///
/// Every absolute URL consumes an index even when its download fails,
/// so file numbering depends only on position.
async fn localize_media(
    media_localizer: &MediaLocalizer,
    document: String,
) -> Result<ConversionResult, AppError> {
    let mut media = Vec::new();
    let mut output = String::with_capacity(document.len());
    let mut last = 0;
    let mut index = 0;

    for caps in MEDIA_PATTERN.captures_iter(&document) {
        let (Some(whole), Some(alt), Some(url)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        if Url::parse(url.as_str()).is_err() {
            continue;
        }

        let current = index;
        index += 1;
        match media_localizer.localize(url.as_str(), current).await {
            Ok(localized) => {
                output.push_str(&document[last..whole.start()]);
                output.push_str(&format!("![{}]({})", alt.as_str(), localized.document_path));
                last = whole.end();
                media.push(localized);
            }
            Err(e) => {
                log::error!("Failed to localize media {}: {}", url.as_str(), e);
            }
        }
    }
    output.push_str(&document[last..]);

    Ok(ConversionResult {
        document: output,
        media,
    })
}

fn conversion_error(e: AppError, message: impl FnOnce() -> String) -> AppError {
    if e.is_conversion_error() {
        e
    } else {
        AppError::Conversion {
            message: message(),
            source: Some(Box::new(e)),
        }
    }
}
