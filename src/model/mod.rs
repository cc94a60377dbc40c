// src/model/mod.rs
//! Domain model: document metadata, the block arena, and conversion results.

mod article;
mod block;
mod metadata;

pub use article::{
    media_format, ArticleMetadata, ConversionResult, MediaRef, ProcessedArticle, ProcessedMedia,
};
pub use block::{Block, BlockTree, Children};
pub use metadata::{DocumentMetadata, PropertyValue};
