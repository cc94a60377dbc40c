// src/formatting/mod.rs
//! Renders block trees into Markdown documents.

mod block_renderer;
pub mod converter;
mod rich_text;
pub mod transforms;

pub use converter::DocumentConverter;
pub use rich_text::rich_text_to_markdown;
pub use transforms::{
    transform, BlockTransform, CustomTransforms, TransformContext, TransformRegistry,
};
