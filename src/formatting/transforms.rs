// src/formatting/transforms.rs
//! Per-block-type transforms keyed by the block's type tag.

use super::block_renderer;
use crate::error::AppError;
use crate::model::{Block, BlockTree};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Turns one block into text.
///
/// Implemented for any `Fn(&Block, &TransformContext) -> Result<String, AppError>`,
/// so plain functions and closures can be registered directly.
pub trait BlockTransform: Send + Sync {
    fn transform(&self, block: &Block, ctx: &TransformContext<'_>) -> Result<String, AppError>;
}

impl<F> BlockTransform for F
where
    F: Fn(&Block, &TransformContext<'_>) -> Result<String, AppError> + Send + Sync,
{
    fn transform(&self, block: &Block, ctx: &TransformContext<'_>) -> Result<String, AppError> {
        self(block, ctx)
    }
}

/// Caller-supplied transforms that replace the defaults per block type.
pub type CustomTransforms = HashMap<String, Arc<dyn BlockTransform>>;

/// Wraps a closure as a shareable transform.
pub fn transform<F>(f: F) -> Arc<dyn BlockTransform>
where
    F: Fn(&Block, &TransformContext<'_>) -> Result<String, AppError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// What a transform can see besides its own block.
pub struct TransformContext<'a> {
    tree: &'a BlockTree,
    registry: &'a TransformRegistry,
}

impl<'a> TransformContext<'a> {
    pub fn new(tree: &'a BlockTree, registry: &'a TransformRegistry) -> Self {
        Self { tree, registry }
    }

    pub fn tree(&self) -> &BlockTree {
        self.tree
    }

    /// Renders the loaded children of `block`, one per line, in order.
    pub fn render_children(&self, block: &Block) -> String {
        self.tree
            .children_of(block)
            .into_iter()
            .map(|child| self.registry.apply(child, self))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Registry of transforms with a fallback for unknown types.
#[derive(Clone)]
pub struct TransformRegistry {
    transforms: HashMap<String, Arc<dyn BlockTransform>>,
    fallback: Arc<dyn BlockTransform>,
}

impl TransformRegistry {
    /// A registry with no per-type transforms, only `fallback`.
    pub fn empty<F>(fallback: F) -> Self
    where
        F: Fn(&Block, &TransformContext<'_>) -> Result<String, AppError> + Send + Sync + 'static,
    {
        Self {
            transforms: HashMap::new(),
            fallback: transform(fallback),
        }
    }

    /// Default transforms with `custom` layered on top.
    pub fn with_overrides(custom: &CustomTransforms) -> Self {
        let mut registry = Self::default();
        for (block_type, custom) in custom {
            registry.register_shared(block_type, Arc::clone(custom));
        }
        registry
    }

    pub fn register<F>(&mut self, block_type: &str, f: F)
    where
        F: Fn(&Block, &TransformContext<'_>) -> Result<String, AppError> + Send + Sync + 'static,
    {
        self.register_shared(block_type, transform(f));
    }

    pub fn register_shared(&mut self, block_type: &str, transform: Arc<dyn BlockTransform>) {
        self.transforms.insert(block_type.to_string(), transform);
    }

    pub fn has(&self, block_type: &str) -> bool {
        self.transforms.contains_key(block_type)
    }

    /// Runs the transform for `block`, degrading failures to an empty string.
    pub fn apply(&self, block: &Block, ctx: &TransformContext<'_>) -> String {
        let selected = self
            .transforms
            .get(&block.block_type)
            .unwrap_or(&self.fallback);

        match selected.transform(block, ctx) {
            Ok(text) => text,
            Err(e) => {
                log::error!(
                    "Failed to convert block {} ({}): {}",
                    block.id,
                    block.block_type,
                    e
                );
                String::new()
            }
        }
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        let mut registry = Self::empty(block_renderer::fallback);
        block_renderer::register_defaults(&mut registry);
        registry
    }
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.transforms.keys().collect();
        types.sort();
        f.debug_struct("TransformRegistry")
            .field("types", &types)
            .finish()
    }
}
