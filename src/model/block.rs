// src/model/block.rs
//! Blocks and the arena that holds a fetched block tree.

use crate::types::{BlockId, RichTextItem};
use serde::Serialize;
use std::collections::HashMap;

/// Load state of a block's children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Children {
    /// The block has no children.
    None,
    /// The block has children that were not retrieved.
    NotLoaded,
    /// Children were retrieved; ids in listed order.
    Loaded(Vec<BlockId>),
}

/// A node of a document's content tree.
///
/// `data` holds the type-specific payload (the object keyed by the
/// block's type in the API response) untouched, so per-type transforms
/// can read whatever fields they need.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub id: BlockId,
    pub block_type: String,
    pub has_children: bool,
    pub children: Children,
    pub data: serde_json::Value,
}

impl Block {
    /// A block whose children are marked according to `has_children`.
    pub fn new(
        id: BlockId,
        block_type: impl Into<String>,
        has_children: bool,
        data: serde_json::Value,
    ) -> Self {
        Self {
            id,
            block_type: block_type.into(),
            has_children,
            children: if has_children {
                Children::NotLoaded
            } else {
                Children::None
            },
            data,
        }
    }

    /// The `rich_text` runs of the payload; empty when absent or malformed.
    pub fn rich_text(&self) -> Vec<RichTextItem> {
        self.rich_text_field("rich_text")
    }

    /// Rich text runs stored under `field` (e.g. `caption`).
    pub fn rich_text_field(&self, field: &str) -> Vec<RichTextItem> {
        self.data
            .get(field)
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }

    /// A string field of the payload.
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(|v| v.as_str())
    }

    /// URL of a file-like payload (`external.url` or `file.url`), or a plain `url`.
    pub fn file_url(&self) -> Option<&str> {
        self.data
            .get("external")
            .or_else(|| self.data.get("file"))
            .and_then(|file| file.get("url"))
            .and_then(|url| url.as_str())
            .or_else(|| self.str_field("url"))
    }
}

/// Arena of blocks addressed by id, with top-level order preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BlockTree {
    roots: Vec<BlockId>,
    nodes: HashMap<BlockId, Block>,
}

impl BlockTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree from top-level blocks, in order.
    pub fn from_roots(blocks: Vec<Block>) -> Self {
        let mut tree = Self::new();
        for block in blocks {
            tree.push_root(block);
        }
        tree
    }

    pub fn push_root(&mut self, block: Block) {
        self.roots.push(block.id.clone());
        self.nodes.insert(block.id.clone(), block);
    }

    /// Records `children` as the loaded children of `parent`.
    ///
    /// Returns false when `parent` is not in the tree.
    pub fn attach_children(&mut self, parent: &BlockId, children: Vec<Block>) -> bool {
        if !self.nodes.contains_key(parent) {
            return false;
        }
        let ids = children.iter().map(|b| b.id.clone()).collect();
        for child in children {
            self.nodes.insert(child.id.clone(), child);
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children = Children::Loaded(ids);
        }
        true
    }

    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.nodes.get(id)
    }

    /// Top-level blocks in listed order.
    pub fn roots(&self) -> impl Iterator<Item = &Block> {
        self.roots.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Loaded children of `block` in listed order; empty when not loaded.
    pub fn children_of(&self, block: &Block) -> Vec<&Block> {
        match &block.children {
            Children::Loaded(ids) => ids.iter().filter_map(|id| self.nodes.get(id)).collect(),
            Children::None | Children::NotLoaded => Vec::new(),
        }
    }

    /// Number of blocks at every depth.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn block(id: &str, has_children: bool) -> Block {
        Block::new(
            BlockId::parse(id).unwrap(),
            "paragraph",
            has_children,
            json!({"rich_text": [{"plain_text": id}]}),
        )
    }

    #[test]
    fn children_state_follows_flag() {
        assert_eq!(block("a", false).children, Children::None);
        assert_eq!(block("b", true).children, Children::NotLoaded);
    }

    #[test]
    fn attach_children_preserves_order() {
        let mut tree = BlockTree::from_roots(vec![block("p1", true), block("p2", false)]);
        let parent = BlockId::parse("p1").unwrap();
        assert!(tree.attach_children(&parent, vec![block("c2", false), block("c1", false)]));

        let root = tree.get(&parent).unwrap();
        let names: Vec<_> = tree
            .children_of(root)
            .iter()
            .map(|b| b.id.as_str().to_string())
            .collect();
        assert_eq!(names, vec!["c2", "c1"]);
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.root_count(), 2);
        assert!(!tree.attach_children(&BlockId::parse("missing").unwrap(), vec![]));
    }

    #[test]
    fn payload_accessors() {
        let image = Block::new(
            BlockId::parse("img").unwrap(),
            "image",
            false,
            json!({"type": "external", "external": {"url": "https://cdn.example/a.png"}}),
        );
        assert_eq!(image.file_url(), Some("https://cdn.example/a.png"));
        assert_eq!(block("x", false).rich_text()[0].plain_text, "x");
        assert!(image.rich_text().is_empty());
    }
}
