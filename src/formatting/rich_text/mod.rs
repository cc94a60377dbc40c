// src/formatting/rich_text/mod.rs
//! Formats Notion rich text runs into Markdown.

mod annotations;

pub use annotations::MarkdownStyleRenderer;

use crate::types::RichTextItem;

/// Formats an array of rich text runs into Markdown.
pub fn rich_text_to_markdown(items: &[RichTextItem]) -> String {
    items.iter().map(format_single_item).collect()
}

fn format_single_item(item: &RichTextItem) -> String {
    MarkdownStyleRenderer::apply_styles(&item.plain_text, &item.annotations, item.href.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Annotations;

    #[test]
    fn test_plain_text_formatting() {
        let items = vec![RichTextItem::plain_text("Hello World")];
        assert_eq!(rich_text_to_markdown(&items), "Hello World");
    }

    #[test]
    fn test_mixed_runs() {
        let items = vec![
            RichTextItem::plain_text("Read "),
            RichTextItem {
                plain_text: "the docs".to_string(),
                href: Some("https://docs.rs".to_string()),
                annotations: Annotations {
                    bold: true,
                    ..Default::default()
                },
            },
            RichTextItem::plain_text("."),
        ];
        assert_eq!(
            rich_text_to_markdown(&items),
            "Read [**the docs**](https://docs.rs)."
        );
    }
}
