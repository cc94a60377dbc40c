// src/formatting/block_renderer.rs
//! Default Markdown transforms for the common block types.

use super::rich_text::rich_text_to_markdown;
use super::transforms::{TransformContext, TransformRegistry};
use crate::error::AppError;
use crate::model::Block;
use crate::types::plain_text_of;

const CHILD_INDENT: &str = "  ";

pub(super) fn register_defaults(registry: &mut TransformRegistry) {
    registry.register("paragraph", paragraph);
    registry.register("heading_1", |b: &Block, c: &TransformContext<'_>| heading(1, b, c));
    registry.register("heading_2", |b: &Block, c: &TransformContext<'_>| heading(2, b, c));
    registry.register("heading_3", |b: &Block, c: &TransformContext<'_>| heading(3, b, c));
    registry.register("bulleted_list_item", |b: &Block, c: &TransformContext<'_>| {
        Ok(text_with_children("- ", b, c))
    });
    registry.register("numbered_list_item", |b: &Block, c: &TransformContext<'_>| {
        Ok(text_with_children("1. ", b, c))
    });
    registry.register("to_do", to_do);
    registry.register("toggle", |b: &Block, c: &TransformContext<'_>| {
        Ok(text_with_children("", b, c))
    });
    registry.register("quote", quote);
    registry.register("callout", callout);
    registry.register("code", code);
    registry.register("equation", equation);
    registry.register("divider", |_: &Block, _: &TransformContext<'_>| Ok("---".to_string()));
    registry.register("image", image);
    for kind in ["video", "file", "pdf", "audio"] {
        registry.register(kind, file_link);
    }
    for kind in ["bookmark", "embed", "link_preview"] {
        registry.register(kind, bookmark);
    }
    registry.register("child_page", child_page);
}

/// Plain Markdown of any `rich_text` payload, else nothing.
pub(super) fn fallback(block: &Block, ctx: &TransformContext<'_>) -> Result<String, AppError> {
    Ok(text_with_children("", block, ctx))
}

fn paragraph(block: &Block, ctx: &TransformContext<'_>) -> Result<String, AppError> {
    Ok(text_with_children("", block, ctx))
}

fn heading(level: usize, block: &Block, ctx: &TransformContext<'_>) -> Result<String, AppError> {
    let text = format!("{} {}", "#".repeat(level), rich_text_to_markdown(&block.rich_text()));
    // Toggleable headings carry children; they follow unindented.
    Ok(append_children(text, ctx.render_children(block), ""))
}

fn to_do(block: &Block, ctx: &TransformContext<'_>) -> Result<String, AppError> {
    let checked = block
        .data
        .get("checked")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let prefix = if checked { "- [x] " } else { "- [ ] " };
    Ok(text_with_children(prefix, block, ctx))
}

fn quote(block: &Block, ctx: &TransformContext<'_>) -> Result<String, AppError> {
    let body = text_with_children("", block, ctx);
    Ok(prefix_lines(&body, "> "))
}

fn callout(block: &Block, ctx: &TransformContext<'_>) -> Result<String, AppError> {
    let emoji = block
        .data
        .get("icon")
        .and_then(|icon| icon.get("emoji"))
        .and_then(|e| e.as_str());
    let text = rich_text_to_markdown(&block.rich_text());
    let line = match emoji {
        Some(emoji) => format!("{} {}", emoji, text),
        None => text,
    };
    let body = append_children(line, ctx.render_children(block), "");
    Ok(prefix_lines(&body, "> "))
}

fn code(block: &Block, _ctx: &TransformContext<'_>) -> Result<String, AppError> {
    let language = match block.str_field("language") {
        Some("plain text") | None => "",
        Some(lang) => lang,
    };
    let source = plain_text_of(&block.rich_text());
    Ok(format!("```{}\n{}\n```", language, source))
}

fn equation(block: &Block, _ctx: &TransformContext<'_>) -> Result<String, AppError> {
    let expression = block
        .str_field("expression")
        .ok_or_else(|| missing_field(block, "expression"))?;
    Ok(format!("$$\n{}\n$$", expression))
}

fn image(block: &Block, _ctx: &TransformContext<'_>) -> Result<String, AppError> {
    let url = block.file_url().ok_or_else(|| missing_field(block, "url"))?;
    let caption = plain_text_of(&block.rich_text_field("caption"));
    Ok(format!("![{}]({})", caption, url))
}

fn file_link(block: &Block, _ctx: &TransformContext<'_>) -> Result<String, AppError> {
    let url = block.file_url().ok_or_else(|| missing_field(block, "url"))?;
    let caption = plain_text_of(&block.rich_text_field("caption"));
    let label = if caption.is_empty() {
        block.block_type.as_str()
    } else {
        caption.as_str()
    };
    Ok(format!("[{}]({})", label, url))
}

fn bookmark(block: &Block, _ctx: &TransformContext<'_>) -> Result<String, AppError> {
    let url = block.str_field("url").ok_or_else(|| missing_field(block, "url"))?;
    let caption = rich_text_to_markdown(&block.rich_text_field("caption"));
    let label = if caption.is_empty() { url } else { caption.as_str() };
    Ok(format!("[{}]({})", label, url))
}

fn child_page(block: &Block, _ctx: &TransformContext<'_>) -> Result<String, AppError> {
    let title = block.str_field("title").unwrap_or_default();
    Ok(format!(
        "[{}](https://www.notion.so/{})",
        title,
        block.id.as_str()
    ))
}

fn text_with_children(prefix: &str, block: &Block, ctx: &TransformContext<'_>) -> String {
    let text = rich_text_to_markdown(&block.rich_text());
    let line = if text.is_empty() && prefix.is_empty() {
        String::new()
    } else {
        format!("{}{}", prefix, text)
    };
    append_children(line, ctx.render_children(block), CHILD_INDENT)
}

fn append_children(text: String, children: String, indent: &str) -> String {
    match (text.is_empty(), children.is_empty()) {
        (_, true) => text,
        (true, false) => indent_block_content(&children, indent),
        (false, false) => format!("{}\n{}", text, indent_block_content(&children, indent)),
    }
}

/// Indents each non-empty line of `text` by `indent`, preserving blank lines.
fn indent_block_content(text: &str, indent: &str) -> String {
    prefix_lines_where(text, indent, |line| !line.is_empty())
}

fn prefix_lines(text: &str, prefix: &str) -> String {
    prefix_lines_where(text, prefix, |_| true)
}

fn prefix_lines_where(text: &str, prefix: &str, when: impl Fn(&str) -> bool) -> String {
    text.lines()
        .map(|line| {
            if when(line) {
                format!("{}{}", prefix, line)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn missing_field(block: &Block, field: &str) -> AppError {
    AppError::Conversion {
        message: format!(
            "{} block {} has no {} field",
            block.block_type, block.id, field
        ),
        source: None,
    }
}
