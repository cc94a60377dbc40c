// src/formatting/rich_text/annotations.rs
//! Annotation processing for rich text.
//!
//! Styles are applied in a fixed order so that nested markers always
//! come out the same way: code innermost, then strikethrough, bold,
//! italic, underline, and the link outermost.

use crate::types::Annotations;

/// Renderer for text styles to Markdown.
pub struct MarkdownStyleRenderer;

impl MarkdownStyleRenderer {
    /// Applies annotations and an optional link to a run of text.
    pub fn apply_styles(content: &str, annotations: &Annotations, link: Option<&str>) -> String {
        // Markers around whitespace-only runs do not render as emphasis.
        if content.trim().is_empty() {
            return content.to_string();
        }

        let mut result = content.to_string();

        if annotations.code {
            result = format!("`{}`", result);
        }

        if annotations.strikethrough {
            result = format!("~~{}~~", result);
        }

        if annotations.bold {
            result = format!("**{}**", result);
        }

        if annotations.italic {
            result = format!("*{}*", result);
        }

        // Underline requires HTML
        if annotations.underline {
            result = format!("<u>{}</u>", result);
        }

        if let Some(url) = link {
            if !Self::is_markdown_link(&result) {
                result = format!("[{}]({})", result, url);
            }
        }

        result
    }

    /// Checks if content already looks like a Markdown link.
    pub fn is_markdown_link(content: &str) -> bool {
        content.starts_with('[') && content.contains("](") && content.ends_with(')')
    }
}
