// src/output/paths.rs
//! Pure functions for output path calculation.

use std::path::{Path, PathBuf};

/// Where one article's files go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticlePaths {
    pub document: PathBuf,
    pub metadata: PathBuf,
}

/// `<output>/<id>.md` and `<output>/<id>.json`.
pub fn article_output_paths(output_dir: &Path, id: &str) -> ArticlePaths {
    let stem = sanitize_filename(id);
    ArticlePaths {
        document: output_dir.join(format!("{}.md", stem)),
        metadata: output_dir.join(format!("{}.json", stem)),
    }
}

/// Sanitizes a string to be safe for use as a filename.
pub fn sanitize_filename(name: &str) -> String {
    let mut safe_name = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>();

    safe_name = safe_name.trim().trim_matches('.').to_string();

    if safe_name.len() > 100 {
        let mut cut = 100;
        while !safe_name.is_char_boundary(cut) {
            cut -= 1;
        }
        safe_name.truncate(cut);
    }

    if safe_name.is_empty() {
        safe_name = "unnamed".to_string();
    }

    safe_name
}
