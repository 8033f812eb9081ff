//! Pull ```` ```mermaid ```` fenced blocks out of Markdown

use std::path::Path;

use crate::error::{DiagramError, Result};

/// Concatenate every mermaid block in `markdown`.
///
/// A block opens on a line that starts with ```` ```mermaid ```` once
/// trimmed, and closes on the next line starting with ```` ``` ````. Body
/// lines are kept verbatim. Returns `None` when no block has any content.
pub fn extract_mermaid(markdown: &str) -> Option<String> {
    let mut in_block = false;
    let mut body = Vec::new();

    for line in markdown.split('\n') {
        let trimmed = line.trim();
        if trimmed.starts_with("```mermaid") {
            in_block = true;
            continue;
        }
        if in_block && trimmed.starts_with("```") {
            in_block = false;
            continue;
        }
        if in_block {
            body.push(line);
        }
    }

    (!body.is_empty()).then(|| body.join("\n"))
}

/// Extract `md_path` into `mmd_path`, creating the parent directory.
pub fn extract_file(md_path: &Path, mmd_path: &Path) -> Result<()> {
    let markdown = std::fs::read_to_string(md_path).map_err(DiagramError::io(md_path))?;
    let diagram =
        extract_mermaid(&markdown).ok_or_else(|| DiagramError::NoMermaidBlock(md_path.into()))?;

    if let Some(parent) = mmd_path.parent() {
        std::fs::create_dir_all(parent).map_err(DiagramError::io(parent))?;
    }
    std::fs::write(mmd_path, diagram).map_err(DiagramError::io(mmd_path))
}
