//! Error types for diagram rendering

use std::path::PathBuf;

use thiserror::Error;
use wikideps_core::DepsError;

#[derive(Error, Debug)]
pub enum DiagramError {
    #[error("no mermaid block found in {}", .0.display())]
    NoMermaidBlock(PathBuf),

    #[error("markdown file not found: {}", .0.display())]
    MarkdownNotFound(PathBuf),

    #[error("IO error on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render {diagram}")]
    Render {
        diagram: String,
        #[source]
        source: DepsError,
    },
}

impl DiagramError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| DiagramError::Io { path, source }
    }
}

/// Result type for diagram operations
pub type Result<T> = std::result::Result<T, DiagramError>;
