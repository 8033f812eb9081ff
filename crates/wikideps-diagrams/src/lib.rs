//! wikideps-diagrams: the Markdown-to-image pipeline
//!
//! Mermaid blocks are extracted from `.md` sources into `.mmd` files, then
//! rendered with the Mermaid CLI through the core [`CommandRunner`].
//! Checking that the renderer is installed is the caller's job
//! (see `wikideps_core::MermaidCli`).
//!
//! [`CommandRunner`]: wikideps_core::CommandRunner

pub mod error;
pub mod extract;
pub mod layout;
pub mod render;

pub use error::{DiagramError, Result};
pub use extract::{extract_file, extract_mermaid};
pub use layout::DiagramLayout;
pub use render::Renderer;
