//! Where sources, intermediates and images live

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Directory and renderer settings, relative to the working directory by default
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramLayout {
    /// Markdown sources, searched recursively
    pub source_dir: PathBuf,
    /// Extracted `.mmd` files
    pub mmd_dir: PathBuf,
    /// Rendered images
    pub image_dir: PathBuf,
    /// Image format, as a file extension (`png`, `svg`, `pdf`)
    pub output_ext: String,
    pub mermaid_config: PathBuf,
    pub puppeteer_config: PathBuf,
    pub background: String,
}

impl Default for DiagramLayout {
    fn default() -> Self {
        DiagramLayout {
            source_dir: PathBuf::from("assets/diagrams/src"),
            mmd_dir: PathBuf::from("assets/diagrams/gen/mmd"),
            image_dir: PathBuf::from("assets/diagrams/gen/png"),
            output_ext: "png".to_string(),
            mermaid_config: PathBuf::from("assets/diagrams/mermaid-config.json"),
            puppeteer_config: PathBuf::from("assets/diagrams/puppeteer-config.json"),
            background: "#1B1B2F".to_string(),
        }
    }
}

impl DiagramLayout {
    /// Resolve every relative path against `root`.
    pub fn rooted(mut self, root: &Path) -> Self {
        for path in [
            &mut self.source_dir,
            &mut self.mmd_dir,
            &mut self.image_dir,
            &mut self.mermaid_config,
            &mut self.puppeteer_config,
        ] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
        self
    }

    pub fn markdown_path(&self, name: &str) -> PathBuf {
        self.source_dir.join(format!("{name}.md"))
    }

    pub fn mmd_path(&self, name: &str) -> PathBuf {
        self.mmd_dir.join(format!("{name}.mmd"))
    }

    pub fn image_path(&self, name: &str) -> PathBuf {
        self.image_dir.join(format!("{name}.{}", self.output_ext))
    }
}
