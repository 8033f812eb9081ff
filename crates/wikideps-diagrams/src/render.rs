//! Markdown -> `.mmd` -> image, via `mmdc`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;
use wikideps_core::{run_checked, CommandRunner, CommandSpec};

use crate::error::{DiagramError, Result};
use crate::extract::extract_file;
use crate::layout::DiagramLayout;

/// Drives the render pipeline over a [`DiagramLayout`]
pub struct Renderer {
    layout: DiagramLayout,
    runner: Arc<dyn CommandRunner>,
}

impl Renderer {
    pub fn new(layout: DiagramLayout, runner: Arc<dyn CommandRunner>) -> Self {
        Renderer { layout, runner }
    }

    pub fn layout(&self) -> &DiagramLayout {
        &self.layout
    }

    /// Markdown sources under the source directory, recursively, in path order
    pub fn sources(&self) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        collect_markdown(&self.layout.source_dir, &mut found)?;
        found.sort();
        Ok(found)
    }

    /// Render every source. Stops at the first failure.
    pub fn render_all(&self) -> Result<Vec<PathBuf>> {
        info!(dir = %self.layout.source_dir.display(), "rendering all diagrams");
        for dir in [&self.layout.mmd_dir, &self.layout.image_dir] {
            std::fs::create_dir_all(dir).map_err(DiagramError::io(dir))?;
        }

        let mut rendered = Vec::new();
        for md_path in self.sources()? {
            let name = md_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            rendered.push(self.render_source(&name, &md_path)?);
        }
        Ok(rendered)
    }

    /// Render `<source_dir>/<name>.md`.
    pub fn render_one(&self, name: &str) -> Result<PathBuf> {
        let md_path = self.layout.markdown_path(name);
        if !md_path.is_file() {
            return Err(DiagramError::MarkdownNotFound(md_path));
        }
        self.render_source(name, &md_path)
    }

    /// Remove all generated output.
    pub fn clean(&self) -> Result<()> {
        info!("cleaning generated diagrams");
        for dir in [&self.layout.mmd_dir, &self.layout.image_dir] {
            match std::fs::remove_dir_all(dir) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(DiagramError::io(dir)(e)),
            }
        }
        Ok(())
    }

    fn render_source(&self, name: &str, md_path: &Path) -> Result<PathBuf> {
        let mmd_path = self.layout.mmd_path(name);
        let image_path = self.layout.image_path(name);
        info!(source = %md_path.display(), "extracting diagram");

        extract_file(md_path, &mmd_path)?;
        if let Some(parent) = image_path.parent() {
            std::fs::create_dir_all(parent).map_err(DiagramError::io(parent))?;
        }
        self.invoke(&mmd_path, &image_path)
            .map_err(|source| DiagramError::Render {
                diagram: name.to_string(),
                source,
            })?;

        info!(output = %image_path.display(), "generated");
        Ok(image_path)
    }

    fn invoke(&self, input: &Path, output: &Path) -> wikideps_core::Result<()> {
        let spec = CommandSpec::new("mmdc")
            .arg("-i")
            .arg(input.display().to_string())
            .arg("-o")
            .arg(output.display().to_string())
            .arg("--configFile")
            .arg(self.layout.mermaid_config.display().to_string())
            .arg("--puppeteerConfigFile")
            .arg(self.layout.puppeteer_config.display().to_string())
            .args(["--backgroundColor", self.layout.background.as_str()])
            .streamed();
        run_checked(self.runner.as_ref(), &spec)?;
        Ok(())
    }
}

fn collect_markdown(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(DiagramError::io(dir))?;
    for entry in entries {
        let entry = entry.map_err(DiagramError::io(dir))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(DiagramError::io(&path))?;
        if file_type.is_dir() {
            collect_markdown(&path, found)?;
        } else if path.extension().is_some_and(|ext| ext == "md") {
            found.push(path);
        }
    }
    Ok(())
}
