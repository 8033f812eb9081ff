//! Render pipeline over a temporary asset tree with a scripted `mmdc`.

use std::path::Path;
use std::sync::Arc;

use tempfile::tempdir;
use wikideps_core::fakes::ScriptedRunner;
use wikideps_core::CommandOutput;
use wikideps_diagrams::{DiagramError, DiagramLayout, Renderer};

fn mmdc_line(layout: &DiagramLayout, name: &str) -> String {
    format!(
        "mmdc -i {} -o {} --configFile {} --puppeteerConfigFile {} --backgroundColor #1B1B2F",
        layout.mmd_path(name).display(),
        layout.image_path(name).display(),
        layout.mermaid_config.display(),
        layout.puppeteer_config.display(),
    )
}

fn write(path: &Path, body: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, body).unwrap();
}

#[test]
fn render_all_walks_sources_in_order() {
    let root = tempdir().unwrap();
    let layout = DiagramLayout::default().rooted(root.path());
    write(
        &layout.source_dir.join("zeta.md"),
        "# Z\n```mermaid\ngraph TD\n  Z --> Y\n```\n",
    );
    write(
        &layout.source_dir.join("nested/alpha.md"),
        "```mermaid\nsequenceDiagram\n  A->>B: hi\n```\n",
    );
    write(&layout.source_dir.join("notes.txt"), "```mermaid\nignored\n```\n");

    let runner = Arc::new(ScriptedRunner::new());
    runner.succeed(mmdc_line(&layout, "alpha"), "");
    runner.succeed(mmdc_line(&layout, "zeta"), "");

    let renderer = Renderer::new(layout.clone(), runner.clone());
    let rendered = renderer.render_all().unwrap();

    assert_eq!(
        rendered,
        vec![layout.image_path("alpha"), layout.image_path("zeta")]
    );
    assert_eq!(
        std::fs::read_to_string(layout.mmd_path("zeta")).unwrap(),
        "graph TD\n  Z --> Y"
    );
    assert_eq!(
        runner.calls(),
        vec![mmdc_line(&layout, "alpha"), mmdc_line(&layout, "zeta")]
    );
}

#[test]
fn render_all_stops_on_document_without_diagram() {
    let root = tempdir().unwrap();
    let layout = DiagramLayout::default().rooted(root.path());
    write(&layout.source_dir.join("a.md"), "just prose\n");
    write(&layout.source_dir.join("b.md"), "```mermaid\ngraph TD\n```\n");

    let runner = Arc::new(ScriptedRunner::new());
    let err = Renderer::new(layout, runner.clone()).render_all().unwrap_err();

    assert!(matches!(err, DiagramError::NoMermaidBlock(ref p) if p.ends_with("a.md")));
    assert!(runner.calls().is_empty());
}

#[test]
fn render_one_requires_markdown() {
    let root = tempdir().unwrap();
    let layout = DiagramLayout::default().rooted(root.path());
    let renderer = Renderer::new(layout, Arc::new(ScriptedRunner::new()));

    let err = renderer.render_one("missing").unwrap_err();
    assert!(matches!(err, DiagramError::MarkdownNotFound(ref p) if p.ends_with("missing.md")));
}

#[test]
fn renderer_failure_names_the_diagram() {
    let root = tempdir().unwrap();
    let layout = DiagramLayout::default().rooted(root.path());
    write(&layout.source_dir.join("flow.md"), "```mermaid\ngraph TD\n```\n");

    let runner = Arc::new(ScriptedRunner::new());
    runner.respond(
        mmdc_line(&layout, "flow"),
        CommandOutput::failed(1, "Error: Failed to launch the browser process!"),
    );

    let err = Renderer::new(layout.clone(), runner)
        .render_one("flow")
        .unwrap_err();

    assert!(matches!(err, DiagramError::Render { ref diagram, .. } if diagram == "flow"));
    // the intermediate is still written
    assert!(layout.mmd_path("flow").is_file());
}

#[test]
fn clean_removes_generated_output_only() {
    let root = tempdir().unwrap();
    let layout = DiagramLayout::default().rooted(root.path());
    let source = layout.source_dir.join("flow.md");
    write(&source, "```mermaid\ngraph TD\n```\n");
    write(&layout.mmd_path("flow"), "graph TD");
    write(&layout.image_path("flow"), "png");

    let renderer = Renderer::new(layout.clone(), Arc::new(ScriptedRunner::new()));
    renderer.clean().unwrap();
    renderer.clean().unwrap();

    assert!(!layout.mmd_dir.exists());
    assert!(!layout.image_dir.exists());
    assert!(source.is_file());
}
