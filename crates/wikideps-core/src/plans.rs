//! The two step plans the CLI runs

use crate::orchestrator::{DependencyStep, Orchestrator};
use crate::toolbox::Toolbox;

pub const GO_STEP: &str = "Go toolchain";
pub const MERMAID_STEP: &str = "Mermaid CLI";
pub const GIT_STEP: &str = "Git configuration";
pub const DOCKER_STEP: &str = "Docker Engine & Buildx";
pub const APP_KEY_STEP: &str = "GitHub App Private Key";

/// Toolchain, then renderer, then version control.
///
/// Later steps may assume earlier ones succeeded, so the order is fixed.
/// Go installs into a system directory and is the only privileged step.
pub fn wiki_diagrams(tools: &Toolbox) -> Orchestrator {
    Orchestrator::new("wiki-diagrams")
        .step(DependencyStep::new(GO_STEP, tools.go()).privileged())
        .step(DependencyStep::new(MERMAID_STEP, tools.renderer()))
        .step(DependencyStep::new(GIT_STEP, tools.git()))
}

/// Container engine, then the publishing key
pub fn container(tools: &Toolbox) -> Orchestrator {
    Orchestrator::new("container")
        .step(DependencyStep::new(DOCKER_STEP, tools.docker()).privileged())
        .step(DependencyStep::new(APP_KEY_STEP, tools.app_key()))
}
