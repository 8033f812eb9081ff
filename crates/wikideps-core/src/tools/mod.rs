//! Per-tool resources
//!
//! Each tool is an independent module implementing [`crate::Resource`] or
//! [`crate::Dependency`]; the orchestrator composes them by step name.

pub mod docker;
pub mod git;
pub mod go;
pub mod mermaid;
pub mod syslibs;

pub use docker::DockerEngine;
pub use git::{GitClient, GitIdentity, RepoInfo};
pub use go::GoToolchain;
pub use mermaid::{MermaidCli, RendererDependency};
pub use syslibs::SystemLibraries;
