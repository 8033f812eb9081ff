//! wikideps-core: toolchain verification and self-healing for Wiki-Diagrams
//!
//! This crate keeps the external tools the diagram pipeline relies on in a
//! known-good state, and resolves the GitHub App key used for publishing.
//!
//! ## Layers
//!
//! - [`exec`] / [`fetch`]: narrow process and HTTP capabilities (faked in tests)
//! - [`pin`]: pinned versions and best-effort drift notices
//! - [`resource`]: the `verify` / `ensure` contract and [`SelfHealing`]
//! - [`tools`]: Go, Mermaid CLI (+ system libraries), Docker, Git
//! - [`credential`]: app key resolution and cluster secret provisioning
//! - [`orchestrator`] / [`plans`]: fail-fast sequencing of named steps
//!
//! Everything runs synchronously, one step at a time.

pub mod config;
pub mod credential;
pub mod error;
pub mod exec;
pub mod fakes;
pub mod fetch;
pub mod integrity;
pub mod obs;
pub mod orchestrator;
pub mod pin;
pub mod plans;
pub mod platform;
pub mod resource;
pub mod telemetry;
pub mod toolbox;
pub mod tools;

pub use config::{DepsConfig, TARGET_GO_VERSION, TARGET_MERMAID_VERSION};
pub use credential::{
    AppKeyDependency, ClusterControl, CredentialResolver, CredentialSource, DockerSwarm,
    Environment, KeyLocations, ProcessEnv, ProvisionOutcome, SecretArtifact, SecretCreate,
    SecretProvisioner,
};
pub use error::{CredentialError, DepsError, FailureKind};
pub use exec::{run_checked, CommandOutput, CommandRunner, CommandSpec, SystemRunner};
pub use fetch::{Fetcher, HttpFetcher};
pub use integrity::{sha256_file, sha256_hex, verify_checksum, ChecksumOutcome};
pub use orchestrator::{DependencyStep, Mode, Orchestrator, RunReport, StepAction, StepOutcome};
pub use pin::{check_drift, DriftStatus, LatestFormat, LatestSource, VersionPin};
pub use platform::Platform;
pub use resource::{Dependency, Resource, ResourceState, SelfHealing};
pub use telemetry::init_tracing;
pub use toolbox::Toolbox;
pub use tools::{
    DockerEngine, GitClient, GitIdentity, GoToolchain, MermaidCli, RendererDependency, RepoInfo,
    SystemLibraries,
};

/// Result type for wikideps-core operations
pub type Result<T> = std::result::Result<T, DepsError>;
