//! GitHub App private key: resolution and cluster provisioning
//!
//! The key can come from three places, tried in a fixed order:
//!
//! 1. an override environment variable naming a file
//! 2. a Docker Swarm secret mount
//! 3. the newest `wiki-diagram-publisher*.pem` in `~/.config/github-apps`
//!
//! A higher source always shadows lower ones, even when it turns out to be
//! broken. Nothing is cached: every call re-reads the environment and disk.

mod provisioner;
mod resolver;

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::resource::Dependency;
use crate::Result;

pub use provisioner::{
    ClusterControl, DockerSwarm, ProvisionOutcome, SecretCreate, SecretProvisioner,
};
pub use resolver::CredentialResolver;

/// Where to look for the key, and what to call it in the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyLocations {
    /// Override variable naming a key file
    pub env_var: String,
    /// Well-known cluster secret mount
    pub mount_path: PathBuf,
    /// Local directory searched for key files
    pub search_dir: PathBuf,
    /// Required filename prefix
    pub file_prefix: String,
    /// Required filename suffix
    pub file_suffix: String,
    /// Name of the cluster-wide secret
    pub secret_name: String,
}

impl Default for KeyLocations {
    fn default() -> Self {
        let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_default();
        KeyLocations {
            env_var: "WIKI_APP_PRIVATE_KEY_PATH".to_string(),
            mount_path: PathBuf::from("/run/secrets/wiki_diagram_app_key"),
            search_dir: home.join(".config").join("github-apps"),
            file_prefix: "wiki-diagram-publisher".to_string(),
            file_suffix: ".pem".to_string(),
            secret_name: "wiki_diagram_app_key".to_string(),
        }
    }
}

impl KeyLocations {
    /// Human-readable glob for the local search
    pub fn local_pattern(&self) -> PathBuf {
        self.search_dir
            .join(format!("{}*{}", self.file_prefix, self.file_suffix))
    }
}

/// Read access to environment variables
pub trait Environment: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// One place a key may come from, in precedence order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "location", rename_all = "snake_case")]
pub enum CredentialSource {
    /// Variable name
    EnvOverride(String),
    /// Mount path
    ClusterSecretMount(PathBuf),
    /// Glob pattern
    LocalFileGlob(PathBuf),
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::EnvOverride(var) => write!(f, "env var: {var}"),
            CredentialSource::ClusterSecretMount(path) => {
                write!(f, "Docker secret: {}", path.display())
            }
            CredentialSource::LocalFileGlob(pattern) => {
                write!(f, "local file: {}", pattern.display())
            }
        }
    }
}

/// A resolved key file and where it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretArtifact {
    pub path: PathBuf,
    pub origin: CredentialSource,
}

impl SecretArtifact {
    pub fn is_cluster_mount(&self) -> bool {
        matches!(self.origin, CredentialSource::ClusterSecretMount(_))
    }
}

/// Orchestrator step for the app key: resolve, publish, resolve again
pub struct AppKeyDependency {
    resolver: CredentialResolver,
    provisioner: SecretProvisioner,
}

impl AppKeyDependency {
    pub fn new(resolver: CredentialResolver, provisioner: SecretProvisioner) -> Self {
        AppKeyDependency {
            resolver,
            provisioner,
        }
    }
}

impl Dependency for AppKeyDependency {
    fn verify(&self) -> Result<()> {
        self.resolver.resolve()?;
        Ok(())
    }

    fn ensure(&self) -> Result<()> {
        let artifact = self.resolver.resolve()?;
        self.provisioner.provision(&artifact)?;
        self.verify()
    }
}
