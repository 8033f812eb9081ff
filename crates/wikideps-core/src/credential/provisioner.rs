//! Publishing a local key as a cluster-wide secret

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::SecretArtifact;
use crate::error::DepsError;
use crate::exec::{CommandRunner, CommandSpec};
use crate::Result;

/// Successful secret creation outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretCreate {
    Created,
    AlreadyExists,
}

/// Cluster membership and secret store
pub trait ClusterControl: Send + Sync {
    /// Live query: is this host a controlling node of an active cluster?
    fn is_controlling_node(&self) -> bool;

    /// Create a named secret from a file. "Already exists" is not an error.
    fn create_secret(&self, name: &str, path: &Path) -> Result<SecretCreate>;
}

/// Docker Swarm via the `docker` CLI
pub struct DockerSwarm {
    runner: Arc<dyn CommandRunner>,
}

impl DockerSwarm {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        DockerSwarm { runner }
    }
}

impl ClusterControl for DockerSwarm {
    fn is_controlling_node(&self) -> bool {
        let spec =
            CommandSpec::new("docker").args(["info", "--format", "{{.Swarm.ControlAvailable}}"]);
        match self.runner.run(&spec) {
            Ok(output) => output.success() && output.stdout_trimmed() == "true",
            Err(e) => {
                debug!(error = %e, "docker info failed, assuming no swarm");
                false
            }
        }
    }

    fn create_secret(&self, name: &str, path: &Path) -> Result<SecretCreate> {
        let spec = CommandSpec::new("docker")
            .args(["secret", "create", name])
            .arg(path.display().to_string());

        let output = self.runner.run(&spec).map_err(|e| DepsError::ProvisionFailed {
            secret: name.to_string(),
            reason: e.to_string(),
        })?;

        if output.success() {
            return Ok(SecretCreate::Created);
        }
        if output.combined().contains("already exists") {
            return Ok(SecretCreate::AlreadyExists);
        }
        Err(DepsError::ProvisionFailed {
            secret: name.to_string(),
            reason: output.combined(),
        })
    }
}

/// What [`SecretProvisioner::provision`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionOutcome {
    /// The key is already mounted from the cluster
    MountPresent,
    /// Not a controlling node; the local key is used directly
    SkippedNotController,
    Created,
    AlreadyPublished,
}

/// Idempotently publishes a local key to the cluster secret store
pub struct SecretProvisioner {
    cluster: Arc<dyn ClusterControl>,
    secret_name: String,
    mount_path: PathBuf,
}

impl SecretProvisioner {
    pub fn new(
        cluster: Arc<dyn ClusterControl>,
        secret_name: impl Into<String>,
        mount_path: impl Into<PathBuf>,
    ) -> Self {
        SecretProvisioner {
            cluster,
            secret_name: secret_name.into(),
            mount_path: mount_path.into(),
        }
    }

    pub fn provision(&self, artifact: &SecretArtifact) -> Result<ProvisionOutcome> {
        if artifact.is_cluster_mount() || self.mount_path.exists() {
            info!(path = %self.mount_path.display(), "GitHub App key available via Docker secret");
            return Ok(ProvisionOutcome::MountPresent);
        }

        if !self.cluster.is_controlling_node() {
            info!("running in non-swarm mode, using local key directly");
            return Ok(ProvisionOutcome::SkippedNotController);
        }

        info!(secret = %self.secret_name, "swarm mode detected, creating Docker secret");
        let created = self
            .cluster
            .create_secret(&self.secret_name, &artifact.path)
            .map_err(|e| match e {
                e @ DepsError::ProvisionFailed { .. } => e,
                other => DepsError::ProvisionFailed {
                    secret: self.secret_name.clone(),
                    reason: other.to_string(),
                },
            })?;

        match created {
            SecretCreate::Created => {
                info!(secret = %self.secret_name, "Docker secret created");
                Ok(ProvisionOutcome::Created)
            }
            SecretCreate::AlreadyExists => {
                info!(
                    secret = %self.secret_name,
                    "Docker secret already exists, skipping creation"
                );
                Ok(ProvisionOutcome::AlreadyPublished)
            }
        }
    }
}
