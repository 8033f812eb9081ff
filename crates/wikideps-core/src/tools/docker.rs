//! Docker Engine and the Buildx plugin

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::DepsError;
use crate::exec::{run_checked, CommandRunner, CommandSpec};
use crate::resource::Resource;
use crate::Result;

/// Docker Engine apt repository bootstrap, run only when `docker` is absent
const ENGINE_BOOTSTRAP: &[&[&str]] = &[
    &["sudo", "apt-get", "update", "-y"],
    &["sudo", "apt-get", "install", "-y", "ca-certificates", "curl", "gnupg"],
    &["sudo", "install", "-m", "0755", "-d", "/etc/apt/keyrings"],
    &[
        "bash",
        "-c",
        "curl -fsSL https://download.docker.com/linux/ubuntu/gpg | sudo gpg --dearmor -o /etc/apt/keyrings/docker.gpg",
    ],
    &[
        "bash",
        "-c",
        "echo \"deb [arch=$(dpkg --print-architecture) signed-by=/etc/apt/keyrings/docker.gpg] https://download.docker.com/linux/ubuntu $(. /etc/os-release && echo $VERSION_CODENAME) stable\" | sudo tee /etc/apt/sources.list.d/docker.list > /dev/null",
    ],
    &["sudo", "apt-get", "update", "-y"],
    &[
        "sudo",
        "apt-get",
        "install",
        "-y",
        "docker-ce",
        "docker-ce-cli",
        "containerd.io",
        "docker-buildx-plugin",
        "docker-compose-plugin",
    ],
];

/// Docker Engine with a reachable daemon and Buildx
pub struct DockerEngine {
    runner: Arc<dyn CommandRunner>,
}

impl DockerEngine {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        DockerEngine { runner }
    }

    /// Server version reported by the daemon
    pub fn server_version(&self) -> Result<String> {
        let spec = CommandSpec::new("docker").args(["version", "--format", "{{.Server.Version}}"]);
        match self.runner.run(&spec) {
            Ok(output) if output.success() => Ok(output.stdout_trimmed().to_string()),
            Ok(output) => Err(DepsError::Unreachable {
                tool: "docker daemon".to_string(),
                reason: output.combined(),
            }),
            Err(e) => Err(DepsError::Unreachable {
                tool: "docker daemon".to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn has_binary(&self) -> bool {
        self.runner.locate("docker").is_some()
    }

    fn has_buildx(&self) -> bool {
        let spec = CommandSpec::new("docker").args(["buildx", "version"]);
        matches!(self.runner.run(&spec), Ok(output) if output.success())
    }

    fn install_engine(&self) -> Result<()> {
        info!("installing Docker Engine from the official repository");
        for step in ENGINE_BOOTSTRAP {
            let (program, args) = step.split_first().ok_or_else(|| {
                DepsError::Config("empty Docker bootstrap command".to_string())
            })?;
            run_checked(
                self.runner.as_ref(),
                &CommandSpec::new(*program).args(args.iter().copied()).streamed(),
            )?;
        }
        info!("Docker Engine installed");
        Ok(())
    }
}

impl Resource for DockerEngine {
    fn name(&self) -> &str {
        "docker"
    }

    fn check(&self) -> Result<()> {
        if !self.has_binary() {
            return Err(DepsError::NotInstalled {
                tool: "docker".to_string(),
                hint: "please install Docker Engine".to_string(),
            });
        }

        let version = self.server_version()?;
        info!(version = %version, "Docker Engine detected");

        if !self.has_buildx() {
            return Err(DepsError::NotInstalled {
                tool: "docker buildx".to_string(),
                hint: "run: docker buildx install".to_string(),
            });
        }
        Ok(())
    }

    fn install(&self) -> Result<()> {
        if self.has_binary() {
            debug!("docker binary present, skipping engine install");
        } else {
            self.install_engine()?;
        }

        if !self.has_buildx() {
            info!("installing Docker Buildx plugin");
            run_checked(
                self.runner.as_ref(),
                &CommandSpec::new("docker").args(["buildx", "install"]).streamed(),
            )?;
        }
        Ok(())
    }
}
