//! Mermaid CLI (`mmdc`) and the renderer step that bundles its system libraries

use std::sync::Arc;

use tracing::{debug, info};

use super::syslibs::SystemLibraries;
use crate::error::DepsError;
use crate::exec::{run_checked, CommandRunner, CommandSpec};
use crate::pin::VersionPin;
use crate::resource::{Dependency, Resource, SelfHealing};
use crate::Result;

/// npm package providing `mmdc`
pub const MERMAID_PACKAGE: &str = "@mermaid-js/mermaid-cli";

/// npm registry document for the newest published release
pub const MERMAID_LATEST_URL: &str = "https://registry.npmjs.org/@mermaid-js/mermaid-cli/latest";

/// Mermaid CLI installed globally through npm
pub struct MermaidCli {
    pin: VersionPin,
    runner: Arc<dyn CommandRunner>,
}

impl MermaidCli {
    pub fn new(pin: VersionPin, runner: Arc<dyn CommandRunner>) -> Self {
        MermaidCli { pin, runner }
    }

    fn not_installed(&self) -> DepsError {
        DepsError::NotInstalled {
            tool: self.pin.tool.clone(),
            hint: format!(
                "install it with: npm install -g {MERMAID_PACKAGE}@{}",
                self.pin.pinned
            ),
        }
    }

    /// Raw `mmdc --version` output, trimmed
    pub fn installed_version(&self) -> Result<String> {
        match self.runner.run(&CommandSpec::new("mmdc").arg("--version")) {
            Ok(output) if output.success() => Ok(output.combined()),
            _ => Err(self.not_installed()),
        }
    }
}

impl Resource for MermaidCli {
    fn name(&self) -> &str {
        &self.pin.tool
    }

    fn pin(&self) -> Option<&VersionPin> {
        Some(&self.pin)
    }

    /// `mmdc` prints more than a bare version on some releases, so the pin
    /// only has to appear in the output.
    fn check(&self) -> Result<()> {
        debug!(target_version = %self.pin.pinned, "verifying Mermaid CLI installation");
        let found = self.installed_version()?;
        if !self.pin.contains_pin(&found) {
            return Err(self.pin.mismatch(found));
        }
        Ok(())
    }

    fn install(&self) -> Result<()> {
        info!(version = %self.pin.pinned, "installing Mermaid CLI globally via npm");
        run_checked(
            self.runner.as_ref(),
            &CommandSpec::new("npm")
                .args(["install", "-g"])
                .arg(format!("{MERMAID_PACKAGE}@{}", self.pin.pinned))
                .streamed(),
        )?;
        Ok(())
    }
}

/// Everything `mmdc` needs to render: Chromium's shared libraries, then the CLI
pub struct RendererDependency {
    libs: SystemLibraries,
    cli: SelfHealing<MermaidCli>,
}

impl RendererDependency {
    pub fn new(libs: SystemLibraries, cli: SelfHealing<MermaidCli>) -> Self {
        RendererDependency { libs, cli }
    }

    pub fn cli(&self) -> &SelfHealing<MermaidCli> {
        &self.cli
    }

    pub fn libraries(&self) -> &SystemLibraries {
        &self.libs
    }
}

impl Dependency for RendererDependency {
    fn verify(&self) -> Result<()> {
        self.cli.verify()
    }

    fn ensure(&self) -> Result<()> {
        self.libs
            .ensure_present()
            .map_err(|e| DepsError::InstallFailed {
                tool: "system libraries".to_string(),
                source: Box::new(e),
            })?;
        self.cli.ensure()
    }
}
