//! Go toolchain: version check and tarball installer

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::DepsError;
use crate::exec::{run_checked, CommandRunner, CommandSpec};
use crate::fetch::Fetcher;
use crate::integrity::{verify_checksum, ChecksumOutcome};
use crate::pin::VersionPin;
use crate::platform::Platform;
use crate::resource::Resource;
use crate::Result;

/// Official download location for Go release archives
pub const GO_DOWNLOAD_BASE: &str = "https://go.dev/dl";

/// Extract the version from `go version` output.
///
/// `go version go1.25.3 linux/amd64` -> `1.25.3`
pub fn parse_go_version(output: &str) -> Option<String> {
    let token = output.split_whitespace().nth(2)?;
    Some(token.strip_prefix("go").unwrap_or(token).to_string())
}

/// The Go toolchain, installed under `<install_root>/go`
pub struct GoToolchain {
    pin: VersionPin,
    runner: Arc<dyn CommandRunner>,
    fetcher: Arc<dyn Fetcher>,
    platform: Platform,
    install_root: PathBuf,
    staging_dir: PathBuf,
}

impl GoToolchain {
    pub fn new(pin: VersionPin, runner: Arc<dyn CommandRunner>, fetcher: Arc<dyn Fetcher>) -> Self {
        GoToolchain {
            pin,
            runner,
            fetcher,
            platform: Platform::current(),
            install_root: PathBuf::from("/usr/local"),
            staging_dir: std::env::temp_dir(),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_install_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.install_root = root.into();
        self
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    /// Version reported by the `go` found on the search path
    pub fn installed_version(&self) -> Result<String> {
        let output = match self.runner.run(&CommandSpec::new("go").arg("version")) {
            Ok(output) if output.success() => output,
            _ => {
                return Err(DepsError::NotInstalled {
                    tool: self.pin.tool.clone(),
                    hint: "go binary not found in PATH".to_string(),
                })
            }
        };

        parse_go_version(&output.stdout).ok_or_else(|| DepsError::UnexpectedOutput {
            tool: "go version".to_string(),
            output: output.stdout_trimmed().to_string(),
        })
    }

    /// Release archive name for a platform
    pub fn archive_name(&self, os: &str, arch: &str) -> String {
        format!("go{}.{os}-{arch}.tar.gz", self.pin.pinned)
    }

    /// Directory the archive unpacks into
    pub fn go_root(&self) -> PathBuf {
        self.install_root.join("go")
    }

    fn confirm_identity(&self) -> Result<()> {
        let go_bin = self.go_root().join("bin").join("go");
        let output = run_checked(
            self.runner.as_ref(),
            &CommandSpec::new(go_bin.display().to_string()).arg("version"),
        )?;

        match parse_go_version(&output.stdout) {
            Some(version) if self.pin.matches(&version) => Ok(()),
            Some(version) => Err(self.pin.mismatch(version)),
            None => Err(DepsError::UnexpectedOutput {
                tool: go_bin.display().to_string(),
                output: output.stdout_trimmed().to_string(),
            }),
        }
    }

    fn download_and_unpack(&self, url: &str, staged: &Path) -> Result<()> {
        self.fetcher.download(url, staged)?;

        if let ChecksumOutcome::Unverifiable { reason } =
            verify_checksum(self.fetcher.as_ref(), &format!("{url}.sha256"), staged)?
        {
            debug!(reason = %reason, "proceeding without checksum");
        }

        let root = self.install_root.display().to_string();
        info!(root = %root, "extracting Go (requires sudo)");
        run_checked(
            self.runner.as_ref(),
            &CommandSpec::new("sudo")
                .args(["rm", "-rf"])
                .arg(self.go_root().display().to_string())
                .streamed(),
        )?;
        run_checked(
            self.runner.as_ref(),
            &CommandSpec::new("sudo")
                .args(["tar", "-C"])
                .arg(root)
                .arg("-xzf")
                .arg(staged.display().to_string())
                .streamed(),
        )?;
        Ok(())
    }
}

impl Resource for GoToolchain {
    fn name(&self) -> &str {
        &self.pin.tool
    }

    fn pin(&self) -> Option<&VersionPin> {
        Some(&self.pin)
    }

    fn check(&self) -> Result<()> {
        debug!(target_version = %self.pin.pinned, "verifying Go installation");
        let current = self.installed_version()?;
        if !self.pin.matches(&current) {
            return Err(self.pin.mismatch(current));
        }
        Ok(())
    }

    fn install(&self) -> Result<()> {
        let (os, arch) = self.platform.go_target()?;
        let archive = self.archive_name(os, arch);
        let url = format!("{GO_DOWNLOAD_BASE}/{archive}");
        let staged = self.staging_dir.join(&archive);

        info!(version = %self.pin.pinned, os, arch, "downloading Go");
        let unpacked = self.download_and_unpack(&url, &staged);
        if let Err(e) = std::fs::remove_file(&staged) {
            debug!(path = %staged.display(), error = %e, "could not remove staged archive");
        }
        unpacked?;

        self.confirm_identity()?;

        if self.runner.locate("go").is_none() {
            warn!(
                bin = %self.go_root().join("bin").display(),
                "go is not on PATH, you may need to update your shell configuration"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_go_version() {
        assert_eq!(
            parse_go_version("go version go1.25.3 linux/amd64\n"),
            Some("1.25.3".to_string())
        );
        assert_eq!(
            parse_go_version("go version go1.26rc1 darwin/arm64"),
            Some("1.26rc1".to_string())
        );
        assert_eq!(parse_go_version("go version"), None);
        assert_eq!(parse_go_version(""), None);
    }
}
