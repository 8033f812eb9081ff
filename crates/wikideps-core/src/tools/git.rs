//! Git availability, commit identity and repository details
//!
//! Git is never installed by us. `ensure` only verifies the binary and
//! reports whether a commit identity is configured.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::DepsError;
use crate::exec::{CommandRunner, CommandSpec};
use crate::resource::Dependency;
use crate::Result;

/// Global `user.name` / `user.email`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitIdentity {
    pub name: String,
    pub email: String,
}

impl std::fmt::Display for GitIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Snapshot of the current repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoInfo {
    pub branch: String,
    pub remote: String,
    pub last_commit: String,
    pub checked_at: DateTime<Utc>,
}

pub struct GitClient {
    runner: Arc<dyn CommandRunner>,
}

impl GitClient {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        GitClient { runner }
    }

    /// stdout of a git command, empty when it fails
    fn query(&self, args: &[&str]) -> String {
        let spec = CommandSpec::new("git").args(args.iter().copied());
        match self.runner.run(&spec) {
            Ok(output) if output.success() => output.stdout_trimmed().to_string(),
            _ => String::new(),
        }
    }

    /// `git --version` output
    pub fn version(&self) -> Result<String> {
        match self.runner.run(&CommandSpec::new("git").arg("--version")) {
            Ok(output) if output.success() => Ok(output.combined()),
            Ok(output) => Err(DepsError::NotInstalled {
                tool: "git".to_string(),
                hint: output.combined(),
            }),
            Err(e) => Err(DepsError::NotInstalled {
                tool: "git".to_string(),
                hint: e.to_string(),
            }),
        }
    }

    /// Configured identity, if both halves are set
    pub fn identity(&self) -> Option<GitIdentity> {
        let name = self.query(&["config", "--global", "user.name"]);
        let email = self.query(&["config", "--global", "user.email"]);
        if name.is_empty() || email.is_empty() {
            return None;
        }
        Some(GitIdentity { name, email })
    }

    /// Log the identity, or how to set one. Never fails.
    pub fn report_identity(&self) -> Option<GitIdentity> {
        let identity = self.identity();
        match &identity {
            Some(id) => info!(identity = %id, "git user configured"),
            None => warn!(
                "git user.name or user.email is not configured; to set globally, run: \
                 git config --global user.name \"Your Name\" && \
                 git config --global user.email \"you@example.com\""
            ),
        }
        identity
    }

    /// Branch, origin URL and last commit of the working directory's repo
    pub fn repo_info(&self) -> RepoInfo {
        RepoInfo {
            branch: self.query(&["rev-parse", "--abbrev-ref", "HEAD"]),
            remote: self.query(&["config", "--get", "remote.origin.url"]),
            last_commit: self.query(&["log", "-1", "--pretty=format:%h - %s (%cr)"]),
            checked_at: Utc::now(),
        }
    }

    /// Confirm `origin` answers; returns the size of the ref listing.
    pub fn check_remote(&self) -> Result<usize> {
        let spec = CommandSpec::new("git").args(["ls-remote", "--heads", "origin"]);
        let unreachable = |reason: String| DepsError::Unreachable {
            tool: "git remote origin".to_string(),
            reason,
        };
        match self.runner.run(&spec) {
            Ok(output) if output.success() => {
                info!(bytes = output.stdout.len(), "git remote accessible");
                Ok(output.stdout.len())
            }
            Ok(output) => Err(unreachable(output.combined())),
            Err(e) => Err(unreachable(e.to_string())),
        }
    }
}

impl Dependency for GitClient {
    fn verify(&self) -> Result<()> {
        let version = self.version()?;
        info!(version = %version, "git available");
        Ok(())
    }

    fn ensure(&self) -> Result<()> {
        self.verify()?;
        self.report_identity();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::CommandOutput;
    use crate::fakes::ScriptedRunner;

    #[test]
    fn test_missing_identity_does_not_fail_ensure() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.succeed("git --version", "git version 2.43.0\n");
        runner.succeed("git config --global user.name", "Ada\n");
        runner.respond("git config --global user.email", CommandOutput::failed(1, ""));

        let git = GitClient::new(runner);
        assert!(git.identity().is_none());
        git.ensure().unwrap();
    }

    #[test]
    fn test_identity_display() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.succeed("git config --global user.name", "Ada Lovelace\n");
        runner.succeed("git config --global user.email", "ada@example.com\n");

        let identity = GitClient::new(runner).identity().unwrap();
        assert_eq!(identity.to_string(), "Ada Lovelace <ada@example.com>");
    }

    #[test]
    fn test_verify_without_git() {
        let err = GitClient::new(Arc::new(ScriptedRunner::new())).verify().unwrap_err();
        assert!(matches!(err, DepsError::NotInstalled { ref tool, .. } if tool == "git"));
    }

    #[test]
    fn test_repo_info_and_remote() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.succeed("git rev-parse --abbrev-ref HEAD", "main\n");
        runner.succeed(
            "git config --get remote.origin.url",
            "git@github.com:stevedores-org/wiki-diagrams.git\n",
        );
        runner.succeed(
            "git log -1 --pretty=format:%h - %s (%cr)",
            "a1b2c3d - Add sequence diagram (2 hours ago)",
        );
        runner.respond(
            "git ls-remote --heads origin",
            CommandOutput::failed(128, "fatal: Could not read from remote repository."),
        );

        let git = GitClient::new(runner);
        let info = git.repo_info();
        assert_eq!(info.branch, "main");
        assert!(info.remote.ends_with("wiki-diagrams.git"));
        assert!(info.last_commit.starts_with("a1b2c3d"));

        let err = git.check_remote().unwrap_err();
        assert!(
            matches!(err, DepsError::Unreachable { ref reason, .. } if reason.contains("Could not read"))
        );
    }
}
