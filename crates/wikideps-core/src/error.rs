//! Error types for wikideps-core

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::credential::CredentialSource;

/// Errors raised while resolving the GitHub App private key
#[derive(Error, Debug)]
pub enum CredentialError {
    /// The override variable is set but names a path that does not exist
    #[error("{var} is set but no key exists at {}", .path.display())]
    EnvPathMissing { var: String, path: PathBuf },

    /// No source produced a key
    #[error("no GitHub App key found, expected one of: {}", render_sources(.attempted))]
    NotFound { attempted: Vec<CredentialSource> },

    /// A key was selected but cannot be opened
    #[error("GitHub App key found at {} ({origin}) but unreadable: {reason}", .path.display())]
    Unreadable {
        path: PathBuf,
        origin: String,
        reason: String,
    },

    /// The local key directory could not be listed
    #[error("error searching for GitHub App key in {}: {reason}", .dir.display())]
    Search { dir: PathBuf, reason: String },
}

fn render_sources(sources: &[CredentialSource]) -> String {
    sources
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur while verifying or installing dependencies
#[derive(Error, Debug)]
pub enum DepsError {
    /// Binary not found (or not runnable)
    #[error("{tool} not found in PATH: {hint}")]
    NotInstalled { tool: String, hint: String },

    /// Installed version differs from the pin
    #[error("{tool} version mismatch: found '{found}', expected {expected}")]
    VersionMismatch {
        tool: String,
        found: String,
        expected: String,
    },

    /// Daemon or service not responding
    #[error("{tool} not reachable: {reason}")]
    Unreachable { tool: String, reason: String },

    /// A version command printed something we cannot parse
    #[error("unexpected output from {tool}: {output}")]
    UnexpectedOutput { tool: String, output: String },

    /// Host OS/architecture outside the supported set
    #[error("unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    /// A published digest exists and does not match the download
    #[error("checksum verification failed for {artifact}: expected {expected}, got {actual}")]
    IntegrityCheckFailed {
        artifact: String,
        expected: String,
        actual: String,
    },

    /// Installer failed; wraps the underlying cause
    #[error("failed to install {tool}")]
    InstallFailed {
        tool: String,
        #[source]
        source: Box<DepsError>,
    },

    /// Installer finished but the follow-up verification failed
    #[error("{tool} installation did not verify successfully")]
    NotHealed {
        tool: String,
        #[source]
        source: Box<DepsError>,
    },

    /// External command exited unsuccessfully
    #[error("command `{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// HTTP download failed
    #[error("download of {url} failed: {reason}")]
    Download { url: String, reason: String },

    /// App key resolution failed
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// The cluster secret store rejected the key for a reason other than "already exists"
    #[error("failed to create secret {secret}: {reason}")]
    ProvisionFailed { secret: String, reason: String },

    /// A named orchestrator step failed
    #[error("{step} failed")]
    StepFailed {
        step: String,
        #[source]
        source: Box<DepsError>,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

/// Coarse failure category, stable for machine-readable reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotInstalled,
    VersionMismatch,
    Unreachable,
    UnsupportedPlatform,
    IntegrityCheckFailed,
    InstallFailed,
    CredentialNotFound,
    CredentialUnreadable,
    ProvisionFailed,
    Other,
}

impl DepsError {
    /// Classify the error, looking through step wrappers.
    pub fn kind(&self) -> FailureKind {
        match self {
            DepsError::NotInstalled { .. } => FailureKind::NotInstalled,
            DepsError::VersionMismatch { .. } => FailureKind::VersionMismatch,
            DepsError::Unreachable { .. } => FailureKind::Unreachable,
            DepsError::UnsupportedPlatform { .. } => FailureKind::UnsupportedPlatform,
            DepsError::IntegrityCheckFailed { .. } => FailureKind::IntegrityCheckFailed,
            DepsError::InstallFailed { .. } | DepsError::NotHealed { .. } => {
                FailureKind::InstallFailed
            }
            DepsError::Credential(CredentialError::Unreadable { .. }) => {
                FailureKind::CredentialUnreadable
            }
            DepsError::Credential(_) => FailureKind::CredentialNotFound,
            DepsError::ProvisionFailed { .. } => FailureKind::ProvisionFailed,
            DepsError::StepFailed { source, .. } => source.kind(),
            DepsError::UnexpectedOutput { .. }
            | DepsError::CommandFailed { .. }
            | DepsError::Download { .. }
            | DepsError::Io(_)
            | DepsError::Config(_) => FailureKind::Other,
        }
    }

    /// Innermost cause, skipping step and install wrappers.
    pub fn root_cause(&self) -> &DepsError {
        match self {
            DepsError::InstallFailed { source, .. }
            | DepsError::NotHealed { source, .. }
            | DepsError::StepFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
