//! The verify / ensure contract
//!
//! A [`Resource`] knows how to inspect and install one tool. [`SelfHealing`]
//! composes the two into a [`Dependency`]: `ensure` verifies, installs only
//! on failure, then verifies exactly once more. Nothing loops or retries.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::DepsError;
use crate::fetch::Fetcher;
use crate::pin::{check_drift, report_drift, VersionPin};
use crate::Result;

/// One installable tool
pub trait Resource: Send + Sync {
    /// Tool name used for logging and error attribution
    fn name(&self) -> &str;

    /// Inspect the environment. Must not change it.
    fn check(&self) -> Result<()>;

    /// Install the pinned version, replacing any existing copy.
    fn install(&self) -> Result<()>;

    /// Version pin, when the tool has one
    fn pin(&self) -> Option<&VersionPin> {
        None
    }
}

/// What the orchestrator drives for each named step
pub trait Dependency: Send + Sync {
    /// Side-effect-free check
    fn verify(&self) -> Result<()>;

    /// Verify, and self-heal if needed
    fn ensure(&self) -> Result<()>;
}

/// Transient state of a resource, computed from a fresh check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    Unknown,
    Verified,
    Missing,
    VersionMismatch,
    InstallFailed,
}

impl ResourceState {
    pub fn from_result(result: &Result<()>) -> Self {
        match result {
            Ok(()) => ResourceState::Verified,
            Err(err) => Self::from_error(err),
        }
    }

    fn from_error(err: &DepsError) -> Self {
        match err {
            DepsError::StepFailed { source, .. } => Self::from_error(source),
            DepsError::InstallFailed { .. } | DepsError::NotHealed { .. } => {
                ResourceState::InstallFailed
            }
            DepsError::NotInstalled { .. } => ResourceState::Missing,
            DepsError::VersionMismatch { .. } => ResourceState::VersionMismatch,
            _ => ResourceState::Unknown,
        }
    }
}

/// Verify-then-heal wrapper around a [`Resource`]
pub struct SelfHealing<R> {
    resource: R,
    drift: Option<Arc<dyn Fetcher>>,
}

impl<R: Resource> SelfHealing<R> {
    pub fn new(resource: R) -> Self {
        SelfHealing {
            resource,
            drift: None,
        }
    }

    /// Look up the upstream latest version after each successful check.
    pub fn with_drift_check(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.drift = Some(fetcher);
        self
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    /// Fresh state, without drift lookups
    pub fn state(&self) -> ResourceState {
        ResourceState::from_result(&self.resource.check())
    }
}

impl<R: Resource> Dependency for SelfHealing<R> {
    fn verify(&self) -> Result<()> {
        self.resource.check()?;

        if let (Some(fetcher), Some(pin)) = (&self.drift, self.resource.pin()) {
            report_drift(pin, &check_drift(pin, fetcher.as_ref()));
        }
        Ok(())
    }

    fn ensure(&self) -> Result<()> {
        let tool = self.resource.name();

        match self.verify() {
            Ok(()) => {
                info!(tool, "already installed and up to date");
                return Ok(());
            }
            Err(e) => info!(tool, reason = %e, "verification failed, installing"),
        }

        self.resource
            .install()
            .map_err(|e| DepsError::InstallFailed {
                tool: tool.to_string(),
                source: Box::new(e),
            })?;

        info!(tool, "re-verifying installation");
        self.verify().map_err(|e| DepsError::NotHealed {
            tool: tool.to_string(),
            source: Box::new(e),
        })?;

        info!(tool, "successfully installed and verified");
        Ok(())
    }
}
