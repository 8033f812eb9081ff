//! Pinned tool versions and remote drift notices
//!
//! A pin is the only version we install or accept. The remote "latest"
//! lookup is advisory: it never fails, never upgrades, and only logs.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::DepsError;
use crate::fetch::Fetcher;

/// Named target version for one external tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionPin {
    /// Tool name used in messages and errors
    pub tool: String,
    /// The exact version we require
    pub pinned: String,
    /// Where to look up the newest upstream release
    pub latest: Option<LatestSource>,
}

/// Remote endpoint publishing the newest version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestSource {
    pub url: String,
    pub format: LatestFormat,
}

/// How to read a version out of a [`LatestSource`] response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LatestFormat {
    /// First non-empty line, with an optional prefix removed (`go1.25.3` -> `1.25.3`)
    PlainText { strip_prefix: String },
    /// npm registry `latest` document, `version` field
    NpmRegistry,
}

#[derive(Deserialize)]
struct NpmLatest {
    version: String,
}

impl LatestFormat {
    /// Extract the version, or `None` when the body is not understood.
    pub fn parse(&self, body: &str) -> Option<String> {
        let version = match self {
            LatestFormat::PlainText { strip_prefix } => {
                let line = body.lines().map(str::trim).find(|l| !l.is_empty())?;
                line.strip_prefix(strip_prefix.as_str())
                    .unwrap_or(line)
                    .trim()
                    .to_string()
            }
            LatestFormat::NpmRegistry => serde_json::from_str::<NpmLatest>(body)
                .ok()?
                .version
                .trim()
                .to_string(),
        };
        (!version.is_empty()).then_some(version)
    }
}

impl VersionPin {
    pub fn new(tool: impl Into<String>, pinned: impl Into<String>) -> Self {
        VersionPin {
            tool: tool.into(),
            pinned: pinned.into(),
            latest: None,
        }
    }

    /// Attach a remote latest-version source
    pub fn with_latest(mut self, url: impl Into<String>, format: LatestFormat) -> Self {
        self.latest = Some(LatestSource {
            url: url.into(),
            format,
        });
        self
    }

    /// Exact match against an installed version string
    pub fn matches(&self, found: &str) -> bool {
        found == self.pinned
    }

    /// Substring match, for tools whose version output has extra text
    pub fn contains_pin(&self, output: &str) -> bool {
        output.contains(self.pinned.as_str())
    }

    /// Build the mismatch error for `found`
    pub fn mismatch(&self, found: impl Into<String>) -> DepsError {
        DepsError::VersionMismatch {
            tool: self.tool.clone(),
            found: found.into(),
            expected: self.pinned.clone(),
        }
    }
}

/// Outcome of a drift lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DriftStatus {
    /// Upstream latest equals the pin
    Current,
    /// Upstream has moved on
    Behind { latest: String },
    /// Lookup could not be completed
    Unknown { reason: String },
}

/// Compare the pin against upstream. Never fails.
pub fn check_drift(pin: &VersionPin, fetcher: &dyn Fetcher) -> DriftStatus {
    let Some(source) = &pin.latest else {
        return DriftStatus::Unknown {
            reason: "no remote version source configured".to_string(),
        };
    };

    let body = match fetcher.get_text(&source.url) {
        Ok(body) => body,
        Err(e) => {
            return DriftStatus::Unknown {
                reason: e.to_string(),
            }
        }
    };

    match source.format.parse(&body) {
        Some(latest) if latest == pin.pinned => DriftStatus::Current,
        Some(latest) => DriftStatus::Behind { latest },
        None => DriftStatus::Unknown {
            reason: "unable to parse version information from remote source".to_string(),
        },
    }
}

/// Log a drift result as an informational notice.
pub fn report_drift(pin: &VersionPin, status: &DriftStatus) {
    match status {
        DriftStatus::Current => {
            info!(tool = %pin.tool, version = %pin.pinned, "pinned version is the latest release");
        }
        DriftStatus::Behind { latest } => {
            info!(
                tool = %pin.tool,
                latest = %latest,
                pinned = %pin.pinned,
                "note: a newer version is available (you are pinned)"
            );
        }
        DriftStatus::Unknown { reason } => {
            info!(tool = %pin.tool, reason = %reason, "skipping version update check");
        }
    }
}
