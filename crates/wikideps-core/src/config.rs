//! Runtime configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then
//! `WIKIDEPS_*` environment overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::credential::{Environment, KeyLocations, ProcessEnv};
use crate::error::DepsError;
use crate::pin::{LatestFormat, VersionPin};
use crate::tools::mermaid::MERMAID_LATEST_URL;
use crate::tools::syslibs::MERMAID_SYSTEM_LIBRARIES;
use crate::Result;

/// Pinned Go toolchain version
pub const TARGET_GO_VERSION: &str = "1.25.3";

/// Pinned Mermaid CLI version
pub const TARGET_MERMAID_VERSION: &str = "10.9.0";

/// Plain-text endpoint naming the newest Go release
pub const GO_LATEST_URL: &str = "https://go.dev/VERSION?m=text";

/// Configuration for every resource in the toolbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepsConfig {
    pub go_version: String,
    pub mermaid_version: String,
    /// Go is unpacked into `<install_root>/go`
    pub install_root: PathBuf,
    /// Where downloads are staged before extraction
    pub staging_dir: PathBuf,
    /// Packages the headless renderer needs
    pub system_libraries: Vec<String>,
    pub app_key: KeyLocations,
    /// Look up upstream versions after successful checks
    pub drift_check: bool,
}

impl Default for DepsConfig {
    fn default() -> Self {
        DepsConfig {
            go_version: TARGET_GO_VERSION.to_string(),
            mermaid_version: TARGET_MERMAID_VERSION.to_string(),
            install_root: PathBuf::from("/usr/local"),
            staging_dir: std::env::temp_dir(),
            system_libraries: MERMAID_SYSTEM_LIBRARIES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            app_key: KeyLocations::default(),
            drift_check: true,
        }
    }
}

impl DepsConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(&ProcessEnv);
        config
    }

    /// Read a TOML file over the defaults, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DepsError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut config: DepsConfig = toml::from_str(&raw)
            .map_err(|e| DepsError::Config(format!("invalid {}: {e}", path.display())))?;
        config.apply_env(&ProcessEnv);
        Ok(config)
    }

    /// Apply `WIKIDEPS_*` overrides. Empty values are ignored.
    pub fn apply_env(&mut self, env: &dyn Environment) {
        let get = |key: &str| env.var(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("WIKIDEPS_GO_VERSION") {
            self.go_version = v.trim().to_string();
        }
        if let Some(v) = get("WIKIDEPS_MERMAID_VERSION") {
            self.mermaid_version = v.trim().to_string();
        }
        if let Some(v) = get("WIKIDEPS_INSTALL_ROOT") {
            self.install_root = PathBuf::from(v);
        }
        if let Some(v) = get("WIKIDEPS_NO_DRIFT_CHECK") {
            self.drift_check = matches!(v.trim(), "0" | "false" | "no");
        }
    }

    pub fn go_pin(&self) -> VersionPin {
        VersionPin::new("go", &self.go_version).with_latest(
            GO_LATEST_URL,
            LatestFormat::PlainText {
                strip_prefix: "go".to_string(),
            },
        )
    }

    pub fn mermaid_pin(&self) -> VersionPin {
        VersionPin::new("mermaid-cli", &self.mermaid_version)
            .with_latest(MERMAID_LATEST_URL, LatestFormat::NpmRegistry)
    }
}
