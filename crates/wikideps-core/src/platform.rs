//! Host OS / architecture detection

use serde::{Deserialize, Serialize};

use crate::error::DepsError;
use crate::Result;

/// Host platform, as reported by the Rust standard library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Platform {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Platform this binary is running on
    pub fn current() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Map to Go's `GOOS`/`GOARCH` naming.
    ///
    /// Only linux/darwin on amd64/arm64 are supported; anything else fails
    /// before any download starts.
    pub fn go_target(&self) -> Result<(&'static str, &'static str)> {
        let os = match self.os.as_str() {
            "linux" => "linux",
            "macos" | "darwin" => "darwin",
            _ => return Err(self.unsupported()),
        };
        let arch = match self.arch.as_str() {
            "x86_64" | "amd64" => "amd64",
            "aarch64" | "arm64" => "arm64",
            _ => return Err(self.unsupported()),
        };
        Ok((os, arch))
    }

    fn unsupported(&self) -> DepsError {
        DepsError::UnsupportedPlatform {
            os: self.os.clone(),
            arch: self.arch.clone(),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}
