//! Download integrity checks
//!
//! Digests are computed in-process with SHA-256. A checksum document that
//! cannot be fetched leaves the artifact "unverifiable" (not an error); a
//! checksum that is published and does not match is fatal.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::DepsError;
use crate::fetch::Fetcher;
use crate::Result;

/// Result of a checksum check that did not fail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumOutcome {
    /// Published digest matched
    Verified { digest: String },
    /// No digest could be retrieved
    Unverifiable { reason: String },
}

/// SHA-256 of a byte slice, lowercase hex
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// SHA-256 of a file, streamed, lowercase hex
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Check `artifact` against the digest published at `checksum_url`.
pub fn verify_checksum(
    fetcher: &dyn Fetcher,
    checksum_url: &str,
    artifact: &Path,
) -> Result<ChecksumOutcome> {
    let published = match fetcher.get_text(checksum_url) {
        Ok(body) => body,
        Err(e) => {
            warn!(url = checksum_url, error = %e, "no checksum available, skipping verification");
            return Ok(ChecksumOutcome::Unverifiable {
                reason: e.to_string(),
            });
        }
    };

    // `<hex>` or `<hex>  <filename>` (sha256sum format)
    let expected = published
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    info!(artifact = %artifact.display(), "verifying checksum");
    let actual = sha256_file(artifact)?;
    if expected != actual {
        return Err(DepsError::IntegrityCheckFailed {
            artifact: artifact.display().to_string(),
            expected,
            actual,
        });
    }

    debug!(digest = &actual[..12], "checksum verified");
    Ok(ChecksumOutcome::Verified { digest: actual })
}
