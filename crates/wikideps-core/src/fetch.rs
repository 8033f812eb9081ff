//! HTTP capability for downloads and remote version lookups

use std::path::Path;

use tracing::debug;

use crate::error::DepsError;
use crate::Result;

/// Narrow HTTP capability, faked in tests by [`crate::fakes::StaticFetcher`]
pub trait Fetcher: Send + Sync {
    /// GET a small text document.
    fn get_text(&self, url: &str) -> Result<String>;

    /// GET a document and stream it into `dest`, returning the byte count.
    fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// Blocking `reqwest` client
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        // Downloads may be large; the effective limit is whatever the server enforces.
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("wikideps/", env!("CARGO_PKG_VERSION")))
            .timeout(None::<std::time::Duration>)
            .build()
            .map_err(|e| DepsError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(HttpFetcher { client })
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response> {
        debug!(url, "HTTP GET");
        self.client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|e| download_error(url, e))
    }
}

impl Fetcher for HttpFetcher {
    fn get_text(&self, url: &str) -> Result<String> {
        self.get(url)?.text().map_err(|e| download_error(url, e))
    }

    fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        let mut response = self.get(url)?;
        let mut file = std::fs::File::create(dest)?;
        let bytes = response
            .copy_to(&mut file)
            .map_err(|e| download_error(url, e))?;
        debug!(url, bytes, dest = %dest.display(), "download complete");
        Ok(bytes)
    }
}

fn download_error(url: &str, err: reqwest::Error) -> DepsError {
    DepsError::Download {
        url: url.to_string(),
        reason: err.to_string(),
    }
}
