//! Ordered key lookup: env override, cluster mount, local glob

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use super::{CredentialSource, Environment, KeyLocations, SecretArtifact};
use crate::error::CredentialError;

type Resolution<T> = std::result::Result<T, CredentialError>;

/// Resolves the app key from the first source that has one
pub struct CredentialResolver {
    locations: KeyLocations,
    env: Arc<dyn Environment>,
}

impl CredentialResolver {
    pub fn new(locations: KeyLocations, env: Arc<dyn Environment>) -> Self {
        CredentialResolver { locations, env }
    }

    pub fn locations(&self) -> &KeyLocations {
        &self.locations
    }

    /// All sources in precedence order
    pub fn sources(&self) -> Vec<CredentialSource> {
        vec![
            CredentialSource::EnvOverride(self.locations.env_var.clone()),
            CredentialSource::ClusterSecretMount(self.locations.mount_path.clone()),
            CredentialSource::LocalFileGlob(self.locations.local_pattern()),
        ]
    }

    /// Resolve the key.
    ///
    /// A set-but-broken override is an error, not a cue to keep searching.
    /// Whatever source wins, its file must open or the result is
    /// [`CredentialError::Unreadable`].
    pub fn resolve(&self) -> Resolution<SecretArtifact> {
        let var = &self.locations.env_var;
        if let Some(raw) = self.env.var(var).filter(|v| !v.is_empty()) {
            let path = PathBuf::from(raw);
            if std::fs::metadata(&path).is_err() {
                return Err(CredentialError::EnvPathMissing {
                    var: var.clone(),
                    path,
                });
            }
            return self.accept(path, CredentialSource::EnvOverride(var.clone()));
        }

        let mount = &self.locations.mount_path;
        if std::fs::metadata(mount).is_ok() {
            return self.accept(
                mount.clone(),
                CredentialSource::ClusterSecretMount(mount.clone()),
            );
        }

        debug!(dir = %self.locations.search_dir.display(), "searching for key files");
        match self.local_candidates()?.pop() {
            Some(path) => self.accept(
                path,
                CredentialSource::LocalFileGlob(self.locations.local_pattern()),
            ),
            None => Err(CredentialError::NotFound {
                attempted: self.sources(),
            }),
        }
    }

    /// Matching files in the search directory, sorted lexicographically.
    ///
    /// The last entry is treated as the newest, which only holds for
    /// sortable (e.g. date-suffixed, zero-padded) filenames.
    pub fn local_candidates(&self) -> Resolution<Vec<PathBuf>> {
        let dir = &self.locations.search_dir;
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(CredentialError::Search {
                    dir: dir.clone(),
                    reason: e.to_string(),
                })
            }
        };

        let prefix = &self.locations.file_prefix;
        let suffix = &self.locations.file_suffix;
        let mut matches: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .filter(|e| !e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter(|e| {
                let name = e.file_name();
                let name = name.to_string_lossy();
                name.len() >= prefix.len() + suffix.len()
                    && name.starts_with(prefix.as_str())
                    && name.ends_with(suffix.as_str())
            })
            .map(|e| e.path())
            .collect();

        matches.sort();
        Ok(matches)
    }

    fn accept(&self, path: PathBuf, origin: CredentialSource) -> Resolution<SecretArtifact> {
        if let Err(e) = std::fs::File::open(&path) {
            return Err(CredentialError::Unreadable {
                path,
                origin: origin.to_string(),
                reason: e.to_string(),
            });
        }

        info!(path = %path.display(), source = %origin, "using GitHub App key");
        Ok(SecretArtifact { path, origin })
    }
}
