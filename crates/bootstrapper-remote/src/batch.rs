//! Batch manifest and artifact download.
//!
//! `GET {server}/batch/` answers with a comma separated list of file names;
//! each one is then fetched from `{server}/batch/{name}` into
//! `{work_dir}/batch/{name}`. Downloads are sequential and the first failure
//! aborts the batch.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use bootstrapper_core::info_log;

use crate::error::RemoteError;
use crate::http::{self, BATCH_PATH};
use crate::server::ServerIdentity;

/// Ordered artifact names as sent by the server.
///
/// Names are not validated or deduplicated: a name listed twice is downloaded twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactManifest {
    names: Vec<String>,
}

impl ArtifactManifest {
    /// Trailing empty entries (`a.jar,b.jar,`) are dropped; empty entries in
    /// the middle are kept. An empty body is a single empty name.
    pub fn parse(body: &str) -> Self {
        let mut names: Vec<String> = body.split(',').map(|name| name.trim().to_string()).collect();
        if body.trim().is_empty() {
            return Self { names };
        }
        while names.last().is_some_and(|name| name.is_empty()) {
            names.pop();
        }
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A fully written copy of one remote artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalArtifact {
    pub name: String,
    pub path: PathBuf,
}

impl ServerIdentity {
    fn artifact_url(&self, name: &str) -> String {
        format!("{}{}{}", self.server_url(), BATCH_PATH, name)
    }

    /// Fetch the manifest from `{server}/batch/`.
    pub fn fetch_manifest(&self) -> Result<ArtifactManifest, RemoteError> {
        let body = self
            .remote_content(BATCH_PATH)
            .map_err(|source| RemoteError::ManifestFetchFailed {
                url: format!("{}{}", self.server_url(), BATCH_PATH),
                source: Box::new(source),
            })?;
        Ok(ArtifactManifest::parse(&body))
    }

    /// Download one artifact, overwriting any previous copy.
    ///
    /// On any failure the destination file is removed before the error is
    /// returned, so a half-written artifact never stays in the cache.
    pub fn download_artifact(&self, name: &str) -> Result<LocalArtifact, RemoteError> {
        if !is_flat_name(name) {
            return Err(RemoteError::UnsafeArtifactName(name.to_string()));
        }
        let url = self.artifact_url(name);
        let path = self.batch_dir().join(name);

        match self.copy_to_file(&url, &path) {
            Ok(written) => {
                tracing::debug!("Downloaded {} ({} bytes) to {}", url, written, path.display());
                Ok(LocalArtifact {
                    name: name.to_string(),
                    path,
                })
            }
            Err(e) => {
                remove_partial(&path);
                Err(e)
            }
        }
    }

    /// Fetch the manifest, then every artifact it lists, in order.
    ///
    /// The first failing artifact aborts the whole batch. Artifacts downloaded
    /// before it stay on disk; the failing one does not.
    pub fn fetch_manifest_and_artifacts(&self) -> Result<Vec<LocalArtifact>, RemoteError> {
        let manifest = self.fetch_manifest()?;
        info_log!(
            "Downloading {} batch artifact(s) from {}",
            manifest.len(),
            self.server_url()
        );

        let mut artifacts = Vec::with_capacity(manifest.len());
        for name in manifest.names() {
            let artifact =
                self.download_artifact(name)
                    .map_err(|source| RemoteError::ArtifactDownloadFailed {
                        name: name.clone(),
                        url: self.artifact_url(name),
                        source: Box::new(source),
                    })?;
            artifacts.push(artifact);
        }
        Ok(artifacts)
    }

    fn copy_to_file(&self, url: &str, path: &Path) -> Result<u64, RemoteError> {
        let response = http::get(self.agent(), url)?;
        let file = File::create(path).map_err(|source| RemoteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        let mut reader = response.into_reader();
        let written =
            io::copy(&mut reader, &mut writer).map_err(|source| RemoteError::Transfer {
                url: url.to_string(),
                path: path.to_path_buf(),
                source,
            })?;
        writer.flush().map_err(|source| RemoteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(written)
    }
}

/// Names land directly in the flat batch directory.
fn is_flat_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.contains('\\') && name != ".." && name != "."
}

fn remove_partial(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => tracing::debug!("Removed partial artifact {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove partial artifact {}: {}", path.display(), e),
    }
}
