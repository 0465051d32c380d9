use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while talking to the server or writing the batch cache.
///
/// Every variant carries the URL or path involved; the batch-level variants
/// wrap the failure that aborted them.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Cannot reach server at '{url}'")]
    ServerUnreachable {
        url: String,
        #[source]
        source: Box<ureq::Transport>,
    },

    #[error("Status returned by url '{url}' is invalid: {status}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Failed to read response body from '{url}'")]
    ReadFailed {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy '{url}' to '{}'", path.display())]
    Transfer {
        url: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create cache directory '{}'", path.display())]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact name '{0}' is not a plain file name")]
    UnsafeArtifactName(String),

    #[error("Fail to download the batch manifest from '{url}'")]
    ManifestFetchFailed {
        url: String,
        #[source]
        source: Box<RemoteError>,
    },

    #[error("Fail to download artifact '{name}' from '{url}'")]
    ArtifactDownloadFailed {
        name: String,
        url: String,
        #[source]
        source: Box<RemoteError>,
    },
}

impl RemoteError {
    /// HTTP status behind this error, looking through batch-level wrappers.
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::UnexpectedStatus { status, .. } => Some(*status),
            RemoteError::ManifestFetchFailed { source, .. }
            | RemoteError::ArtifactDownloadFailed { source, .. } => source.status(),
            _ => None,
        }
    }
}
