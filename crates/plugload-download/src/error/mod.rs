//! Error types for registry lookups and artifact downloads.

use std::io;
use std::sync::Arc;

use camino::Utf8PathBuf;
use plugload::LoadError;
use thiserror::Error;

/// Errors raised while resolving or downloading plugin artifacts.
#[derive(Debug, Clone, Error)]
pub enum DownloadError {
    /// An argument or precondition was violated; nothing was fetched.
    #[error("{message}")]
    Precondition {
        /// Human-readable description.
        message: String,
    },

    /// A request failed or answered with an unexpected status.
    #[error("request to {url} failed: {message}")]
    Transport {
        /// Requested location.
        url: String,
        /// Description of the failure.
        message: String,
        /// Underlying client error, when there is one.
        #[source]
        source: Option<Arc<reqwest::Error>>,
    },

    /// The registry document could not be interpreted.
    #[error("invalid registry document at {url}: {message}")]
    Registry {
        /// Registry location.
        url: String,
        /// Description of the problem.
        message: String,
    },

    /// A cache directory operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being accessed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// Downloaded artifacts could not be listed or loaded.
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl DownloadError {
    /// Builds a [`DownloadError::Precondition`].
    #[must_use]
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// Builds a [`DownloadError::Transport`] from a client error.
    #[must_use]
    pub fn transport(url: impl Into<String>, error: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            message: error.to_string(),
            source: Some(Arc::new(error)),
        }
    }

    /// Builds a [`DownloadError::Transport`] for a non-success status.
    #[must_use]
    pub fn status(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Builds a [`DownloadError::Registry`].
    #[must_use]
    pub fn registry(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Registry {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Builds a [`DownloadError::Io`].
    #[must_use]
    pub fn io(path: impl Into<Utf8PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// Returns `true` for failures raised before any request was sent.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::Precondition { .. } | Self::Load(LoadError::Precondition { .. })
        )
    }
}
