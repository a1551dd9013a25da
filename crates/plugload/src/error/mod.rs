//! Error and failure types for discovery, loading, and instantiation.
//!
//! Two layers exist. [`LoadError`] aborts an operation on a whole source and
//! is returned through `Result`. [`PluginFailure`] describes a single
//! candidate (or, during folder scans, a single archive) that could not be
//! turned into an instance; it is recorded inside a
//! [`LoadResult`](crate::LoadResult) and never aborts the batch.
//!
//! I/O errors are wrapped in `Arc` so every type here stays cheap to clone.

use std::error::Error as StdError;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::boundary::BoundaryId;

/// Shared, type-erased cause attached to malformed-source errors.
pub type Cause = Arc<dyn StdError + Send + Sync>;

/// Errors that abort loading a source.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// The source could not be read or made addressable.
    #[error("malformed source {path}: {message}")]
    MalformedSource {
        /// Path of the offending source, or its origin for code scopes.
        path: PathBuf,
        /// Human-readable description of the problem.
        message: String,
        /// Optional underlying error.
        #[source]
        source: Option<Cause>,
    },

    /// An argument or precondition was violated before any work started.
    #[error("precondition failed: {message}")]
    Precondition {
        /// Description of the violated precondition.
        message: String,
    },

    /// A filesystem operation failed outside a per-archive context.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
}

impl LoadError {
    /// Builds a [`LoadError::MalformedSource`] without an underlying cause.
    #[must_use]
    pub fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedSource {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Builds a [`LoadError::MalformedSource`] from an underlying error.
    #[must_use]
    pub fn malformed_by<E>(path: impl Into<PathBuf>, error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::MalformedSource {
            path: path.into(),
            message: error.to_string(),
            source: Some(Arc::new(error)),
        }
    }

    /// Builds a [`LoadError::Precondition`].
    #[must_use]
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// Builds a [`LoadError::Io`].
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// Returns `true` when the error concerns one source only.
    ///
    /// Folder scans record such errors against the archive and carry on.
    #[must_use]
    pub const fn is_per_source(&self) -> bool {
        matches!(self, Self::MalformedSource { .. } | Self::Io { .. })
    }
}

/// Errors raised while resolving a candidate name inside a boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// No declaration is exported under the name.
    #[error("no declaration named '{name}': {message}")]
    NotFound {
        /// Symbol that was looked up.
        name: String,
        /// Loader-specific detail.
        message: String,
    },

    /// The declaration was built against an incompatible ABI.
    #[error("declaration '{name}' has ABI version {found}, expected {expected}")]
    AbiMismatch {
        /// Symbol that was looked up.
        name: String,
        /// Version recorded in the declaration.
        found: u32,
        /// Version understood by this crate.
        expected: u32,
    },

    /// The boundary was released before the lookup.
    #[error("boundary {boundary} has been released")]
    Released {
        /// Released boundary.
        boundary: BoundaryId,
    },
}

impl LookupError {
    /// Builds a [`LookupError::NotFound`].
    #[must_use]
    pub fn not_found(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by an [`InstantiationStrategy`](crate::InstantiationStrategy).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstantiationError {
    /// The declaration has no zero-argument constructor.
    #[error("plugin '{name}' has no zero-argument constructor")]
    MissingConstructor {
        /// Plugin name.
        name: String,
    },

    /// The declaration has no argument-taking constructor.
    #[error("plugin '{name}' has no argument-taking constructor")]
    MissingArgumentConstructor {
        /// Plugin name.
        name: String,
    },

    /// The constructor reported an error.
    #[error("constructor of plugin '{name}' failed: {message}")]
    ConstructorFailed {
        /// Plugin name.
        name: String,
        /// Message returned by the constructor.
        message: String,
    },

    /// The constructor panicked.
    #[error("constructor of plugin '{name}' panicked: {message}")]
    ConstructorPanicked {
        /// Plugin name.
        name: String,
        /// Panic payload, when it was a string.
        message: String,
    },

    /// The constructed value is not of the capability's instance type.
    #[error("plugin '{name}' did not produce a value of type {expected}")]
    WrongInstanceType {
        /// Plugin name.
        name: String,
        /// Expected instance type name.
        expected: &'static str,
    },
}

/// Returned when a plugin instance is used after its boundary was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("plugin handle from boundary {boundary} used after release")]
pub struct StaleHandle {
    boundary: BoundaryId,
}

impl StaleHandle {
    pub(crate) const fn new(boundary: BoundaryId) -> Self {
        Self { boundary }
    }

    /// Boundary the handle was created through.
    #[must_use]
    pub const fn boundary(&self) -> BoundaryId {
        self.boundary
    }
}

/// Coarse classification of a [`PluginFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The candidate name did not resolve to a declaration.
    SymbolNotFound,
    /// The declaration does not implement the requested capability.
    TypeMismatch,
    /// The declaration could not be instantiated.
    Instantiation,
    /// A scanned archive could not be opened or read.
    MalformedSource,
}

/// A per-candidate (or per-archive) failure recorded in a load result.
#[derive(Debug, Clone, Error)]
pub enum PluginFailure {
    /// The candidate name did not resolve.
    #[error("plugin '{name}' could not be resolved: {cause}")]
    SymbolNotFound {
        /// Candidate name.
        name: String,
        /// Archive the candidate was declared in, if any.
        path: Option<PathBuf>,
        /// Lookup failure.
        #[source]
        cause: LookupError,
    },

    /// The declaration does not implement the requested capability.
    #[error("plugin '{name}' does not implement '{capability}'")]
    TypeMismatch {
        /// Candidate name.
        name: String,
        /// Archive the candidate was declared in, if any.
        path: Option<PathBuf>,
        /// Requested capability name.
        capability: &'static str,
    },

    /// The declaration could not be instantiated.
    #[error("plugin '{name}' could not be instantiated: {cause}")]
    Instantiation {
        /// Candidate name.
        name: String,
        /// Archive the candidate was declared in, if any.
        path: Option<PathBuf>,
        /// Strategy failure.
        #[source]
        cause: InstantiationError,
    },

    /// A scanned archive could not be loaded at all.
    #[error("archive {path} could not be loaded: {cause}")]
    MalformedSource {
        /// Archive path.
        path: PathBuf,
        /// Error raised by the loader.
        #[source]
        cause: LoadError,
    },
}

impl PluginFailure {
    /// Returns the failure's classification.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::SymbolNotFound { .. } => FailureKind::SymbolNotFound,
            Self::TypeMismatch { .. } => FailureKind::TypeMismatch,
            Self::Instantiation { .. } => FailureKind::Instantiation,
            Self::MalformedSource { .. } => FailureKind::MalformedSource,
        }
    }

    /// Candidate name, absent for archive-level failures.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::SymbolNotFound { name, .. }
            | Self::TypeMismatch { name, .. }
            | Self::Instantiation { name, .. } => Some(name.as_str()),
            Self::MalformedSource { .. } => None,
        }
    }

    /// Archive the failure relates to, when known.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::SymbolNotFound { path, .. }
            | Self::TypeMismatch { path, .. }
            | Self::Instantiation { path, .. } => path.as_deref(),
            Self::MalformedSource { path, .. } => Some(path),
        }
    }
}
