//! Code scopes and loadable sources.
//!
//! A [`CodeScope`] is anything that can resolve candidate names to plugin
//! declarations and expose named resources (manifests, service
//! descriptors). Archives become a [`NativeArchiveScope`] once their library
//! is mapped; code that is already present in the process is described by
//! [`StaticScope`], [`ProcessScope`], or a [`MergedScope`] of several roots.

mod memory;
mod merged;
mod native;
mod process;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use url::Url;

use crate::declaration::PluginType;
use crate::error::{LoadError, LookupError};

pub use self::memory::StaticScope;
pub use self::merged::MergedScope;
pub use self::native::NativeArchiveScope;
pub use self::process::ProcessScope;

/// A resource exposed by a code scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeResource {
    origin: Url,
    content: Vec<u8>,
}

impl ScopeResource {
    /// Creates a resource read from `origin`.
    #[must_use]
    pub const fn new(origin: Url, content: Vec<u8>) -> Self {
        Self { origin, content }
    }

    /// Location the resource was read from.
    #[must_use]
    pub const fn origin(&self) -> &Url {
        &self.origin
    }

    /// Raw resource bytes.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

/// Resolves declarations and resources within one body of code.
pub trait CodeScope: Send + Sync {
    /// Resolves `symbol` to a plugin declaration.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NotFound`] when nothing is exported under the
    /// name and [`LookupError::AbiMismatch`] for incompatible declarations.
    fn lookup(&self, symbol: &str) -> Result<PluginType, LookupError>;

    /// Returns every resource stored at `path`, one per root that has it.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] when a root exists but cannot be read.
    fn resources(&self, path: &str) -> Result<Vec<ScopeResource>, LoadError>;

    /// Location describing the scope in logs and errors.
    fn origin(&self) -> Url;
}

/// Something the loader can discover plugins in.
#[derive(Clone)]
pub enum Source {
    /// A plugin archive on disk.
    Archive(PathBuf),
    /// Code that is already addressable.
    Scope(Arc<dyn CodeScope>),
}

impl Source {
    /// Creates an archive source.
    #[must_use]
    pub fn archive(path: impl Into<PathBuf>) -> Self {
        Self::Archive(path.into())
    }

    /// Creates a source backed by an existing scope.
    #[must_use]
    pub fn scope(scope: impl CodeScope + 'static) -> Self {
        Self::Scope(Arc::new(scope))
    }

    /// Archive path, if this is an archive source.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Archive(path) => Some(path.as_path()),
            Self::Scope(_) => None,
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Archive(path) => f.debug_tuple("Archive").field(path).finish(),
            Self::Scope(scope) => f.debug_tuple("Scope").field(&scope.origin().as_str()).finish(),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Archive(path) => write!(f, "{}", path.display()),
            Self::Scope(scope) => write!(f, "{}", scope.origin()),
        }
    }
}
