//! Loading boundaries.
//!
//! A [`Boundary`] owns the mapped form of one source for the duration of a
//! load result. Every instance created through it carries a lease holding
//! the boundary's id and the generation current at creation time.
//! Releasing the boundary bumps the shared generation, so leases taken
//! earlier report themselves stale from then on.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use plugload_config::LoaderSettings;
use plugload_config::defaults::DEFAULT_LIBRARY_ATTRIBUTE;
use tracing::debug;
use url::Url;

use crate::declaration::PluginType;
use crate::error::{LoadError, LookupError};
use crate::scope::{CodeScope, NativeArchiveScope, Source};

const BOUNDARY_TARGET: &str = "plugload::boundary";

static NEXT_BOUNDARY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoundaryId(u64);

impl BoundaryId {
    fn next() -> Self {
        Self(NEXT_BOUNDARY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BoundaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Proof that an instance was created through a boundary generation.
#[derive(Debug, Clone)]
pub(crate) struct Lease {
    boundary: BoundaryId,
    generation: u64,
    current: Arc<AtomicU64>,
}

impl Lease {
    pub(crate) const fn boundary(&self) -> BoundaryId {
        self.boundary
    }

    pub(crate) fn is_live(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.generation
    }
}

/// The mapped representation of one source's code.
pub struct Boundary {
    id: BoundaryId,
    generation: Arc<AtomicU64>,
    isolated: bool,
    origin: Url,
    scope: Option<Arc<dyn CodeScope>>,
}

impl Boundary {
    /// Creates a boundary that owns `scope` exclusively.
    #[must_use]
    pub fn isolated(scope: Arc<dyn CodeScope>) -> Self {
        Self::with_scope(scope, true)
    }

    /// Creates a boundary that delegates to a scope owned elsewhere.
    #[must_use]
    pub fn delegating(scope: Arc<dyn CodeScope>) -> Self {
        Self::with_scope(scope, false)
    }

    fn with_scope(scope: Arc<dyn CodeScope>, isolated: bool) -> Self {
        let boundary = Self {
            id: BoundaryId::next(),
            generation: Arc::new(AtomicU64::new(0)),
            isolated,
            origin: scope.origin(),
            scope: Some(scope),
        };
        debug!(
            target: BOUNDARY_TARGET,
            boundary = %boundary.id,
            origin = %boundary.origin,
            isolated,
            "opened boundary"
        );
        boundary
    }

    /// Boundary identifier.
    #[must_use]
    pub const fn id(&self) -> BoundaryId {
        self.id
    }

    /// Origin of the underlying scope.
    #[must_use]
    pub const fn origin(&self) -> &Url {
        &self.origin
    }

    /// Returns `true` when the boundary owns its code exclusively.
    #[must_use]
    pub const fn is_isolated(&self) -> bool {
        self.isolated
    }

    /// Returns `true` once [`release`](Self::release) has run.
    #[must_use]
    pub const fn is_released(&self) -> bool {
        self.scope.is_none()
    }

    /// Resolves `name` inside the boundary.
    ///
    /// The returned type keeps the scope mapped while it, or anything built
    /// from it, is alive.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Released`] after release, otherwise whatever
    /// the scope reports.
    pub fn lookup(&self, name: &str) -> Result<PluginType, LookupError> {
        let scope = self
            .scope
            .as_ref()
            .ok_or(LookupError::Released { boundary: self.id })?;
        scope
            .lookup(name)
            .map(|found| found.with_keepalive(Arc::clone(scope)))
    }

    pub(crate) fn lease(&self) -> Lease {
        Lease {
            boundary: self.id,
            generation: self.generation.load(Ordering::Acquire),
            current: Arc::clone(&self.generation),
        }
    }

    /// Releases the boundary, invalidating every instance created through
    /// it. Repeated calls are no-ops.
    pub fn release(&mut self) {
        if self.scope.take().is_some() {
            self.generation.fetch_add(1, Ordering::AcqRel);
            debug!(
                target: BOUNDARY_TARGET,
                boundary = %self.id,
                origin = %self.origin,
                "released boundary"
            );
        }
    }
}

impl Drop for Boundary {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Boundary")
            .field("id", &self.id)
            .field("origin", &self.origin.as_str())
            .field("isolated", &self.isolated)
            .field("released", &self.is_released())
            .finish_non_exhaustive()
    }
}

/// Makes a source addressable.
#[cfg_attr(test, mockall::automock)]
pub trait BoundaryOpener {
    /// Opens a boundary over `source`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedSource`] when the source cannot be
    /// mapped.
    fn open(&self, source: &Source) -> Result<Boundary, LoadError>;
}

/// Opens archives by mapping their native library; delegates to scopes.
#[derive(Debug, Clone)]
pub struct NativeBoundaryOpener {
    library_attribute: String,
}

impl Default for NativeBoundaryOpener {
    fn default() -> Self {
        Self {
            library_attribute: DEFAULT_LIBRARY_ATTRIBUTE.to_owned(),
        }
    }
}

impl NativeBoundaryOpener {
    /// Creates an opener using the default library attribute.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an opener from loader settings.
    #[must_use]
    pub fn from_settings(settings: &LoaderSettings) -> Self {
        Self::default().with_library_attribute(settings.library_attribute())
    }

    /// Overrides the manifest attribute naming the library entry.
    #[must_use]
    pub fn with_library_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.library_attribute = attribute.into();
        self
    }
}

impl BoundaryOpener for NativeBoundaryOpener {
    fn open(&self, source: &Source) -> Result<Boundary, LoadError> {
        match source {
            Source::Archive(path) => {
                let scope = NativeArchiveScope::open(path, &self.library_attribute)?;
                Ok(Boundary::isolated(Arc::new(scope)))
            }
            Source::Scope(scope) => Ok(Boundary::delegating(Arc::clone(scope))),
        }
    }
}

#[cfg(test)]
mod tests;
