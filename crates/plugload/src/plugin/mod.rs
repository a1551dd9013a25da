//! Handles to loaded plugin instances.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::boundary::{Boundary, BoundaryId, Lease};
use crate::error::StaleHandle;
use crate::scope::CodeScope;

/// A plugin instance together with the lease of the boundary it came from.
///
/// Access goes through [`get`](Self::get) and [`get_mut`](Self::get_mut),
/// which fail with [`StaleHandle`] once the boundary has been released.
/// Instances added by the host directly have no lease and never go stale.
pub struct Plugin<T> {
    // Dropped first: the instance's code may live in `keepalive`.
    instance: T,
    name: String,
    origin: Option<Url>,
    lease: Option<Lease>,
    keepalive: Option<Arc<dyn CodeScope>>,
}

impl<T> Plugin<T> {
    pub(crate) fn leased(
        instance: T,
        name: &str,
        boundary: &Boundary,
        keepalive: Option<Arc<dyn CodeScope>>,
    ) -> Self {
        Self {
            instance,
            name: name.to_owned(),
            origin: Some(boundary.origin().clone()),
            lease: Some(boundary.lease()),
            keepalive,
        }
    }

    /// Wraps a host-provided instance that belongs to no boundary.
    #[must_use]
    pub fn unbound(name: impl Into<String>, instance: T) -> Self {
        Self {
            instance,
            name: name.into(),
            origin: None,
            lease: None,
            keepalive: None,
        }
    }

    /// Borrows the instance.
    ///
    /// # Errors
    ///
    /// Returns [`StaleHandle`] once the originating boundary was released.
    pub fn get(&self) -> Result<&T, StaleHandle> {
        self.check()?;
        Ok(&self.instance)
    }

    /// Mutably borrows the instance.
    ///
    /// # Errors
    ///
    /// Returns [`StaleHandle`] once the originating boundary was released.
    pub fn get_mut(&mut self) -> Result<&mut T, StaleHandle> {
        self.check()?;
        Ok(&mut self.instance)
    }

    fn check(&self) -> Result<(), StaleHandle> {
        match &self.lease {
            Some(lease) if !lease.is_live() => Err(StaleHandle::new(lease.boundary())),
            _ => Ok(()),
        }
    }

    /// Candidate name the instance was created from.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Origin of the boundary the instance was created through.
    #[must_use]
    pub const fn origin(&self) -> Option<&Url> {
        self.origin.as_ref()
    }

    /// Boundary the instance was created through.
    #[must_use]
    pub fn boundary_id(&self) -> Option<BoundaryId> {
        self.lease.as_ref().map(Lease::boundary)
    }

    /// Returns `true` while the instance may be used.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.lease.as_ref().is_none_or(Lease::is_live)
    }

    /// Returns `true` when the instance keeps plugin code mapped.
    #[must_use]
    pub const fn holds_code(&self) -> bool {
        self.keepalive.is_some()
    }
}

impl<T: fmt::Debug> fmt::Debug for Plugin<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("origin", &self.origin.as_ref().map(Url::as_str))
            .field("boundary", &self.boundary_id())
            .field("live", &self.is_live())
            .field("instance", &self.instance)
            .finish()
    }
}
