//! Scopes composed of several roots.

use std::fmt;
use std::sync::Arc;

use url::Url;

use super::{CodeScope, ScopeResource};
use crate::declaration::PluginType;
use crate::error::{LoadError, LookupError};

/// Presents several scopes as one.
///
/// Lookups return the first root that resolves the name. Resources are the
/// concatenation of every root's resources, in root order, so the same
/// descriptor path may be found several times.
#[derive(Clone)]
pub struct MergedScope {
    origin: Url,
    roots: Vec<Arc<dyn CodeScope>>,
}

impl MergedScope {
    /// Creates an empty merged scope identified by `origin`.
    #[must_use]
    pub const fn new(origin: Url) -> Self {
        Self {
            origin,
            roots: Vec::new(),
        }
    }

    /// Appends a root.
    #[must_use]
    pub fn with_root(mut self, root: impl CodeScope + 'static) -> Self {
        self.roots.push(Arc::new(root));
        self
    }

    /// Appends an already shared root.
    #[must_use]
    pub fn with_shared_root(mut self, root: Arc<dyn CodeScope>) -> Self {
        self.roots.push(root);
        self
    }

    /// Number of roots.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.roots.len()
    }

    /// Returns `true` when there are no roots.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl CodeScope for MergedScope {
    fn lookup(&self, symbol: &str) -> Result<PluginType, LookupError> {
        let mut last_error = None;
        for root in &self.roots {
            match root.lookup(symbol) {
                Ok(found) => return Ok(found),
                Err(error) => last_error = Some(error),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            LookupError::not_found(symbol, format!("{} has no roots", self.origin))
        }))
    }

    fn resources(&self, path: &str) -> Result<Vec<ScopeResource>, LoadError> {
        let mut found = Vec::new();
        for root in &self.roots {
            found.extend(root.resources(path)?);
        }
        Ok(found)
    }

    fn origin(&self) -> Url {
        self.origin.clone()
    }
}

impl fmt::Debug for MergedScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let roots: Vec<String> = self.roots.iter().map(|root| root.origin().into()).collect();
        f.debug_struct("MergedScope")
            .field("origin", &self.origin.as_str())
            .field("roots", &roots)
            .finish()
    }
}
