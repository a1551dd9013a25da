//! In-memory scopes for statically linked plugins.

use std::collections::BTreeMap;

use url::Url;

use super::{CodeScope, ScopeResource};
use crate::declaration::{PluginDeclaration, PluginType};
use crate::error::{LoadError, LookupError};

/// A scope whose declarations and resources are registered in code.
///
/// Hosts use it for plugins compiled into the host binary; it also serves as
/// a stand-in for archives wherever a filesystem is not wanted.
#[derive(Debug, Clone)]
pub struct StaticScope {
    origin: Url,
    declarations: BTreeMap<String, &'static PluginDeclaration>,
    resources: BTreeMap<String, Vec<u8>>,
}

impl StaticScope {
    /// Creates an empty scope identified by `origin`.
    ///
    /// Resource origins are `origin` joined with the resource path, so a
    /// base ending in `/` keeps the scope's own path segment.
    #[must_use]
    pub const fn new(origin: Url) -> Self {
        Self {
            origin,
            declarations: BTreeMap::new(),
            resources: BTreeMap::new(),
        }
    }

    /// Exports `declaration` under its own name.
    #[must_use]
    pub fn with_declaration(self, declaration: &'static PluginDeclaration) -> Self {
        self.with_declaration_as(declaration.name(), declaration)
    }

    /// Exports `declaration` under `symbol`.
    #[must_use]
    pub fn with_declaration_as(
        mut self,
        symbol: impl Into<String>,
        declaration: &'static PluginDeclaration,
    ) -> Self {
        self.declarations.insert(symbol.into(), declaration);
        self
    }

    /// Stores `content` at `path`, replacing any previous resource.
    #[must_use]
    pub fn with_resource(mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.resources.insert(path.into(), content.into());
        self
    }
}

impl CodeScope for StaticScope {
    fn lookup(&self, symbol: &str) -> Result<PluginType, LookupError> {
        let declaration = self.declarations.get(symbol).ok_or_else(|| {
            LookupError::not_found(symbol, format!("not declared in {}", self.origin))
        })?;
        PluginType::from_declaration(symbol, declaration)
    }

    fn resources(&self, path: &str) -> Result<Vec<ScopeResource>, LoadError> {
        Ok(self
            .resources
            .get(path)
            .map(|content| {
                let origin = self.origin.join(path).unwrap_or_else(|_| self.origin.clone());
                ScopeResource::new(origin, content.clone())
            })
            .into_iter()
            .collect())
    }

    fn origin(&self) -> Url {
        self.origin.clone()
    }
}
