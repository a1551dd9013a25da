//! The plugin loading pipeline.
//!
//! [`PluginLoader::load`] resolves candidate names, opens a boundary only
//! when at least one exists, and turns each candidate into an instance or a
//! recorded failure. One bad candidate never prevents the others from
//! loading; only a source that cannot be read or mapped aborts the call.

use std::any::type_name;
use std::fmt;
use std::path::Path;

use plugload_config::LoaderSettings;
use tracing::{debug, warn};

use crate::boundary::{Boundary, BoundaryOpener, NativeBoundaryOpener};
use crate::declaration::Capability;
use crate::error::{InstantiationError, LoadError, PluginFailure};
use crate::plugin::Plugin;
use crate::resolver::{ManifestAttributeResolver, NameResolver, ServiceDescriptorResolver};
use crate::result::{LoadResult, PluginRecord};
use crate::scope::Source;
use crate::strategy::{DefaultConstructor, InstantiationStrategy};

const LOADER_TARGET: &str = "plugload::loader";

/// Loads capability instances from sources.
pub struct PluginLoader {
    resolver: Box<dyn NameResolver>,
    opener: Box<dyn BoundaryOpener>,
    strategy: Box<dyn InstantiationStrategy>,
}

impl Default for PluginLoader {
    fn default() -> Self {
        Self::for_archives()
    }
}

impl PluginLoader {
    /// Creates a loader from its three collaborators.
    #[must_use]
    pub fn new(
        resolver: impl NameResolver + 'static,
        opener: impl BoundaryOpener + 'static,
        strategy: impl InstantiationStrategy + 'static,
    ) -> Self {
        Self {
            resolver: Box::new(resolver),
            opener: Box::new(opener),
            strategy: Box::new(strategy),
        }
    }

    /// Archive loader: manifest attribute names, native boundaries, and
    /// zero-argument constructors.
    #[must_use]
    pub fn for_archives() -> Self {
        Self::new(
            ManifestAttributeResolver::default(),
            NativeBoundaryOpener::default(),
            DefaultConstructor,
        )
    }

    /// Scope loader: service descriptor names, delegating boundaries, and
    /// zero-argument constructors.
    #[must_use]
    pub fn for_scopes() -> Self {
        Self::new(
            ServiceDescriptorResolver::default(),
            NativeBoundaryOpener::default(),
            DefaultConstructor,
        )
    }

    /// Archive loader configured from `settings`.
    #[must_use]
    pub fn from_settings(settings: &LoaderSettings) -> Self {
        Self::new(
            ManifestAttributeResolver::from_settings(settings),
            NativeBoundaryOpener::from_settings(settings),
            DefaultConstructor,
        )
    }

    /// Replaces the name resolver.
    #[must_use]
    pub fn with_resolver(mut self, resolver: impl NameResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Replaces the boundary opener.
    #[must_use]
    pub fn with_opener(mut self, opener: impl BoundaryOpener + 'static) -> Self {
        self.opener = Box::new(opener);
        self
    }

    /// Replaces the instantiation strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl InstantiationStrategy + 'static) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    /// Loads every `C` plugin declared by `source`.
    ///
    /// The result holds one record per candidate name. When the source
    /// declares nothing, no boundary is opened and the result is empty.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] when names cannot be resolved or the boundary
    /// cannot be opened. Per-candidate problems are recorded instead.
    pub fn load<C: Capability>(
        &self,
        source: &Source,
    ) -> Result<LoadResult<C::Instance>, LoadError> {
        let names = self.resolver.resolve(source, C::NAME)?;
        if names.is_empty() {
            debug!(
                target: LOADER_TARGET,
                source = %source,
                capability = C::NAME,
                "source declares no candidates"
            );
            return Ok(LoadResult::empty());
        }

        let boundary = self.opener.open(source)?;
        let records = names
            .iter()
            .map(|name| self.load_candidate::<C>(&boundary, name, source.path()))
            .collect();
        let result = LoadResult::from_boundary(records, boundary);
        debug!(
            target: LOADER_TARGET,
            source = %source,
            capability = C::NAME,
            loaded = result.success_count(),
            failed = result.failure_count(),
            "loaded source"
        );
        Ok(result)
    }

    fn load_candidate<C: Capability>(
        &self,
        boundary: &Boundary,
        name: &str,
        path: Option<&Path>,
    ) -> PluginRecord<C::Instance> {
        match self.instantiate::<C>(boundary, name, path) {
            Ok(plugin) => {
                debug!(target: LOADER_TARGET, plugin = name, "instantiated plugin");
                PluginRecord::Instance(plugin)
            }
            Err(failure) => {
                warn!(
                    target: LOADER_TARGET,
                    plugin = name,
                    error = %failure,
                    "plugin failed to load"
                );
                PluginRecord::Failure(failure)
            }
        }
    }

    fn instantiate<C: Capability>(
        &self,
        boundary: &Boundary,
        name: &str,
        path: Option<&Path>,
    ) -> Result<Plugin<C::Instance>, PluginFailure> {
        let owned_path = || path.map(Path::to_path_buf);
        let plugin_type = boundary
            .lookup(name)
            .map_err(|cause| PluginFailure::SymbolNotFound {
                name: name.to_owned(),
                path: owned_path(),
                cause,
            })?;
        if !plugin_type.implements_capability(C::NAME) {
            return Err(PluginFailure::TypeMismatch {
                name: name.to_owned(),
                path: owned_path(),
                capability: C::NAME,
            });
        }
        let instantiation_failure = |cause| PluginFailure::Instantiation {
            name: name.to_owned(),
            path: owned_path(),
            cause,
        };
        let value = self
            .strategy
            .instantiate(&plugin_type)
            .map_err(instantiation_failure)?;
        let instance = value.downcast::<C::Instance>().map_err(|_| {
            instantiation_failure(InstantiationError::WrongInstanceType {
                name: name.to_owned(),
                expected: type_name::<C::Instance>(),
            })
        })?;
        Ok(Plugin::leased(
            *instance,
            name,
            boundary,
            plugin_type.keepalive(),
        ))
    }
}

impl fmt::Debug for PluginLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginLoader").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
