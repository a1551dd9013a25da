//! Resolution from service descriptor files.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use plugload_config::LoaderSettings;
use plugload_config::defaults::DEFAULT_DESCRIPTOR_PREFIX;
use url::Url;

use super::NameResolver;
use crate::archive::{PluginArchive, file_url};
use crate::error::LoadError;
use crate::scope::Source;

/// Predicate deciding whether a descriptor found at an origin is read.
pub type OriginFilter = Arc<dyn Fn(&Url) -> bool + Send + Sync>;

/// Reads candidate names from `<prefix>/<capability>` descriptor files.
///
/// Each non-blank line names one candidate; `#` starts a comment. When a
/// scope exposes the descriptor from several roots the names are unioned.
#[derive(Clone)]
pub struct ServiceDescriptorResolver {
    prefix: String,
    filter: Option<OriginFilter>,
}

impl Default for ServiceDescriptorResolver {
    fn default() -> Self {
        Self::new(DEFAULT_DESCRIPTOR_PREFIX)
    }
}

impl ServiceDescriptorResolver {
    /// Creates a resolver reading descriptors under `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            filter: None,
        }
    }

    /// Creates a resolver from loader settings.
    #[must_use]
    pub fn from_settings(settings: &LoaderSettings) -> Self {
        Self::new(settings.descriptor_prefix())
    }

    /// Only reads descriptors whose origin satisfies `filter`.
    #[must_use]
    pub fn with_origin_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Url) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Descriptor path for `capability`.
    #[must_use]
    pub fn descriptor_path(&self, capability: &str) -> String {
        format!("{}/{capability}", self.prefix.trim_end_matches('/'))
    }

    fn accepts(&self, origin: &Url) -> bool {
        self.filter.as_ref().is_none_or(|filter| filter(origin))
    }
}

impl NameResolver for ServiceDescriptorResolver {
    fn resolve(&self, source: &Source, capability: &str) -> Result<BTreeSet<String>, LoadError> {
        let path = self.descriptor_path(capability);
        let mut names = BTreeSet::new();
        match source {
            Source::Archive(archive_path) => {
                if self.accepts(&file_url(archive_path)?)
                    && let Some(content) = PluginArchive::open(archive_path)?.entry(&path)?
                {
                    parse_descriptor(&String::from_utf8_lossy(&content), &mut names);
                }
            }
            Source::Scope(scope) => {
                for resource in scope.resources(&path)? {
                    if self.accepts(resource.origin()) {
                        parse_descriptor(&String::from_utf8_lossy(resource.content()), &mut names);
                    }
                }
            }
        }
        Ok(names)
    }
}

impl fmt::Debug for ServiceDescriptorResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptorResolver")
            .field("prefix", &self.prefix)
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}

/// Adds the names listed in a descriptor to `names`.
pub(crate) fn parse_descriptor(text: &str, names: &mut BTreeSet<String>) {
    for line in text.lines() {
        let content = line.split_once('#').map_or(line, |(head, _)| head).trim();
        if !content.is_empty() {
            names.insert(content.to_owned());
        }
    }
}
