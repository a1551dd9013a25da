//! Resolution from a manifest attribute.

use std::collections::BTreeSet;

use plugload_config::LoaderSettings;
use plugload_config::defaults::{DEFAULT_CLASS_ATTRIBUTE, MANIFEST_PATH};

use super::NameResolver;
use crate::archive::PluginArchive;
use crate::error::LoadError;
use crate::manifest::Manifest;
use crate::scope::Source;

/// Reads candidate names from one manifest attribute.
///
/// The attribute value is a comma-separated list. The capability name is
/// not consulted: every listed declaration becomes a candidate and the
/// loader checks what it implements.
#[derive(Debug, Clone)]
pub struct ManifestAttributeResolver {
    attribute: String,
}

impl Default for ManifestAttributeResolver {
    fn default() -> Self {
        Self::new(DEFAULT_CLASS_ATTRIBUTE)
    }
}

impl ManifestAttributeResolver {
    /// Creates a resolver reading `attribute`.
    #[must_use]
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
        }
    }

    /// Creates a resolver from loader settings.
    #[must_use]
    pub fn from_settings(settings: &LoaderSettings) -> Self {
        Self::new(settings.class_attribute())
    }

    /// Attribute the resolver reads.
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }
}

impl NameResolver for ManifestAttributeResolver {
    fn resolve(&self, source: &Source, _capability: &str) -> Result<BTreeSet<String>, LoadError> {
        match source {
            Source::Archive(path) => Ok(PluginArchive::open(path)?
                .manifest()?
                .map(|manifest| manifest.list(&self.attribute))
                .unwrap_or_default()),
            Source::Scope(scope) => Ok(scope
                .resources(MANIFEST_PATH)?
                .iter()
                .flat_map(|resource| {
                    Manifest::parse(&String::from_utf8_lossy(resource.content()))
                        .list(&self.attribute)
                })
                .collect()),
        }
    }
}
