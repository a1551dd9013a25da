//! Keyed plugin registry.
//!
//! The [`PluginRegistry`] stores one plugin per key, where the key is
//! derived from the plugin by a caller-supplied function. Registering a
//! plugin under an existing key replaces the previous one.

use std::collections::BTreeMap;
use std::fmt;

use crate::plugin::Plugin;

type KeyFn<T> = Box<dyn Fn(&T) -> String + Send + Sync>;

/// Registry of plugins keyed by a derived string.
///
/// # Example
///
/// ```
/// use plugload::PluginRegistry;
///
/// let mut registry = PluginRegistry::new(|name: &String| name.to_lowercase());
/// assert!(registry.register("Rope".to_owned()).is_none());
/// assert_eq!(registry.get("rope").map(String::as_str), Some("Rope"));
/// ```
pub struct PluginRegistry<T> {
    key_fn: KeyFn<T>,
    plugins: BTreeMap<String, T>,
}

impl<T> PluginRegistry<T> {
    /// Creates an empty registry deriving keys with `key_fn`.
    #[must_use]
    pub fn new<F>(key_fn: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        Self {
            key_fn: Box::new(key_fn),
            plugins: BTreeMap::new(),
        }
    }

    /// Derives the key `plugin` would be registered under.
    #[must_use]
    pub fn key_of(&self, plugin: &T) -> String {
        (self.key_fn)(plugin)
    }

    /// Registers `plugin`, returning the plugin it replaced, if any.
    pub fn register(&mut self, plugin: T) -> Option<T> {
        let key = self.key_of(&plugin);
        self.plugins.insert(key, plugin)
    }

    /// Registers every plugin, returning the keys that were not registered
    /// before the call.
    ///
    /// A key that appears twice in `plugins` is reported once; the later
    /// plugin wins.
    pub fn register_all(&mut self, plugins: impl IntoIterator<Item = T>) -> Vec<String> {
        let mut added = Vec::new();
        for plugin in plugins {
            let key = self.key_of(&plugin);
            if self.plugins.insert(key.clone(), plugin).is_none() {
                added.push(key);
            }
        }
        added
    }

    /// Removes and returns the plugin registered under `key`.
    pub fn unregister(&mut self, key: &str) -> Option<T> {
        self.plugins.remove(key)
    }

    /// Looks up the plugin registered under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&T> {
        self.plugins.get(key)
    }

    /// Returns `true` when a plugin is registered under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.plugins.contains_key(key)
    }

    /// Registered plugins, ordered by key.
    pub fn loaded(&self) -> impl Iterator<Item = (&str, &T)> {
        self.plugins.iter().map(|(key, plugin)| (key.as_str(), plugin))
    }

    /// Registered keys, in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }

    /// Returns the subset of `keys` that has no registered plugin, in input
    /// order.
    #[must_use]
    pub fn missing<'k>(&self, keys: impl IntoIterator<Item = &'k str>) -> Vec<String> {
        keys.into_iter()
            .filter(|key| !self.contains(key))
            .map(ToOwned::to_owned)
            .collect()
    }

    /// Number of registered plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl<T: 'static> PluginRegistry<Plugin<T>> {
    /// Creates a registry of loaded plugins keyed by candidate name.
    #[must_use]
    pub fn by_name() -> Self {
        Self::new(|plugin: &Plugin<T>| plugin.name().to_owned())
    }
}

impl<T: fmt::Debug> fmt::Debug for PluginRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.plugins)
            .finish_non_exhaustive()
    }
}
