//! Serde-backed settings consumed by the loader, scanner, and downloader.
//!
//! Every field has a default so a partial TOML document (or none at all)
//! yields a usable configuration.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::defaults::{
    default_archive_extension, default_cache_dir, default_class_attribute,
    default_connect_timeout_secs, default_descriptor_prefix, default_library_attribute,
    default_log_filter, default_log_format, default_plugin_wording, default_scan_depth,
};
use crate::telemetry::LogFormat;

/// Errors raised while reading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("failed to read settings from {path}: {source}")]
    Read {
        /// File that was read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },
    /// The settings document is not valid TOML or has the wrong shape.
    #[error("invalid settings document: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level settings document.
///
/// ```
/// use plugload_config::Settings;
///
/// let settings = Settings::from_toml_str("[loader]\nscan_depth = 3\n")
///     .expect("valid settings");
/// assert_eq!(settings.loader().scan_depth(), 3);
/// assert_eq!(settings.loader().archive_extension(), ".plugin");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    loader: LoaderSettings,
    downloader: DownloaderSettings,
    telemetry: TelemetrySettings,
}

impl Settings {
    /// Parses settings from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the document is malformed.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(document)?)
    }

    /// Reads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read and
    /// [`ConfigError::Parse`] when its content is malformed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let document = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source: Arc::new(source),
        })?;
        Self::from_toml_str(&document)
    }

    /// Returns the loader section.
    #[must_use]
    pub const fn loader(&self) -> &LoaderSettings {
        &self.loader
    }

    /// Returns the downloader section.
    #[must_use]
    pub const fn downloader(&self) -> &DownloaderSettings {
        &self.downloader
    }

    /// Returns the telemetry section.
    #[must_use]
    pub const fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }
}

/// Settings for name resolution, archive opening, and folder scans.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoaderSettings {
    archive_extension: String,
    class_attribute: String,
    library_attribute: String,
    descriptor_prefix: String,
    scan_depth: usize,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            archive_extension: default_archive_extension(),
            class_attribute: default_class_attribute(),
            library_attribute: default_library_attribute(),
            descriptor_prefix: default_descriptor_prefix(),
            scan_depth: default_scan_depth(),
        }
    }
}

impl LoaderSettings {
    /// Overrides the archive file-name suffix.
    #[must_use]
    pub fn with_archive_extension(mut self, extension: impl Into<String>) -> Self {
        self.archive_extension = extension.into();
        self
    }

    /// Overrides the manifest attribute listing plugin declarations.
    #[must_use]
    pub fn with_class_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.class_attribute = attribute.into();
        self
    }

    /// Overrides the default scan depth.
    #[must_use]
    pub const fn with_scan_depth(mut self, depth: usize) -> Self {
        self.scan_depth = depth;
        self
    }

    /// File-name suffix identifying plugin archives.
    #[must_use]
    pub const fn archive_extension(&self) -> &str {
        self.archive_extension.as_str()
    }

    /// Manifest attribute listing plugin declarations.
    #[must_use]
    pub const fn class_attribute(&self) -> &str {
        self.class_attribute.as_str()
    }

    /// Manifest attribute naming the native library entry.
    #[must_use]
    pub const fn library_attribute(&self) -> &str {
        self.library_attribute.as_str()
    }

    /// Directory of service descriptor files.
    #[must_use]
    pub const fn descriptor_prefix(&self) -> &str {
        self.descriptor_prefix.as_str()
    }

    /// Default number of directory levels searched by scans.
    #[must_use]
    pub const fn scan_depth(&self) -> usize {
        self.scan_depth
    }
}

/// Settings for the remote registry downloader.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DownloaderSettings {
    registry_url: Option<Url>,
    cache_dir: Utf8PathBuf,
    proxy: Option<String>,
    connect_timeout_secs: u64,
    plugin_wording: String,
}

impl Default for DownloaderSettings {
    fn default() -> Self {
        Self {
            registry_url: None,
            cache_dir: default_cache_dir(),
            proxy: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            plugin_wording: default_plugin_wording(),
        }
    }
}

impl DownloaderSettings {
    /// Sets the registry document location.
    #[must_use]
    pub fn with_registry_url(mut self, url: Url) -> Self {
        self.registry_url = Some(url);
        self
    }

    /// Sets the local cache directory.
    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Sets the proxy, in `[user[:password]@]host:port` form.
    #[must_use]
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Location of the registry document, if configured.
    #[must_use]
    pub const fn registry_url(&self) -> Option<&Url> {
        self.registry_url.as_ref()
    }

    /// Directory receiving downloaded artifacts.
    #[must_use]
    pub fn cache_dir(&self) -> &Utf8Path {
        &self.cache_dir
    }

    /// Raw proxy string, if configured.
    #[must_use]
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    /// Connect timeout for registry and artifact requests.
    #[must_use]
    pub const fn connect_timeout_secs(&self) -> u64 {
        self.connect_timeout_secs
    }

    /// Word used for plugins in error messages.
    #[must_use]
    pub const fn plugin_wording(&self) -> &str {
        self.plugin_wording.as_str()
    }
}

/// Settings for [`crate::telemetry::initialise`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetrySettings {
    log_filter: String,
    log_format: LogFormat,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            log_format: default_log_format(),
        }
    }
}

impl TelemetrySettings {
    /// Overrides the filter expression.
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Overrides the output format.
    #[must_use]
    pub const fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// `EnvFilter` expression.
    #[must_use]
    pub const fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
