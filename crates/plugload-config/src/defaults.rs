//! Default values shared by the loader, scanner, and downloader.

use camino::Utf8PathBuf;

/// File-name suffix identifying plugin archives during folder scans.
pub const DEFAULT_ARCHIVE_EXTENSION: &str = ".plugin";

/// Manifest attribute listing the plugin declarations of an archive.
pub const DEFAULT_CLASS_ATTRIBUTE: &str = "Plugin-Class";

/// Manifest attribute naming the native library entry inside an archive.
pub const DEFAULT_LIBRARY_ATTRIBUTE: &str = "Plugin-Library";

/// Directory holding service descriptor files inside archives and scopes.
pub const DEFAULT_DESCRIPTOR_PREFIX: &str = "META-INF/services";

/// Location of the metadata header inside an archive.
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// Default number of directory levels searched by folder scans.
pub const DEFAULT_SCAN_DEPTH: usize = 1;

/// Default connect timeout applied to registry and artifact requests.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default wording used in human-readable download errors.
pub const DEFAULT_PLUGIN_WORDING: &str = "plugin";

/// Default local directory receiving downloaded artifacts.
pub const DEFAULT_CACHE_DIR: &str = "plugins";

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

pub(crate) fn default_archive_extension() -> String {
    DEFAULT_ARCHIVE_EXTENSION.to_owned()
}

pub(crate) fn default_class_attribute() -> String {
    DEFAULT_CLASS_ATTRIBUTE.to_owned()
}

pub(crate) fn default_library_attribute() -> String {
    DEFAULT_LIBRARY_ATTRIBUTE.to_owned()
}

pub(crate) fn default_descriptor_prefix() -> String {
    DEFAULT_DESCRIPTOR_PREFIX.to_owned()
}

pub(crate) const fn default_scan_depth() -> usize {
    DEFAULT_SCAN_DEPTH
}

pub(crate) const fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

pub(crate) fn default_plugin_wording() -> String {
    DEFAULT_PLUGIN_WORDING.to_owned()
}

pub(crate) fn default_cache_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_CACHE_DIR)
}

pub(crate) fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
pub(crate) const fn default_log_format() -> crate::telemetry::LogFormat {
    crate::telemetry::LogFormat::Json
}
