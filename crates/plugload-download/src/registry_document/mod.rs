//! Parsing of the remote registry document.
//!
//! The registry maps plugin keys to artifact locations. The document format
//! is pluggable; [`JsonRegistryParser`] reads a flat JSON object.

use std::collections::BTreeMap;

use url::Url;

use crate::error::DownloadError;

/// Key to artifact location map.
pub type RegistryMap = BTreeMap<String, Url>;

/// Turns a registry document into a [`RegistryMap`].
pub trait RegistryParser: Send + Sync {
    /// Parses `body`, fetched from `base`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Registry`] when the document is malformed.
    fn parse(&self, base: &Url, body: &[u8]) -> Result<RegistryMap, DownloadError>;
}

impl<F> RegistryParser for F
where
    F: Fn(&Url, &[u8]) -> Result<RegistryMap, DownloadError> + Send + Sync,
{
    fn parse(&self, base: &Url, body: &[u8]) -> Result<RegistryMap, DownloadError> {
        self(base, body)
    }
}

/// Reads `{"key": "location", ...}`.
///
/// Relative locations are resolved against the registry URL.
///
/// ```
/// use plugload_download::{JsonRegistryParser, RegistryParser};
/// use url::Url;
///
/// let base = Url::parse("https://example.com/registry.json").expect("valid URL");
/// let map = JsonRegistryParser
///     .parse(&base, br#"{"csv": "/plugins/csv.plugin"}"#)
///     .expect("valid document");
/// assert_eq!(map["csv"].as_str(), "https://example.com/plugins/csv.plugin");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRegistryParser;

impl RegistryParser for JsonRegistryParser {
    fn parse(&self, base: &Url, body: &[u8]) -> Result<RegistryMap, DownloadError> {
        let entries: BTreeMap<String, String> = serde_json::from_slice(body)
            .map_err(|error| DownloadError::registry(base.as_str(), error.to_string()))?;
        entries
            .into_iter()
            .map(|(key, location)| {
                base.join(&location)
                    .map(|url| (key, url))
                    .map_err(|error| {
                        DownloadError::registry(
                            base.as_str(),
                            format!("invalid location '{location}': {error}"),
                        )
                    })
            })
            .collect()
    }
}
