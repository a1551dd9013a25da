//! Registry-driven artifact downloads.
//!
//! [`PluginsDownloader`] fetches the registry document, checks that every
//! requested key is listed, and downloads each distinct artifact into the
//! cache directory unless a file of the same name is already there. File
//! presence is the only freshness check.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use once_cell::sync::OnceCell;
use plugload::{PluginRegistry, ScanDepth, find_files};
use plugload_config::DownloaderSettings;
use plugload_config::defaults::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_PLUGIN_WORDING};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use url::Url;

use crate::customizer::{RequestCustomizer, RequestKind, Unchanged};
use crate::error::DownloadError;
use crate::proxy::ProxySettings;
use crate::registry_document::{JsonRegistryParser, RegistryMap, RegistryParser};

const DOWNLOADER_TARGET: &str = "plugload_download::downloader";

/// Downloads plugin artifacts listed in a remote registry.
pub struct PluginsDownloader {
    registry_url: Url,
    cache_dir: Utf8PathBuf,
    proxy: Option<ProxySettings>,
    connect_timeout: Duration,
    wording: String,
    parser: Box<dyn RegistryParser>,
    customizer: Box<dyn RequestCustomizer>,
    client: OnceCell<Client>,
}

impl PluginsDownloader {
    /// Creates a downloader reading the registry at `registry_url` and
    /// storing artifacts in `cache_dir`.
    #[must_use]
    pub fn new(registry_url: Url, cache_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            registry_url,
            cache_dir: cache_dir.into(),
            proxy: None,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            wording: DEFAULT_PLUGIN_WORDING.to_owned(),
            parser: Box::new(JsonRegistryParser),
            customizer: Box::new(Unchanged),
            client: OnceCell::new(),
        }
    }

    /// Creates a downloader from its settings section.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Precondition`] when no registry URL is
    /// configured or the proxy string is malformed.
    pub fn from_settings(settings: &DownloaderSettings) -> Result<Self, DownloadError> {
        let registry_url = settings
            .registry_url()
            .cloned()
            .ok_or_else(|| DownloadError::precondition("no registry URL is configured"))?;
        let proxy = settings
            .proxy()
            .map(ProxySettings::parse_optional)
            .transpose()?
            .flatten();
        Ok(Self {
            proxy,
            connect_timeout: Duration::from_secs(settings.connect_timeout_secs()),
            wording: settings.plugin_wording().to_owned(),
            ..Self::new(registry_url, settings.cache_dir())
        })
    }

    /// Routes requests through `proxy`.
    #[must_use]
    pub fn with_proxy(mut self, proxy: ProxySettings) -> Self {
        self.proxy = Some(proxy);
        self.client = OnceCell::new();
        self
    }

    /// Overrides the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self.client = OnceCell::new();
        self
    }

    /// Overrides the word used for plugins in error messages.
    #[must_use]
    pub fn with_wording(mut self, wording: impl Into<String>) -> Self {
        self.wording = wording.into();
        self
    }

    /// Replaces the registry document parser.
    #[must_use]
    pub fn with_parser(mut self, parser: impl RegistryParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    /// Replaces the request customiser.
    #[must_use]
    pub fn with_customizer(mut self, customizer: impl RequestCustomizer + 'static) -> Self {
        self.customizer = Box::new(customizer);
        self
    }

    /// Registry document location.
    #[must_use]
    pub const fn registry_url(&self) -> &Url {
        &self.registry_url
    }

    /// Directory receiving artifacts.
    #[must_use]
    pub fn cache_dir(&self) -> &Utf8Path {
        &self.cache_dir
    }

    /// Configured proxy, if any.
    #[must_use]
    pub const fn proxy(&self) -> Option<&ProxySettings> {
        self.proxy.as_ref()
    }

    /// Word used for plugins in error messages.
    #[must_use]
    pub fn wording(&self) -> &str {
        &self.wording
    }

    fn client(&self) -> Result<&Client, DownloadError> {
        self.client.get_or_try_init(|| {
            let builder = Client::builder().connect_timeout(self.connect_timeout);
            let routed = match &self.proxy {
                Some(proxy) => builder.proxy(proxy.to_proxy()?),
                None => builder.no_proxy(),
            };
            routed
                .build()
                .map_err(|error| DownloadError::transport(self.registry_url.as_str(), error))
        })
    }

    /// Fetches and parses the registry document.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Transport`] when the request fails or does
    /// not answer `200 OK`, and [`DownloadError::Registry`] when the
    /// document cannot be parsed.
    pub fn registry_map(&self) -> Result<RegistryMap, DownloadError> {
        let url = self.registry_url.as_str();
        let request = self
            .customizer
            .customize(RequestKind::Registry, self.client()?.get(self.registry_url.clone()));
        let response = request
            .send()
            .map_err(|error| DownloadError::transport(url, error))?;
        if response.status() != StatusCode::OK {
            return Err(DownloadError::status(
                url,
                format!(
                    "unexpected status {} received while downloading {} registry",
                    response.status().as_u16(),
                    self.wording
                ),
            ));
        }
        let body = response
            .bytes()
            .map_err(|error| DownloadError::transport(url, error))?;
        let map = self.parser.parse(&self.registry_url, &body)?;
        debug!(target: DOWNLOADER_TARGET, registry = url, entries = map.len(), "fetched registry");
        Ok(map)
    }

    /// Downloads the artifacts of `keys`, returning their local paths.
    ///
    /// The result holds one path per key, in key order, so it can be zipped
    /// with `keys`. Keys sharing an artifact share its path and a single
    /// fetch. No request is sent when `keys` is empty.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Precondition`] naming every key the registry
    /// does not list, before any artifact is fetched. Transport and cache
    /// directory failures are returned as they occur.
    pub fn resolve_and_download(&self, keys: &[&str]) -> Result<Vec<Utf8PathBuf>, DownloadError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let map = self.registry_map()?;
        self.check_missing(keys.iter().copied().filter(|key| !map.contains_key(*key)))?;

        let mut fetched: BTreeMap<&str, Utf8PathBuf> = BTreeMap::new();
        let mut paths = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(url) = map.get(*key) else {
                continue;
            };
            let path = match fetched.entry(url.as_str()) {
                Entry::Occupied(known) => known.get().clone(),
                Entry::Vacant(slot) => slot.insert(self.download(url)?).clone(),
            };
            paths.push(path);
        }
        Ok(paths)
    }

    /// Downloads `keys`, lets `load` register the artifacts, and checks that
    /// every key ended up in `registry`.
    ///
    /// `load` receives the paths of [`resolve_and_download`](Self::resolve_and_download),
    /// aligned with `keys`.
    ///
    /// # Errors
    ///
    /// Returns any error of [`resolve_and_download`](Self::resolve_and_download)
    /// or `load`, and [`DownloadError::Precondition`] naming the keys still
    /// missing from `registry` afterwards.
    pub fn install<T, F>(
        &self,
        keys: &[&str],
        registry: &mut PluginRegistry<T>,
        load: F,
    ) -> Result<Vec<Utf8PathBuf>, DownloadError>
    where
        F: FnOnce(&[Utf8PathBuf], &mut PluginRegistry<T>) -> Result<(), DownloadError>,
    {
        let paths = self.resolve_and_download(keys)?;
        load(&paths, registry)?;
        self.check_missing(keys.iter().copied().filter(|key| !registry.contains(key)))?;
        info!(target: DOWNLOADER_TARGET, installed = keys.len(), "installed plugins");
        Ok(paths)
    }

    /// Deletes the regular files directly inside the cache directory.
    ///
    /// Returns `false` when the directory does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Io`] when a file cannot be deleted.
    pub fn clean(&self) -> Result<bool, DownloadError> {
        if !self.cache_dir.is_dir() {
            return Ok(false);
        }
        let files = find_files(self.cache_dir.as_std_path(), ScanDepth::ONE, |_| true)?;
        for file in &files {
            fs::remove_file(file).map_err(|error| {
                DownloadError::io(Utf8PathBuf::from(file.to_string_lossy().as_ref()), error)
            })?;
        }
        debug!(
            target: DOWNLOADER_TARGET,
            cache = %self.cache_dir,
            removed = files.len(),
            "cleaned cache"
        );
        Ok(true)
    }

    /// Local path an artifact at `url` is stored under.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Precondition`] when `url` has no file name.
    pub fn download_target(&self, url: &Url) -> Result<Utf8PathBuf, DownloadError> {
        url.path_segments()
            .and_then(|segments| segments.filter(|segment| !segment.is_empty()).next_back())
            .map(|name| self.cache_dir.join(name))
            .ok_or_else(|| DownloadError::precondition(format!("{url} does not name a file")))
    }

    fn download(&self, url: &Url) -> Result<Utf8PathBuf, DownloadError> {
        let target = self.download_target(url)?;
        if target.exists() {
            debug!(
                target: DOWNLOADER_TARGET,
                url = %url,
                path = %target,
                "artifact already cached"
            );
            return Ok(target);
        }
        fs::create_dir_all(&self.cache_dir)
            .map_err(|error| DownloadError::io(self.cache_dir.clone(), error))?;

        let request = self
            .customizer
            .customize(RequestKind::Artifact, self.client()?.get(url.clone()));
        let mut response = request
            .send()
            .map_err(|error| DownloadError::transport(url.as_str(), error))?;
        if response.status() != StatusCode::OK {
            return Err(DownloadError::status(
                url.as_str(),
                format!("unexpected status {} received", response.status().as_u16()),
            ));
        }

        let mut staged = NamedTempFile::new_in(&self.cache_dir)
            .map_err(|error| DownloadError::io(self.cache_dir.clone(), error))?;
        let written = response
            .copy_to(staged.as_file_mut())
            .map_err(|error| DownloadError::transport(url.as_str(), error))?;
        staged
            .persist(&target)
            .map_err(|error| DownloadError::io(target.clone(), error.error))?;
        debug!(
            target: DOWNLOADER_TARGET,
            url = %url,
            path = %target,
            bytes = written,
            "downloaded artifact"
        );
        Ok(target)
    }

    fn check_missing<'k>(
        &self,
        missing: impl Iterator<Item = &'k str>,
    ) -> Result<(), DownloadError> {
        let keys: BTreeSet<&str> = missing.collect();
        if keys.is_empty() {
            return Ok(());
        }
        let listed: Vec<&str> = keys.into_iter().collect();
        Err(DownloadError::precondition(format!(
            "Unable to find the following {}: [{}]",
            self.wording,
            listed.join(", ")
        )))
    }
}

impl fmt::Debug for PluginsDownloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginsDownloader")
            .field("registry_url", &self.registry_url.as_str())
            .field("cache_dir", &self.cache_dir)
            .field("proxy", &self.proxy)
            .field("connect_timeout", &self.connect_timeout)
            .field("wording", &self.wording)
            .finish_non_exhaustive()
    }
}
