//! Fetching plugin archives from a remote registry.
//!
//! A registry is a document mapping plugin keys to artifact locations.
//! [`PluginsDownloader`] resolves requested keys against it, downloads the
//! missing artifacts into a local cache directory, and can verify that a
//! caller-supplied loader registered every requested key afterwards.
//!
//! ```no_run
//! use plugload_download::{PluginsDownloader, StaticHeaders};
//! use url::Url;
//!
//! let registry = Url::parse("https://plugins.example.com/registry.json")?;
//! let downloader = PluginsDownloader::new(registry, "plugins")
//!     .with_customizer(StaticHeaders::new().with_header("Authorization", "Bearer token")?);
//! let _archives = downloader.resolve_and_download(&["csv", "parquet"])?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod customizer;
pub mod downloader;
pub mod error;
pub mod proxy;
pub mod registry_document;

pub use self::customizer::{RequestCustomizer, RequestKind, StaticHeaders, Unchanged};
pub use self::downloader::PluginsDownloader;
pub use self::error::DownloadError;
pub use self::proxy::{ProxyCredentials, ProxySettings};
pub use self::registry_document::{JsonRegistryParser, RegistryMap, RegistryParser};
