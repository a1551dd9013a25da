//! Shared configuration for the `plugload` crates.
//!
//! [`Settings`] groups the loader, downloader, and telemetry sections, each
//! defaulted from the constants in [`defaults`]. Hosts either build the
//! sections programmatically or read them from a TOML file.

pub mod defaults;
mod settings;
pub mod telemetry;

pub use settings::{ConfigError, DownloaderSettings, LoaderSettings, Settings, TelemetrySettings};
pub use telemetry::{LogFormat, LogFormatParseError};
