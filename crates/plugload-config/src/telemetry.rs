//! Structured logging set-up for hosts embedding the plugin loader.
//!
//! The loader crates only emit `tracing` events under `plugload*` targets.
//! A host that wants to see them calls [`initialise`] once with its
//! [`TelemetrySettings`]; events go to standard error as JSON objects or
//! compact lines.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;

use crate::settings::TelemetrySettings;

static INSTALLED_FORMAT: OnceCell<LogFormat> = OnceCell::new();

/// Output format of the installed subscriber.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, fields flattened.
    #[default]
    Json,
    /// Single-line human-readable events.
    Compact,
}

/// Error returned when text does not name a [`LogFormat`].
pub type LogFormatParseError = strum::ParseError;

/// Describes the subscriber serving this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
    installed_now: bool,
}

impl TelemetryHandle {
    /// Format of the subscriber installed by the first successful call.
    #[must_use]
    pub const fn format(self) -> LogFormat {
        self.format
    }

    /// Returns `true` for the call that installed the subscriber.
    #[must_use]
    pub const fn installed_now(self) -> bool {
        self.installed_now
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter expression could not be parsed.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Another global subscriber was already installed.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(String),
}

/// Parses the filter expression of `settings`.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when the expression is malformed.
pub fn filter(settings: &TelemetrySettings) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(settings.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))
}

/// Installs the global `tracing` subscriber on first use.
///
/// Later calls leave the installed subscriber in place, even when their
/// settings differ, and report its format.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an unparsable filter and
/// [`TelemetryError::Subscriber`] if a foreign subscriber is already set.
pub fn initialise(settings: &TelemetrySettings) -> Result<TelemetryHandle, TelemetryError> {
    let mut installed_now = false;
    let format = *INSTALLED_FORMAT.get_or_try_init(|| {
        install(settings)?;
        installed_now = true;
        Ok::<_, TelemetryError>(settings.log_format())
    })?;
    Ok(TelemetryHandle {
        format,
        installed_now,
    })
}

fn install(settings: &TelemetrySettings) -> Result<(), TelemetryError> {
    let env_filter = filter(settings)?;
    let base = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(true)
        .with_timer(UtcTime::rfc_3339());
    let outcome = match settings.log_format() {
        LogFormat::Json => base
            .json()
            .flatten_event(true)
            .with_ansi(false)
            .with_env_filter(env_filter)
            .try_init(),
        LogFormat::Compact => base
            .compact()
            .with_ansi(io::stderr().is_terminal())
            .with_env_filter(env_filter)
            .try_init(),
    };
    outcome.map_err(|error| TelemetryError::Subscriber(error.to_string()))
}
