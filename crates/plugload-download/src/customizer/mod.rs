//! Per-request customisation hooks.

use reqwest::blocking::RequestBuilder;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::DownloadError;

/// The kind of request being customised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Fetch of the registry document.
    Registry,
    /// Fetch of one plugin artifact.
    Artifact,
}

/// Adjusts requests before they are sent, for example to add credentials.
pub trait RequestCustomizer: Send + Sync {
    /// Returns `request` with any extra settings applied.
    fn customize(&self, kind: RequestKind, request: RequestBuilder) -> RequestBuilder;
}

impl<F> RequestCustomizer for F
where
    F: Fn(RequestKind, RequestBuilder) -> RequestBuilder + Send + Sync,
{
    fn customize(&self, kind: RequestKind, request: RequestBuilder) -> RequestBuilder {
        self(kind, request)
    }
}

/// Sends requests unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unchanged;

impl RequestCustomizer for Unchanged {
    fn customize(&self, _kind: RequestKind, request: RequestBuilder) -> RequestBuilder {
        request
    }
}

/// Adds fixed headers, either to every request or to one kind only.
#[derive(Debug, Clone, Default)]
pub struct StaticHeaders {
    registry: HeaderMap,
    artifact: HeaderMap,
}

impl StaticHeaders {
    /// Creates an empty header set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header to every request.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Precondition`] for an invalid header name or
    /// value.
    pub fn with_header(self, name: &str, value: &str) -> Result<Self, DownloadError> {
        self.with_registry_header(name, value)?
            .with_artifact_header(name, value)
    }

    /// Adds a header to registry requests.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Precondition`] for an invalid header name or
    /// value.
    pub fn with_registry_header(mut self, name: &str, value: &str) -> Result<Self, DownloadError> {
        let (header_name, header_value) = parse_header(name, value)?;
        self.registry.insert(header_name, header_value);
        Ok(self)
    }

    /// Adds a header to artifact requests.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Precondition`] for an invalid header name or
    /// value.
    pub fn with_artifact_header(mut self, name: &str, value: &str) -> Result<Self, DownloadError> {
        let (header_name, header_value) = parse_header(name, value)?;
        self.artifact.insert(header_name, header_value);
        Ok(self)
    }

    /// Headers sent with requests of `kind`.
    #[must_use]
    pub const fn headers(&self, kind: RequestKind) -> &HeaderMap {
        match kind {
            RequestKind::Registry => &self.registry,
            RequestKind::Artifact => &self.artifact,
        }
    }
}

impl RequestCustomizer for StaticHeaders {
    fn customize(&self, kind: RequestKind, request: RequestBuilder) -> RequestBuilder {
        request.headers(self.headers(kind).clone())
    }
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), DownloadError> {
    let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|error| {
        DownloadError::precondition(format!("invalid header name '{name}': {error}"))
    })?;
    let header_value = HeaderValue::from_str(value).map_err(|error| {
        DownloadError::precondition(format!("invalid value for header '{name}': {error}"))
    })?;
    Ok((header_name, header_value))
}

#[cfg(test)]
mod tests;
