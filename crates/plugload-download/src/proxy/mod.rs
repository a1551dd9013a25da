//! Proxy settings in `[user[:password]@]host:port` form.

use std::fmt;
use std::str::FromStr;

use crate::error::DownloadError;

const PROXY_FORM: &str = "proxy should be of the form [user[:password]@]host:port";

/// Credentials sent to an authenticating proxy.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyCredentials {
    user: String,
    password: Option<String>,
}

impl ProxyCredentials {
    /// Creates credentials for `user`, optionally with a password.
    #[must_use]
    pub fn new(user: impl Into<String>, password: Option<String>) -> Self {
        Self {
            user: user.into(),
            password,
        }
    }

    /// User name.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Password, if any.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    fn parse(text: &str) -> Self {
        text.split_once(':').map_or_else(
            || Self::new(text, None),
            |(user, password)| Self::new(user, Some(password.to_owned())),
        )
    }
}

impl fmt::Debug for ProxyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyCredentials")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// An HTTP proxy used for registry and artifact requests.
///
/// ```
/// use plugload_download::ProxySettings;
///
/// let proxy: ProxySettings = "ada:secret@proxy.local:3128".parse().expect("valid proxy");
/// assert_eq!(proxy.host(), "proxy.local");
/// assert_eq!(proxy.port(), 3128);
/// assert_eq!(proxy.to_string(), "ada:secret@proxy.local:3128");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    host: String,
    port: u16,
    credentials: Option<ProxyCredentials>,
}

impl ProxySettings {
    /// Creates settings for `host:port` without credentials.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            credentials: None,
        }
    }

    /// Adds credentials.
    #[must_use]
    pub fn with_credentials(mut self, credentials: ProxyCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Parses an optional proxy string. Blank text means no proxy.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Precondition`] when the host or port is
    /// missing or the port is not a number between 1 and 65535.
    pub fn parse_optional(text: &str) -> Result<Option<Self>, DownloadError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        text.parse().map(Some)
    }

    /// Proxy host name or address.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Proxy port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Credentials, if the proxy authenticates.
    #[must_use]
    pub const fn credentials(&self) -> Option<&ProxyCredentials> {
        self.credentials.as_ref()
    }

    /// Builds the client-side proxy routing every request through `self`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Precondition`] when the host does not form
    /// a valid proxy URL.
    pub fn to_proxy(&self) -> Result<reqwest::Proxy, DownloadError> {
        let proxy = reqwest::Proxy::all(format!("http://{}:{}", self.host, self.port))
            .map_err(|error| {
                DownloadError::precondition(format!("invalid proxy {self}: {error}"))
            })?;
        let Some(credentials) = &self.credentials else {
            return Ok(proxy);
        };
        Ok(proxy.basic_auth(credentials.user(), credentials.password().unwrap_or_default()))
    }
}

impl FromStr for ProxySettings {
    type Err = DownloadError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        let (credentials, address) = trimmed
            .rsplit_once('@')
            .map_or((None, trimmed), |(login, address)| {
                (Some(ProxyCredentials::parse(login)), address)
            });
        let (host, port) = address.rsplit_once(':').ok_or_else(|| {
            DownloadError::precondition(format!("missing port in '{text}': {PROXY_FORM}"))
        })?;
        if host.is_empty() {
            return Err(DownloadError::precondition(format!(
                "missing host in '{text}': {PROXY_FORM}"
            )));
        }
        let number = port
            .parse::<u16>()
            .ok()
            .filter(|value| *value > 0)
            .ok_or_else(|| {
                DownloadError::precondition(format!("invalid port in '{text}': {PROXY_FORM}"))
            })?;
        Ok(Self {
            host: host.to_owned(),
            port: number,
            credentials,
        })
    }
}

impl fmt::Display for ProxySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(credentials) = &self.credentials {
            f.write_str(credentials.user())?;
            if let Some(password) = credentials.password() {
                write!(f, ":{password}")?;
            }
            f.write_str("@")?;
        }
        write!(f, "{}:{}", self.host, self.port)
    }
}
