//! Client configuration for reaching the workflow server.
//!
//! Values are layered: command-line flags and environment variables (resolved
//! by the caller into an override [`ClientConfig`]) win over the YAML config
//! file, which wins over built-in defaults.
//!
//! # Example YAML
//!
//! ```yaml
//! server: argo.example.com:2746
//! base_href: /argo/
//! token: Bearer v2:abc...
//! namespace: workflows
//! secure: true
//! insecure_skip_verify: false
//! request_timeout_secs: 30
//! ```

use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Namespace used when nothing else names one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Request timeout used when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Connection and identity settings.
///
/// Every field is optional so that partial configs (a file, a set of flags)
/// can be layered with [`overlay`](ClientConfig::overlay).
///
/// # Examples
///
/// ```
/// use cronwf_client::ClientConfig;
///
/// let file = ClientConfig {
///     server: Some("argo.internal:2746".into()),
///     namespace: Some("team-a".into()),
///     ..Default::default()
/// };
/// let flags = ClientConfig {
///     namespace: Some("team-b".into()),
///     ..Default::default()
/// };
///
/// let config = file.overlay(flags);
/// assert_eq!(config.namespace(), "team-b");
/// assert_eq!(config.server_url().unwrap(), "https://argo.internal:2746/");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// `host:port` or a full `http(s)://` URL.
    pub server: Option<String>,
    /// Path prefix the server is mounted under.
    pub base_href: Option<String>,
    /// Sent as the `Authorization` header; a bare token gets a `Bearer ` prefix.
    pub token: Option<String>,
    /// Active namespace for cron workflows that do not name one.
    pub namespace: Option<String>,
    /// Use HTTPS when `server` has no scheme. Defaults to `true`.
    pub secure: Option<bool>,
    pub insecure_skip_verify: Option<bool>,
    pub request_timeout_secs: Option<u64>,
}

impl ClientConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ConfigError::IoError) if the file cannot be read,
    /// or [`YamlError`](ConfigError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// `<config dir>/cronwf/config.yaml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cronwf").join("config.yaml"))
    }

    /// Loads `path` if given, otherwise the default path if it exists.
    ///
    /// An explicitly named file must exist; a missing default file yields an
    /// empty config.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::load(path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Returns `self` with every field set in `overrides` replaced.
    pub fn overlay(self, overrides: ClientConfig) -> Self {
        Self {
            server: overrides.server.or(self.server),
            base_href: overrides.base_href.or(self.base_href),
            token: overrides.token.or(self.token),
            namespace: overrides.namespace.or(self.namespace),
            secure: overrides.secure.or(self.secure),
            insecure_skip_verify: overrides.insecure_skip_verify.or(self.insecure_skip_verify),
            request_timeout_secs: overrides.request_timeout_secs.or(self.request_timeout_secs),
        }
    }

    /// The active namespace, falling back to [`DEFAULT_NAMESPACE`].
    pub fn namespace(&self) -> &str {
        self.namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .unwrap_or(DEFAULT_NAMESPACE)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Authorization header value, if a token is configured.
    pub fn authorization(&self) -> Option<String> {
        let token = self.token.as_deref()?.trim();
        if token.is_empty() {
            None
        } else if token.starts_with("Bearer ") || token.starts_with("Basic ") {
            Some(token.to_string())
        } else {
            Some(format!("Bearer {token}"))
        }
    }

    /// Base URL of the server API, always ending in `/`.
    ///
    /// # Errors
    ///
    /// Returns [`MissingServer`](ConfigError::MissingServer) if no server is
    /// set, or [`InvalidServer`](ConfigError::InvalidServer) if it contains
    /// whitespace or an unsupported scheme.
    pub fn server_url(&self) -> Result<String, ConfigError> {
        let server = self
            .server
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingServer)?;
        if server.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidServer(server.to_string()));
        }

        let root = if server.starts_with("http://") || server.starts_with("https://") {
            server.trim_end_matches('/').to_string()
        } else if server.contains("://") {
            return Err(ConfigError::InvalidServer(server.to_string()));
        } else {
            let scheme = if self.secure.unwrap_or(true) { "https" } else { "http" };
            format!("{scheme}://{}", server.trim_end_matches('/'))
        };

        let base = self
            .base_href
            .as_deref()
            .unwrap_or("")
            .trim_matches('/');
        if base.is_empty() {
            Ok(format!("{root}/"))
        } else {
            Ok(format!("{root}/{base}/"))
        }
    }
}
