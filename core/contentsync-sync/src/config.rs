//! Source connection settings.

use std::net::IpAddr;
use std::path::Path;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

/// Default REST namespace the source endpoint is mounted under.
pub const DEFAULT_API_PATH: &str = "wp-json/sf-sync/v1";

/// Where the source repository lives and how to authenticate against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Site root, e.g. `https://source.example.com`.
    pub base_url: String,
    pub username: String,
    /// Application password. Spaces are ignored.
    pub app_password: String,
    /// Path of the sync API below `base_url`.
    pub api_path: String,
    /// Timeout for document fetches, in seconds.
    pub timeout_secs: u64,
    /// Timeout for connection tests, in seconds.
    pub ping_timeout_secs: u64,
    /// Retry a 401 once with credentials in the query string, for hosts
    /// that strip the `Authorization` header.
    pub query_auth_fallback: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            app_password: String::new(),
            api_path: DEFAULT_API_PATH.to_string(),
            timeout_secs: 60,
            ping_timeout_secs: 15,
            query_auth_fallback: true,
        }
    }
}

impl SourceConfig {
    /// Loads a config file, TOML when the extension is `.toml`, JSON otherwise.
    pub fn load(path: impl AsRef<Path>) -> SyncResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("{}: {e}", path.display())))?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            toml::from_str(&text).map_err(|e| SyncError::Config(format!("{}: {e}", path.display())))
        } else {
            serde_json::from_str(&text)
                .map_err(|e| SyncError::Config(format!("{}: {e}", path.display())))
        }
    }

    /// Checks that the source can be contacted with these settings.
    ///
    /// URL, username and password are all required. Plain `http` is only
    /// accepted for loopback hosts.
    pub fn validate(&self) -> SyncResult<Url> {
        if self.base_url.trim().is_empty()
            || self.username.trim().is_empty()
            || self.password().is_empty()
        {
            return Err(SyncError::NotConfigured(
                "source URL, username and application password are required".to_string(),
            ));
        }

        let url = Url::parse(self.base_url.trim())
            .map_err(|e| SyncError::Config(format!("invalid source URL {:?}: {e}", self.base_url)))?;

        match url.scheme() {
            "https" => Ok(url),
            "http" if is_loopback(&url) => Ok(url),
            scheme => Err(SyncError::Config(format!(
                "source URL must use https, got {scheme}"
            ))),
        }
    }

    /// The application password with spaces removed.
    pub fn password(&self) -> String {
        self.app_password.replace(' ', "")
    }

    /// Base URL of the sync API, without a trailing slash.
    pub fn api_base(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim().trim_end_matches('/'),
            self.api_path.trim_matches('/')
        )
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host_str() {
        Some("localhost") => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .is_ok_and(|ip| ip.is_loopback()),
        None => false,
    }
}
