//! Dashboard configuration.
//!
//! Values come from the environment with sensible defaults, so the CLI runs
//! against the shop's server without any setup.

use std::net::Ipv4Addr;
use std::time::Duration;

use tracing::warn;

pub const ENV_API_URL: &str = "POS_DASHBOARD_API_URL";
pub const ENV_AUTH_URL: &str = "POS_DASHBOARD_AUTH_URL";
pub const ENV_TIMEOUT_SECS: &str = "POS_DASHBOARD_TIMEOUT_SECS";

const DEFAULT_API_URL: &str = "http://103.14.120.41";
const DEFAULT_AUTH_URL: &str = "http://103.14.120.41:8000";

/// Default timeout for API requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_LOG_FILTER: &str = "info,pos_sales_dashboard=debug";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Origin serving `/api/sales/...` and `/api/customers`.
    pub api_url: String,
    /// Origin serving `/api/login/`.
    pub auth_url: String,
    pub request_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl DashboardConfig {
    pub fn new(api_url: &str, auth_url: &str) -> Self {
        Self {
            api_url: normalize_api_url(api_url),
            auth_url: normalize_api_url(auth_url),
            request_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Read overrides from the environment; blank or invalid values fall
    /// back to the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(url) = read_env(ENV_API_URL) {
            config.api_url = normalize_api_url(&url);
        }
        if let Some(url) = read_env(ENV_AUTH_URL) {
            config.auth_url = normalize_api_url(&url);
        }
        if let Some(raw) = read_env(ENV_TIMEOUT_SECS) {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => warn!(value = %raw, "ignoring invalid {ENV_TIMEOUT_SECS}"),
            }
        }

        config
    }
}

fn read_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Normalise a server URL:
/// - ensure a scheme is present (http for localhost and bare IP hosts,
///   https otherwise)
/// - strip trailing slashes
/// - strip a trailing `/api` segment
pub fn normalize_api_url(url: &str) -> String {
    let mut url = url.trim().to_string();
    if url.is_empty() {
        return url;
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        if is_plain_http_host(&url) {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    while url.ends_with('/') {
        url.pop();
    }

    if url.ends_with("/api") {
        url.truncate(url.len() - 4);
    }

    while url.ends_with('/') {
        url.pop();
    }

    url
}

/// Hosts the shop reaches over plain http: localhost and bare IP addresses.
fn is_plain_http_host(url: &str) -> bool {
    let host = url.split(['/', ':']).next().unwrap_or_default();
    host == "localhost" || host.parse::<Ipv4Addr>().is_ok()
}
