//! Backend client configuration.
//!
//! The backend is a single hosted project URL. The auth API lives under
//! `auth/v1` and the table API under `rest/v1` of that URL. Every request
//! carries the project's public (anon) key.

use url::Url;
use zeroize::Zeroizing;

/// Site URL used in email links when none is configured.
pub const DEFAULT_SITE_URL: &str = "http://localhost:5173";

/// Configuration for connecting to the backend.
///
/// Custom `Debug` implementation redacts the `anon_key` field
/// to prevent credential leakage in log output.
#[derive(Clone)]
pub struct PortalApiConfig {
    /// Project base URL, e.g. `https://abcd.supabase.co`.
    pub project_url: Url,
    /// Public API key sent as `apikey` and as the default bearer token.
    pub anon_key: Zeroizing<String>,
    /// Public site URL, used to build email redirect links
    /// (`/auth/callback`, `/reset-password`).
    pub site_url: Url,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for PortalApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalApiConfig")
            .field("project_url", &self.project_url)
            .field("anon_key", &"[REDACTED]")
            .field("site_url", &self.site_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl PortalApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `EXN_SUPABASE_URL` (required)
    /// - `EXN_SUPABASE_ANON_KEY` (required)
    /// - `EXN_SITE_URL` (default: `http://localhost:5173`)
    /// - `EXN_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_url =
            std::env::var("EXN_SUPABASE_URL").map_err(|_| ConfigError::MissingUrl)?;
        let anon_key =
            std::env::var("EXN_SUPABASE_ANON_KEY").map_err(|_| ConfigError::MissingKey)?;
        if anon_key.trim().is_empty() {
            return Err(ConfigError::MissingKey);
        }

        Ok(Self {
            project_url: parse_url("EXN_SUPABASE_URL", &raw_url)?,
            anon_key: Zeroizing::new(anon_key),
            site_url: env_url("EXN_SITE_URL", DEFAULT_SITE_URL)?,
            timeout_secs: std::env::var("EXN_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        })
    }

    /// Build a configuration from explicit values.
    pub fn new(
        project_url: &str,
        anon_key: &str,
        site_url: &str,
        timeout_secs: u64,
    ) -> Result<Self, ConfigError> {
        if anon_key.trim().is_empty() {
            return Err(ConfigError::MissingKey);
        }
        Ok(Self {
            project_url: parse_url("project URL", project_url)?,
            anon_key: Zeroizing::new(anon_key.to_string()),
            site_url: parse_url("site URL", site_url)?,
            timeout_secs,
        })
    }

    /// Create a configuration pointing at a local stub server (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if the localhost URL cannot be parsed
    /// (not expected for any port number).
    pub fn local_stub(port: u16, anon_key: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            project_url: parse_url("localhost", &format!("http://127.0.0.1:{port}"))?,
            anon_key: Zeroizing::new(anon_key.to_string()),
            site_url: parse_url("localhost", DEFAULT_SITE_URL)?,
            timeout_secs: 5,
        })
    }

    /// Absolute URL of a site page, e.g. `site_path("/auth/callback")`.
    pub fn site_path(&self, path: &str) -> String {
        format!("{}{}", self.site_url.as_str().trim_end_matches('/'), path)
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    parse_url(var, &raw)
}

/// Parse a base URL, normalizing it to end in `/` so relative joins keep
/// any path prefix.
pub(crate) fn parse_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(name.to_string(), e.to_string()))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("EXN_SUPABASE_URL environment variable is required")]
    MissingUrl,
    #[error("EXN_SUPABASE_ANON_KEY environment variable is required")]
    MissingKey,
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}
