//! # CLI Settings
//!
//! Settings come from three layers, highest precedence first: the YAML file
//! given with `--config`, `EXN_*` environment variables, then defaults.
//! Backend settings are only required by commands that talk to the backend.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use exn_client::config::DEFAULT_SITE_URL;
use exn_client::PortalApiConfig;
use exn_core::admin::{DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME};
use exn_core::AdminCredentials;

/// Directory used for local state when none is configured.
pub const DEFAULT_STATE_DIR: &str = ".exn";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Contents of a `--config` YAML file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub site_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub state_dir: Option<PathBuf>,
}

impl FileConfig {
    /// Parse a YAML settings file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

/// Resolved settings.
#[derive(Debug, Clone)]
pub struct Settings {
    supabase_url: Option<String>,
    supabase_anon_key: Option<String>,
    site_url: String,
    timeout_secs: u64,
    pub admin: AdminCredentials,
    pub state_dir: PathBuf,
}

impl Settings {
    /// Resolve settings from an optional file, the process environment and
    /// an explicit `--state-dir`.
    pub fn resolve(config: Option<&Path>, state_dir: Option<&Path>) -> Result<Self> {
        let file = match config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Ok(Self::layer(file, |name| std::env::var(name).ok(), state_dir))
    }

    /// Merge `file` over values looked up with `env`.
    pub fn layer<F>(file: FileConfig, env: F, state_dir: Option<&Path>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = file
            .admin_username
            .or_else(|| env("EXN_ADMIN_USERNAME"))
            .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string());
        let password = file
            .admin_password
            .or_else(|| env("EXN_ADMIN_PASSWORD"))
            .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string());

        Self {
            supabase_url: file.supabase_url.or_else(|| env("EXN_SUPABASE_URL")),
            supabase_anon_key: file
                .supabase_anon_key
                .or_else(|| env("EXN_SUPABASE_ANON_KEY")),
            site_url: file
                .site_url
                .or_else(|| env("EXN_SITE_URL"))
                .unwrap_or_else(|| DEFAULT_SITE_URL.to_string()),
            timeout_secs: file
                .timeout_secs
                .or_else(|| env("EXN_TIMEOUT_SECS").and_then(|s| s.parse().ok()))
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            admin: AdminCredentials::new(username, password),
            state_dir: state_dir
                .map(Path::to_path_buf)
                .or(file.state_dir)
                .or_else(|| env("EXN_STATE_DIR").map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR)),
        }
    }

    /// Backend connection settings.
    pub fn api_config(&self) -> Result<PortalApiConfig> {
        let url = self
            .supabase_url
            .as_deref()
            .context("backend URL not configured (set EXN_SUPABASE_URL or supabase_url)")?;
        let key = self.supabase_anon_key.as_deref().context(
            "backend key not configured (set EXN_SUPABASE_ANON_KEY or supabase_anon_key)",
        )?;
        PortalApiConfig::new(url, key, &self.site_url, self.timeout_secs)
            .context("invalid backend configuration")
    }
}
