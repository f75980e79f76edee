//! # Local Client State
//!
//! The signed-in user, their session tokens and the admin login are kept in
//! a single JSON file under the state directory. A missing file is an empty
//! state. Every save replaces the whole file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use exn_client::Session;
use exn_core::{AdminSession, UserId, UserProfile};

const STATE_FILE: &str = "state.json";

/// Persisted client state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalState {
    pub is_logged_in: bool,
    pub user: Option<UserProfile>,
    pub session: Option<Session>,
    pub admin_token: Option<String>,
    /// Admin login time, epoch milliseconds.
    pub admin_login_time: Option<i64>,
}

/// Result of checking the stored admin login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCheck {
    Valid(AdminSession),
    /// A login was stored but is expired or malformed; it has been cleared.
    Expired,
    Missing,
}

impl LocalState {
    /// Record a user sign-in.
    pub fn sign_in(&mut self, profile: UserProfile, session: Session) {
        self.is_logged_in = true;
        self.user = Some(profile);
        self.session = Some(session);
    }

    /// Forget the signed-in user. The admin login is kept.
    pub fn sign_out(&mut self) {
        self.is_logged_in = false;
        self.user = None;
        self.session = None;
    }

    /// The signed-in user's number, if any.
    pub fn user_id(&self) -> Option<UserId> {
        if !self.is_logged_in {
            return None;
        }
        self.user.as_ref().map(|u| u.user_id)
    }

    /// The signed-in user's access token, if any.
    pub fn access_token(&self) -> Option<&str> {
        if !self.is_logged_in {
            return None;
        }
        self.session.as_ref().map(|s| s.access_token.as_str())
    }

    /// Record an admin login at `now`.
    pub fn start_admin(&mut self, now: DateTime<Utc>) -> AdminSession {
        let session = AdminSession::start(now);
        self.admin_token = Some(session.token.clone());
        self.admin_login_time = Some(session.login_time_ms);
        session
    }

    /// Forget the admin login.
    pub fn clear_admin(&mut self) {
        self.admin_token = None;
        self.admin_login_time = None;
    }

    /// Check the stored admin login at `now`, clearing it when it is no
    /// longer valid.
    pub fn check_admin(&mut self, now: DateTime<Utc>) -> AdminCheck {
        match (&self.admin_token, self.admin_login_time) {
            (None, None) => AdminCheck::Missing,
            (Some(token), Some(login_time_ms)) => {
                let session = AdminSession {
                    token: token.clone(),
                    login_time_ms,
                };
                if session.is_valid_at(now) {
                    AdminCheck::Valid(session)
                } else {
                    self.clear_admin();
                    AdminCheck::Expired
                }
            }
            _ => {
                self.clear_admin();
                AdminCheck::Expired
            }
        }
    }
}

/// File-backed [`LocalState`] store.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Store rooted at `state_dir`.
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(STATE_FILE),
        }
    }

    /// Path of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the state; an absent file is an empty state.
    pub fn load(&self) -> Result<LocalState> {
        if !self.path.exists() {
            return Ok(LocalState::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("corrupt state file {}", self.path.display()))
    }

    /// Replace the stored state.
    pub fn save(&self, state: &LocalState) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).context("failed to create state directory")?;
        }
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "state saved");
        Ok(())
    }
}
