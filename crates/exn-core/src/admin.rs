//! # Admin Sessions
//!
//! The admin panel is guarded by a single configured username/password.
//! A successful login stores [`ADMIN_TOKEN`] together with the login time;
//! the session is valid for [`ADMIN_SESSION_TTL_MS`] after that.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// Token value stored after a successful admin login.
pub const ADMIN_TOKEN: &str = "admin_authenticated";

/// Admin session lifetime: two hours, in milliseconds.
pub const ADMIN_SESSION_TTL_MS: i64 = 2 * 60 * 60 * 1000;

/// Username used when none is configured.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Password used when none is configured.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Configured admin login.
///
/// `Debug` redacts the password.
#[derive(Clone)]
pub struct AdminCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Default for AdminCredentials {
    fn default() -> Self {
        Self::new(DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD)
    }
}

impl AdminCredentials {
    /// Credentials from explicit values.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    /// Configured username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Whether these are the built-in defaults.
    pub fn is_default(&self) -> bool {
        self.username == DEFAULT_ADMIN_USERNAME && self.password.as_str() == DEFAULT_ADMIN_PASSWORD
    }

    /// Compare a login attempt in constant time.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let user_ok = constant_time_eq(username, &self.username);
        let pass_ok = constant_time_eq(password, &self.password);
        user_ok & pass_ok
    }
}

fn constant_time_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        // Keep timing independent of where the mismatch is.
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// A stored admin login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSession {
    /// Always [`ADMIN_TOKEN`] for sessions this crate creates.
    pub token: String,
    /// Login time, epoch milliseconds.
    pub login_time_ms: i64,
}

impl AdminSession {
    /// A session starting at `now`.
    pub fn start(now: DateTime<Utc>) -> Self {
        Self {
            token: ADMIN_TOKEN.to_string(),
            login_time_ms: now.timestamp_millis(),
        }
    }

    /// Whether the session is still valid at `now`: the token is
    /// [`ADMIN_TOKEN`] and less than two hours have elapsed.
    ///
    /// The login time comes from an editable file. One later than `now`,
    /// or too far from it to subtract, makes the session invalid.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.token == ADMIN_TOKEN
            && self
                .elapsed_ms(now)
                .is_some_and(|elapsed| elapsed < ADMIN_SESSION_TTL_MS)
    }

    /// Instant the session stops being valid, if it is representable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.login_time_ms
            .checked_add(ADMIN_SESSION_TTL_MS)
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }

    /// Milliseconds left at `now`, zero once expired or invalid.
    pub fn remaining_ms(&self, now: DateTime<Utc>) -> i64 {
        self.elapsed_ms(now)
            .map_or(0, |elapsed| (ADMIN_SESSION_TTL_MS - elapsed).max(0))
    }

    fn elapsed_ms(&self, now: DateTime<Utc>) -> Option<i64> {
        now.timestamp_millis()
            .checked_sub(self.login_time_ms)
            .filter(|elapsed| *elapsed >= 0)
    }
}
