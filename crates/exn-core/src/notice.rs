//! # User-Facing Notices
//!
//! Outcomes of account operations are shown to the user as short notices.
//! Service failures are mapped by matching substrings of the service's error
//! message; anything unrecognized falls back to a generic notice for the
//! operation.

use serde::Serialize;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    /// The operation succeeded.
    Success,
    /// The operation failed.
    Error,
    /// Neutral information.
    Info,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Severity.
    pub kind: NoticeKind,
    /// Text shown to the user.
    pub message: String,
}

impl Notice {
    /// A success notice.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    /// An error notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    /// An informational notice.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    /// Whether this is an error notice.
    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Account operations that produce notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthOperation {
    /// Email + password sign-in.
    SignIn,
    /// Account registration.
    SignUp,
    /// Password reset email request.
    ResetRequest,
    /// Setting a new password.
    PasswordUpdate,
    /// Re-sending the verification email.
    ResendVerification,
    /// Checking the session after following an email link.
    VerifySession,
}

impl AuthOperation {
    /// Notice for a failure reported by the service with `message`.
    pub fn rejected(self, message: &str) -> Notice {
        match self {
            AuthOperation::SignIn => {
                if message.contains("Email not confirmed") {
                    Notice::error("Please verify your email first. Check your email and spam folder.")
                } else if message.contains("Invalid") {
                    Notice::error("Invalid email or password. Please try again.")
                } else {
                    Notice::error("Login failed. Please try again.")
                }
            }
            AuthOperation::SignUp => {
                if message.contains("already registered") {
                    Notice::error("Email already registered. Please try logging in.")
                } else if message.contains("Signups not allowed") {
                    Notice::error("New registrations are currently disabled.")
                } else if message.contains("Error sending confirmation") {
                    Notice::error(
                        "Account created but email verification failed. Please contact support.",
                    )
                } else {
                    Notice::error(format!("Signup failed: {message}"))
                }
            }
            AuthOperation::ResetRequest | AuthOperation::PasswordUpdate => {
                Notice::error(format!("Error: {message}"))
            }
            AuthOperation::ResendVerification => {
                Notice::error("Error resending email. Please try again.")
            }
            AuthOperation::VerifySession => {
                Notice::error("Verification failed. Please try again.")
            }
        }
    }

    /// Notice when the service could not be reached at all.
    pub fn unreachable(self) -> Notice {
        Notice::error(match self {
            AuthOperation::SignIn => "Login error. Please try again.",
            AuthOperation::SignUp => "Error creating account. Please try again.",
            AuthOperation::ResetRequest => "Error sending reset email. Please try again.",
            AuthOperation::PasswordUpdate => "Error updating password. Please try again.",
            AuthOperation::ResendVerification => "Error resending email. Please try again.",
            AuthOperation::VerifySession => "Something went wrong. Please try again.",
        })
    }
}
