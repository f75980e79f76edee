//! Backend client error types.

use serde::Deserialize;

/// PostgREST code for "zero (or more than one) rows where exactly one was
/// requested".
pub const NO_ROWS_CODE: &str = "PGRST116";

/// Errors from backend calls.
#[derive(Debug, thiserror::Error)]
pub enum PortalApiError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The backend returned a non-2xx status.
    #[error("backend {endpoint} returned {status}: {body}")]
    ApiError {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
    /// The operation needs a signed-in user.
    #[error("User not authenticated")]
    NotAuthenticated,
    /// The user already has a rating for this document.
    #[error("You have already rated this PDF")]
    AlreadyRated,
    /// A single-row lookup found nothing.
    #[error("{0} not found")]
    NotFound(String),
    /// Input rejected before sending.
    #[error("validation error: {0}")]
    Validation(#[from] exn_core::ValidationError),
    /// The user id loop gave up.
    #[error(transparent)]
    IdGeneration(#[from] exn_core::IdGenerationError),
}

/// Error body shapes returned by the auth and table APIs.
///
/// The auth API has used `msg`, `error_description` and `message` across
/// versions; the table API uses `code` + `message`.
#[derive(Debug, Default, Deserialize)]
struct ServiceErrorBody {
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ServiceErrorBody {
    fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }
}

impl PortalApiError {
    /// HTTP status, for `ApiError`.
    pub fn status(&self) -> Option<u16> {
        match self {
            PortalApiError::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable message reported by the backend, if any.
    ///
    /// For errors that never reached the backend, the error's own display
    /// text is returned.
    pub fn service_message(&self) -> String {
        match self {
            PortalApiError::ApiError { body, .. } => ServiceErrorBody::parse(body)
                .and_then(|b| b.msg.or(b.error_description).or(b.message).or(b.error))
                .unwrap_or_else(|| body.clone()),
            other => other.to_string(),
        }
    }

    /// Machine-readable error code reported by the backend, if any
    /// (e.g. `PGRST116`, `email_not_confirmed`).
    pub fn service_code(&self) -> Option<String> {
        let PortalApiError::ApiError { body, .. } = self else {
            return None;
        };
        let parsed = ServiceErrorBody::parse(body)?;
        if let Some(code) = parsed.error_code {
            return Some(code);
        }
        match parsed.code {
            Some(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Whether this is the "no rows" answer to a single-row lookup.
    pub fn is_no_rows(&self) -> bool {
        self.service_code().as_deref() == Some(NO_ROWS_CODE)
    }

    /// Whether the backend was never reached (transport failure).
    pub fn is_transport(&self) -> bool {
        matches!(self, PortalApiError::Http { .. })
    }
}
