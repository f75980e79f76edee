//! # exn-client -- Typed Rust client for the ExamNation backend
//!
//! The backend is a hosted auth + database service. This crate provides
//! typed access to:
//! - **Auth** via `/auth/v1`: signup, password grant, recovery, resend
//! - **Users** via `/rest/v1/users`: profile rows and user-number checks
//! - **Documents** via `/rest/v1/pdfs`: the study-material catalog
//! - **Ratings** via `/rest/v1/ratings`: one rating per user and document
//! - **Bookmarks** via `/rest/v1/bookmarks`
//!
//! Plus the **account flows** that tie validation, id allocation and auth
//! calls together and turn failures into user-facing notices.
//!
//! ## Authentication
//!
//! Every request carries the project's public key as `apikey`. Requests run
//! as the anonymous role unless the client was narrowed with
//! [`PortalClient::with_access_token`], which sends the signed-in user's
//! token instead.

pub mod account;
pub mod auth;
pub mod bookmarks;
pub mod config;
pub mod documents;
pub mod error;
pub mod ratings;
pub mod rest;
pub(crate) mod retry;
pub mod users;

pub use account::{AccountClient, AccountError, SignedIn, SignedUp};
pub use auth::{AuthUser, Session, SignUpResponse};
pub use config::PortalApiConfig;
pub use documents::{CatalogListing, CatalogSource};
pub use error::PortalApiError;

use std::sync::Arc;
use std::time::Duration;

use zeroize::Zeroizing;

/// Top-level backend client. Holds sub-clients for each API area.
#[derive(Debug, Clone)]
pub struct PortalClient {
    config: PortalApiConfig,
    auth: auth::AuthClient,
    rest: rest::RestTransport,
}

/// Result of [`PortalClient::health_check`].
#[derive(Debug, Clone, Default)]
pub struct HealthReport {
    pub reachable: Vec<&'static str>,
    pub unreachable: Vec<&'static str>,
}

impl HealthReport {
    /// Whether every API area answered.
    pub fn all_healthy(&self) -> bool {
        self.unreachable.is_empty()
    }
}

impl PortalClient {
    /// Create a new client from configuration.
    pub fn new(config: PortalApiConfig) -> Result<Self, PortalApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                let key = reqwest::header::HeaderValue::from_str(config.anon_key.as_str())
                    .map_err(|_| PortalApiError::Config(config::ConfigError::MissingKey))?;
                let bearer = reqwest::header::HeaderValue::from_str(&format!(
                    "Bearer {}",
                    config.anon_key.as_str()
                ))
                .map_err(|_| PortalApiError::Config(config::ConfigError::MissingKey))?;
                headers.insert("apikey", key);
                headers.insert(reqwest::header::AUTHORIZATION, bearer);
                headers
            })
            .build()
            .map_err(|e| PortalApiError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            auth: auth::AuthClient::new(http.clone(), config.project_url.clone()),
            rest: rest::RestTransport::new(http, config.project_url.clone()),
            config,
        })
    }

    /// A copy of this client whose table requests run as the user that owns
    /// `access_token`.
    pub fn with_access_token(&self, access_token: &str) -> Self {
        let token = Arc::new(Zeroizing::new(access_token.to_string()));
        Self {
            config: self.config.clone(),
            auth: self.auth.clone(),
            rest: self.rest.with_access_token(token),
        }
    }

    /// The configuration this client was built from.
    pub fn config(&self) -> &PortalApiConfig {
        &self.config
    }

    /// Access the auth API client.
    pub fn auth(&self) -> &auth::AuthClient {
        &self.auth
    }

    /// Account flows (signup, sign-in, recovery).
    pub fn account(&self) -> AccountClient {
        AccountClient::new(self.auth.clone(), self.rest.clone(), &self.config)
    }

    /// Access the `users` table.
    pub fn users(&self) -> users::UserClient {
        users::UserClient::new(self.rest.clone())
    }

    /// Access the `pdfs` table.
    pub fn documents(&self) -> documents::DocumentClient {
        documents::DocumentClient::new(self.rest.clone())
    }

    /// Access the `ratings` table.
    pub fn ratings(&self) -> ratings::RatingClient {
        ratings::RatingClient::new(self.rest.clone())
    }

    /// Access the `bookmarks` table.
    pub fn bookmarks(&self) -> bookmarks::BookmarkClient {
        bookmarks::BookmarkClient::new(self.rest.clone())
    }

    /// Probe the auth and table APIs.
    ///
    /// A service counts as reachable when it answers at all; the table API
    /// is probed with a one-column read of the catalog.
    pub async fn health_check(&self) -> HealthReport {
        let mut report = HealthReport::default();

        if self.auth.ping().await {
            report.reachable.push("auth");
        } else {
            report.unreachable.push("auth");
        }

        let probe: Result<Vec<serde_json::Value>, _> = self
            .rest
            .select(documents::TABLE, &rest::Query::new().select("id"))
            .await;
        match probe {
            Err(e) if e.is_transport() => {
                tracing::warn!("table API health probe failed: {e}");
                report.unreachable.push("rest");
            }
            _ => report.reachable.push("rest"),
        }

        report
    }
}
