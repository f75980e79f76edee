//! Typed client for the hosted auth API (`/auth/v1`).
//!
//! Covers email + password accounts: signup with profile metadata, password
//! grant, current-user lookup, recovery and resend emails, password change,
//! and logout. Email links point back at the configured site URL.

use chrono::{DateTime, Utc};
use exn_core::{AuthUserId, SignupMetadata};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::PortalApiError;
use crate::retry::{send_checked, Resend};

// -- Types matching the auth API ----------------------------------------------

/// An account as the auth service reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: AuthUserId,
    #[serde(default)]
    pub email: Option<String>,
    /// Set once the signup link has been followed.
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl AuthUser {
    /// Whether the account's email has been verified.
    pub fn is_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }

    /// Portal metadata attached at signup, if present and well-formed.
    pub fn signup_metadata(&self) -> Option<SignupMetadata> {
        serde_json::from_value(self.user_metadata.clone()).ok()
    }
}

/// Tokens issued by a successful sign-in.
///
/// `Debug` redacts both tokens.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
    /// Expiry as Unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub refresh_token: String,
    pub user: AuthUser,
}

fn default_token_type() -> String {
    "bearer".into()
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .field("refresh_token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

impl Session {
    /// Whether the access token has expired at `now`. Sessions without an
    /// expiry are treated as live.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now.timestamp() >= exp)
    }
}

/// Signup response: a session when the project auto-confirms emails,
/// otherwise just the pending account.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(Session),
    User(AuthUser),
}

impl SignUpResponse {
    /// The created account.
    pub fn user(&self) -> &AuthUser {
        match self {
            SignUpResponse::Session(s) => &s.user,
            SignUpResponse::User(u) => u,
        }
    }

    /// Whether the user still has to follow the verification link.
    pub fn needs_verification(&self) -> bool {
        matches!(self, SignUpResponse::User(u) if !u.is_confirmed())
    }
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: &'a SignupMetadata,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct EmailOnly<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct ResendRequest<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct PasswordChange<'a> {
    password: &'a str,
}

// -- Client -------------------------------------------------------------------

/// Client for the auth API.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: Url,
}

impl AuthClient {
    pub(crate) fn new(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}auth/v1/{path}", self.base_url)
    }

    async fn call<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        bearer: Option<&str>,
        body: Option<&B>,
    ) -> Result<reqwest::Response, PortalApiError> {
        let endpoint = format!("{method} /auth/v1/{path}");
        let url = self.url(path);
        tracing::debug!(endpoint = %endpoint, "auth request");

        // A resent signup can register the account twice.
        let resend = match path {
            "signup" => Resend::Never,
            _ => Resend::Allowed,
        };
        send_checked(&endpoint, resend, || {
            let mut req = self.http.request(method.clone(), &url).query(query);
            if let Some(token) = bearer {
                req = req.bearer_auth(token);
            }
            if let Some(body) = body {
                req = req.json(body);
            }
            req.send()
        })
        .await
    }

    async fn decode<T: DeserializeOwned>(
        path: &str,
        resp: reqwest::Response,
    ) -> Result<T, PortalApiError> {
        resp.json().await.map_err(|e| PortalApiError::Deserialization {
            endpoint: format!("/auth/v1/{path}"),
            source: e,
        })
    }

    /// Register an account. The verification email links to `redirect_to`.
    ///
    /// Calls `POST /auth/v1/signup?redirect_to=...`.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignupMetadata,
        redirect_to: &str,
    ) -> Result<SignUpResponse, PortalApiError> {
        let body = SignUpRequest {
            email,
            password,
            data: metadata,
        };
        let resp = self
            .call(
                Method::POST,
                "signup",
                &[("redirect_to", redirect_to)],
                None,
                Some(&body),
            )
            .await?;
        Self::decode("signup", resp).await
    }

    /// Exchange email + password for a session.
    ///
    /// Calls `POST /auth/v1/token?grant_type=password`.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, PortalApiError> {
        let body = PasswordGrant { email, password };
        let resp = self
            .call(
                Method::POST,
                "token",
                &[("grant_type", "password")],
                None,
                Some(&body),
            )
            .await?;
        Self::decode("token", resp).await
    }

    /// The account that owns `access_token`.
    ///
    /// Calls `GET /auth/v1/user`.
    pub async fn get_user(&self, access_token: &str) -> Result<AuthUser, PortalApiError> {
        let resp = self
            .call::<()>(Method::GET, "user", &[], Some(access_token), None)
            .await?;
        Self::decode("user", resp).await
    }

    /// Send a password reset email linking to `redirect_to`.
    ///
    /// Calls `POST /auth/v1/recover?redirect_to=...`.
    pub async fn recover(&self, email: &str, redirect_to: &str) -> Result<(), PortalApiError> {
        self.call(
            Method::POST,
            "recover",
            &[("redirect_to", redirect_to)],
            None,
            Some(&EmailOnly { email }),
        )
        .await?;
        Ok(())
    }

    /// Set a new password for the account that owns `access_token`.
    ///
    /// Calls `PUT /auth/v1/user`.
    pub async fn update_password(
        &self,
        access_token: &str,
        new_password: &str,
    ) -> Result<AuthUser, PortalApiError> {
        let resp = self
            .call(
                Method::PUT,
                "user",
                &[],
                Some(access_token),
                Some(&PasswordChange {
                    password: new_password,
                }),
            )
            .await?;
        Self::decode("user", resp).await
    }

    /// Send the signup verification email again.
    ///
    /// Calls `POST /auth/v1/resend` with `type = "signup"`.
    pub async fn resend_signup(&self, email: &str) -> Result<(), PortalApiError> {
        self.call(
            Method::POST,
            "resend",
            &[],
            None,
            Some(&ResendRequest {
                kind: "signup",
                email,
            }),
        )
        .await?;
        Ok(())
    }

    /// Revoke the session that owns `access_token`.
    ///
    /// Calls `POST /auth/v1/logout`.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), PortalApiError> {
        self.call::<()>(Method::POST, "logout", &[], Some(access_token), None)
            .await?;
        Ok(())
    }

    /// Whether the auth service answers its health endpoint at all.
    pub(crate) async fn ping(&self) -> bool {
        match self.call::<()>(Method::GET, "health", &[], None, None).await {
            Err(e) if e.is_transport() => {
                tracing::warn!("auth health probe failed: {e}");
                false
            }
            _ => true,
        }
    }
}
