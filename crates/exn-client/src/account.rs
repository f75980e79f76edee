//! Account flows: validation, id allocation, auth calls and notices.
//!
//! Each flow validates the form for its mode before any request. Service
//! failures become [`AccountError::Failed`] carrying the notice to show and
//! the underlying error.

use exn_core::{
    validate_form, AccountForm, AuthOperation, FieldErrors, FormMode, Notice, SignupMetadata,
    UserId, UserProfile,
};
use std::sync::Arc;
use zeroize::Zeroizing;

use crate::auth::{AuthClient, AuthUser, Session, SignUpResponse};
use crate::error::PortalApiError;
use crate::rest::RestTransport;
use crate::users::UserClient;

/// Site path the verification email links to.
pub const AUTH_CALLBACK_PATH: &str = "/auth/callback";
/// Site path the password reset email links to.
pub const RESET_PASSWORD_PATH: &str = "/reset-password";

/// Why an account flow did not complete.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// The form failed validation; nothing was sent.
    #[error("{0}")]
    Invalid(FieldErrors),
    /// The service rejected the request or could not be reached.
    #[error("{notice}")]
    Failed {
        notice: Notice,
        #[source]
        source: PortalApiError,
    },
}

impl AccountError {
    fn from_service(op: AuthOperation, source: PortalApiError) -> Self {
        let notice = match &source {
            PortalApiError::ApiError { .. } => op.rejected(&source.service_message()),
            _ => op.unreachable(),
        };
        tracing::warn!(operation = ?op, "account operation failed: {source}");
        AccountError::Failed { notice, source }
    }

    /// The notice to show the user, for either variant.
    pub fn notice(&self) -> Notice {
        match self {
            AccountError::Invalid(errors) => Notice::error(errors.to_string()),
            AccountError::Failed { notice, .. } => notice.clone(),
        }
    }
}

/// A completed signup.
#[derive(Debug, Clone)]
pub struct SignedUp {
    pub user_id: UserId,
    pub response: SignUpResponse,
    pub notice: Notice,
}

/// A completed sign-in.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub session: Session,
    pub profile: UserProfile,
    pub notice: Notice,
}

/// Account flows over the auth API and the `users` table.
#[derive(Debug, Clone)]
pub struct AccountClient {
    auth: AuthClient,
    rest: RestTransport,
    callback_url: String,
    reset_url: String,
}

impl AccountClient {
    pub(crate) fn new(auth: AuthClient, rest: RestTransport, config: &crate::PortalApiConfig) -> Self {
        Self {
            auth,
            rest,
            callback_url: config.site_path(AUTH_CALLBACK_PATH),
            reset_url: config.site_path(RESET_PASSWORD_PATH),
        }
    }

    fn check(form: &AccountForm, mode: FormMode) -> Result<(), AccountError> {
        validate_form(form, mode).map_err(AccountError::Invalid)
    }

    /// Register an account with a freshly allocated user number.
    ///
    /// The account stays unverified until the emailed link is followed.
    pub async fn sign_up(&self, form: &AccountForm) -> Result<SignedUp, AccountError> {
        Self::check(form, FormMode::Signup)?;
        let op = AuthOperation::SignUp;

        let user_id = UserClient::new(self.rest.clone())
            .generate_unique_id()
            .await
            .map_err(|e| AccountError::from_service(op, e))?;

        let metadata = SignupMetadata {
            user_id,
            full_name: form.full_name.trim().to_string(),
            mobile: form.mobile.clone(),
            exam_type: form.exam_type.unwrap_or_default(),
        };
        let response = self
            .auth
            .sign_up(&form.email, &form.password, &metadata, &self.callback_url)
            .await
            .map_err(|e| AccountError::from_service(op, e))?;

        tracing::info!(user_id = %user_id, "account created, verification pending");
        Ok(SignedUp {
            user_id,
            response,
            notice: Notice::success("Account created! Please check your email for verification."),
        })
    }

    /// Sign in and load the profile row for the account's email.
    pub async fn sign_in(&self, form: &AccountForm) -> Result<SignedIn, AccountError> {
        Self::check(form, FormMode::Login)?;

        let session = self
            .auth
            .sign_in_with_password(&form.email, &form.password)
            .await
            .map_err(|e| AccountError::from_service(AuthOperation::SignIn, e))?;

        let token = Arc::new(Zeroizing::new(session.access_token.clone()));
        let users = UserClient::new(self.rest.with_access_token(token));
        let profile = match users.find_by_email(&form.email).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                return Err(profile_unavailable(PortalApiError::NotFound(format!(
                    "profile for {}",
                    form.email
                ))))
            }
            Err(e) => return Err(profile_unavailable(e)),
        };

        tracing::info!(user_id = %profile.user_id, "signed in");
        let notice = Notice::success(format!("Welcome back, {}!", profile.full_name));
        Ok(SignedIn {
            session,
            profile,
            notice,
        })
    }

    /// The account behind `access_token`.
    pub async fn current_user(&self, access_token: &str) -> Result<AuthUser, PortalApiError> {
        self.auth.get_user(access_token).await
    }

    /// Outcome of following the verification link, given the session the
    /// link produced (if any).
    pub async fn verify(&self, access_token: Option<&str>) -> Notice {
        let expired = || Notice::error("Verification link expired. Please request a new one.");
        let Some(token) = access_token else {
            return expired();
        };
        match self.auth.get_user(token).await {
            Ok(_) => Notice::success("Your account has been successfully verified!"),
            Err(e) if matches!(e.status(), Some(401 | 403)) => expired(),
            Err(e) => AccountError::from_service(AuthOperation::VerifySession, e).notice(),
        }
    }

    /// Email a password reset link.
    pub async fn request_password_reset(&self, form: &AccountForm) -> Result<Notice, AccountError> {
        Self::check(form, FormMode::Forgot)?;
        self.auth
            .recover(&form.email, &self.reset_url)
            .await
            .map_err(|e| AccountError::from_service(AuthOperation::ResetRequest, e))?;
        Ok(Notice::success("Password reset link sent to your email!"))
    }

    /// Set a new password for the account behind `access_token`.
    pub async fn update_password(
        &self,
        access_token: &str,
        form: &AccountForm,
    ) -> Result<Notice, AccountError> {
        Self::check(form, FormMode::Reset)?;
        self.auth
            .update_password(access_token, &form.password)
            .await
            .map_err(|e| AccountError::from_service(AuthOperation::PasswordUpdate, e))?;
        Ok(Notice::success("Password updated successfully!"))
    }

    /// Send the verification email again.
    pub async fn resend_verification(&self, email: &str) -> Result<Notice, AccountError> {
        self.auth
            .resend_signup(email)
            .await
            .map_err(|e| AccountError::from_service(AuthOperation::ResendVerification, e))?;
        Ok(Notice::success(
            "Verification email sent again. Please check your spam folder.",
        ))
    }

    /// Revoke the session server-side. Local state is the caller's concern.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), PortalApiError> {
        self.auth.sign_out(access_token).await
    }
}

fn profile_unavailable(source: PortalApiError) -> AccountError {
    tracing::warn!("profile lookup after sign-in failed: {source}");
    AccountError::Failed {
        notice: Notice::error("Error loading user profile. Please try again."),
        source,
    }
}
