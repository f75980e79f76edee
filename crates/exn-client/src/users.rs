//! Typed client for the `users` profile table.

use exn_core::{generate_unique_user_id, UserId, UserProfile};
use serde::de::IgnoredAny;

use crate::error::PortalApiError;
use crate::rest::{Query, RestTransport};

const TABLE: &str = "users";

/// Client for the `users` table.
#[derive(Debug, Clone)]
pub struct UserClient {
    rest: RestTransport,
}

impl UserClient {
    pub(crate) fn new(rest: RestTransport) -> Self {
        Self { rest }
    }

    /// Profile with the given portal user number.
    pub async fn find_by_user_id(&self, id: UserId) -> Result<Option<UserProfile>, PortalApiError> {
        self.rest
            .select_single(TABLE, &Query::new().select("*").eq("user_id", id))
            .await
    }

    /// Profile registered with `email`.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>, PortalApiError> {
        self.rest
            .select_single(TABLE, &Query::new().select("*").eq("email", email))
            .await
    }

    /// Whether a profile already uses `id`. A "no rows" answer means free;
    /// any other failure is returned as an error.
    pub async fn exists(&self, id: UserId) -> Result<bool, PortalApiError> {
        let row: Option<IgnoredAny> = self
            .rest
            .select_single(TABLE, &Query::new().select("user_id").eq("user_id", id))
            .await?;
        Ok(row.is_some())
    }

    /// Draw random 9-digit ids until one is not in the table.
    ///
    /// # Errors
    ///
    /// Returns [`PortalApiError::IdGeneration`] after ten candidates that
    /// were taken or could not be checked.
    pub async fn generate_unique_id(&self) -> Result<UserId, PortalApiError> {
        let mut rng = rand_core::OsRng;
        let id = generate_unique_user_id(&mut rng, |id| self.exists(id)).await?;
        Ok(id)
    }
}
