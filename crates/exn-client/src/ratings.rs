//! Typed client for the `ratings` table.
//!
//! One rating per (user, document). The duplicate check is a read before the
//! insert, so two concurrent submissions from one user can both land.

use chrono::{DateTime, Utc};
use exn_core::{DocumentId, RatingSummary, RatingValue, UserId};
use serde::{Deserialize, Serialize};

use crate::documents::DocumentClient;
use crate::error::PortalApiError;
use crate::rest::{Query, RestTransport};

const TABLE: &str = "ratings";

#[derive(Serialize)]
struct NewRating {
    user_id: UserId,
    pdf_id: DocumentId,
    rating: RatingValue,
    created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RatingRow {
    rating: RatingValue,
}

/// Client for the `ratings` table.
#[derive(Debug, Clone)]
pub struct RatingClient {
    rest: RestTransport,
    documents: DocumentClient,
}

impl RatingClient {
    pub(crate) fn new(rest: RestTransport) -> Self {
        Self {
            documents: DocumentClient::new(rest.clone()),
            rest,
        }
    }

    /// Record `user`'s rating of `document` and refresh its aggregates.
    ///
    /// # Errors
    ///
    /// - [`PortalApiError::NotAuthenticated`] when `user` is `None`.
    /// - [`PortalApiError::Validation`] when `value` is outside 1–5; no
    ///   request is made.
    /// - [`PortalApiError::AlreadyRated`] when the user already rated it.
    pub async fn rate(
        &self,
        user: Option<UserId>,
        document: DocumentId,
        value: i64,
    ) -> Result<RatingSummary, PortalApiError> {
        let user = user.ok_or(PortalApiError::NotAuthenticated)?;
        let rating = RatingValue::new(value)?;

        if self.user_rating(Some(user), document).await?.is_some() {
            return Err(PortalApiError::AlreadyRated);
        }

        let row = NewRating {
            user_id: user,
            pdf_id: document,
            rating,
            created_at: Utc::now(),
        };
        self.rest.insert_minimal(TABLE, &[row]).await?;
        tracing::info!(user_id = %user, pdf_id = %document, rating = rating.get(), "rating recorded");

        self.recompute(document).await
    }

    /// `user`'s rating of `document`, if any. Always `None` without a user.
    pub async fn user_rating(
        &self,
        user: Option<UserId>,
        document: DocumentId,
    ) -> Result<Option<RatingValue>, PortalApiError> {
        let Some(user) = user else {
            return Ok(None);
        };
        let row: Option<RatingRow> = self
            .rest
            .select_single(
                TABLE,
                &Query::new()
                    .select("rating")
                    .eq("user_id", user)
                    .eq("pdf_id", document),
            )
            .await?;
        Ok(row.map(|r| r.rating))
    }

    /// Recalculate `document`'s average and count from all its ratings and
    /// store them on the document.
    pub async fn recompute(&self, document: DocumentId) -> Result<RatingSummary, PortalApiError> {
        let rows: Vec<RatingRow> = self
            .rest
            .select(TABLE, &Query::new().select("rating").eq("pdf_id", document))
            .await?;
        let summary = RatingSummary::from_values(rows.into_iter().map(|r| r.rating));
        self.documents.set_rating_summary(document, &summary).await?;
        tracing::debug!(
            pdf_id = %document,
            average = summary.average_rating,
            total = summary.total_ratings,
            "rating aggregates updated"
        );
        Ok(summary)
    }
}
