//! Typed client for the `bookmarks` table.

use chrono::{DateTime, Utc};
use exn_core::{DocumentId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::PortalApiError;
use crate::rest::{Query, RestTransport};

const TABLE: &str = "bookmarks";

#[derive(Serialize)]
struct NewBookmark {
    user_id: UserId,
    pdf_id: DocumentId,
    created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct BookmarkIdRow {
    id: i64,
}

#[derive(Deserialize)]
struct BookmarkedDocument {
    pdf_id: DocumentId,
}

/// Client for the `bookmarks` table.
#[derive(Debug, Clone)]
pub struct BookmarkClient {
    rest: RestTransport,
}

impl BookmarkClient {
    pub(crate) fn new(rest: RestTransport) -> Self {
        Self { rest }
    }

    /// Flip `user`'s bookmark on `document`. Returns `true` when the
    /// document is bookmarked afterwards.
    pub async fn toggle(
        &self,
        user: Option<UserId>,
        document: DocumentId,
    ) -> Result<bool, PortalApiError> {
        let user = user.ok_or(PortalApiError::NotAuthenticated)?;

        let existing: Option<BookmarkIdRow> = self
            .rest
            .select_single(
                TABLE,
                &Query::new()
                    .select("id")
                    .eq("user_id", user)
                    .eq("pdf_id", document),
            )
            .await?;

        if let Some(row) = existing {
            self.rest
                .delete(TABLE, &Query::new().eq("id", row.id))
                .await?;
            tracing::info!(user_id = %user, pdf_id = %document, "bookmark removed");
            Ok(false)
        } else {
            let row = NewBookmark {
                user_id: user,
                pdf_id: document,
                created_at: Utc::now(),
            };
            self.rest.insert_minimal(TABLE, &[row]).await?;
            tracing::info!(user_id = %user, pdf_id = %document, "bookmark added");
            Ok(true)
        }
    }

    /// Ids of every document `user` has bookmarked.
    pub async fn list_for_user(&self, user: UserId) -> Result<Vec<DocumentId>, PortalApiError> {
        let rows: Vec<BookmarkedDocument> = self
            .rest
            .select(TABLE, &Query::new().select("pdf_id").eq("user_id", user))
            .await?;
        Ok(rows.into_iter().map(|r| r.pdf_id).collect())
    }
}
