//! Typed client for the `pdfs` catalog table.

use chrono::{DateTime, Utc};
use exn_core::{sample_catalog, title_from_slug, Document, DocumentDraft, DocumentId};
use serde::Serialize;

use crate::error::PortalApiError;
use crate::rest::{Query, RestTransport};

pub(crate) const TABLE: &str = "pdfs";

/// Where a catalog listing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    /// The live table.
    Live,
    /// The built-in sample catalog, used because the live listing failed.
    Sample,
}

/// A catalog listing and its source.
#[derive(Debug, Clone)]
pub struct CatalogListing {
    pub documents: Vec<Document>,
    pub source: CatalogSource,
}

#[derive(Serialize)]
struct NewDocument<'a> {
    #[serde(flatten)]
    draft: &'a DocumentDraft,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct DocumentPatch<'a> {
    #[serde(flatten)]
    draft: &'a DocumentDraft,
    updated_at: DateTime<Utc>,
}

/// Client for the `pdfs` table.
#[derive(Debug, Clone)]
pub struct DocumentClient {
    rest: RestTransport,
}

impl DocumentClient {
    pub(crate) fn new(rest: RestTransport) -> Self {
        Self { rest }
    }

    /// Every document, newest first.
    pub async fn list(&self) -> Result<Vec<Document>, PortalApiError> {
        self.rest
            .select(TABLE, &Query::new().select("*").order("created_at", false))
            .await
    }

    /// The live listing, or the sample catalog when the listing fails and
    /// `sample_fallback` is set.
    pub async fn list_or_sample(
        &self,
        sample_fallback: bool,
    ) -> Result<CatalogListing, PortalApiError> {
        match self.list().await {
            Ok(documents) => Ok(CatalogListing {
                documents,
                source: CatalogSource::Live,
            }),
            Err(e) if sample_fallback => {
                tracing::warn!("catalog listing failed, showing sample catalog: {e}");
                Ok(CatalogListing {
                    documents: sample_catalog(),
                    source: CatalogSource::Sample,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// The single document whose title contains `title`, ignoring case.
    ///
    /// # Errors
    ///
    /// [`PortalApiError::NotFound`] when no document, or more than one,
    /// matches.
    pub async fn get_by_title(&self, title: &str) -> Result<Document, PortalApiError> {
        self.rest
            .select_single(TABLE, &Query::new().select("*").ilike_contains("title", title))
            .await?
            .ok_or_else(|| PortalApiError::NotFound(format!("document matching \"{title}\"")))
    }

    /// Resolve a detail-page slug to its document.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Document, PortalApiError> {
        self.get_by_title(&title_from_slug(slug)).await
    }

    /// Document by id.
    pub async fn get(&self, id: DocumentId) -> Result<Option<Document>, PortalApiError> {
        self.rest
            .select_single(TABLE, &Query::new().select("*").eq("id", id))
            .await
    }

    /// Validate and insert a new document, stamping both timestamps.
    pub async fn create(&self, draft: &DocumentDraft) -> Result<Document, PortalApiError> {
        draft.validate()?;
        let now = Utc::now();
        let row = NewDocument {
            draft,
            created_at: now,
            updated_at: now,
        };
        let mut created: Vec<Document> = self.rest.insert(TABLE, &[row]).await?;
        let doc = created
            .pop()
            .ok_or_else(|| PortalApiError::NotFound("created document".into()))?;
        tracing::info!(id = %doc.id, title = %doc.title, "document created");
        Ok(doc)
    }

    /// Validate and overwrite the editable fields of document `id`.
    pub async fn update(
        &self,
        id: DocumentId,
        draft: &DocumentDraft,
    ) -> Result<Document, PortalApiError> {
        draft.validate()?;
        let patch = DocumentPatch {
            draft,
            updated_at: Utc::now(),
        };
        let mut updated: Vec<Document> = self
            .rest
            .update(TABLE, &Query::new().eq("id", id), &patch)
            .await?;
        let doc = updated
            .pop()
            .ok_or_else(|| PortalApiError::NotFound(format!("document {id}")))?;
        tracing::info!(id = %doc.id, "document updated");
        Ok(doc)
    }

    /// Delete document `id`. Deleting a missing id is not an error.
    pub async fn delete(&self, id: DocumentId) -> Result<(), PortalApiError> {
        self.rest.delete(TABLE, &Query::new().eq("id", id)).await?;
        tracing::info!(id = %id, "document deleted");
        Ok(())
    }

    /// Write rating aggregates onto document `id`.
    pub(crate) async fn set_rating_summary(
        &self,
        id: DocumentId,
        summary: &exn_core::RatingSummary,
    ) -> Result<(), PortalApiError> {
        let _: Vec<serde_json::Value> = self
            .rest
            .update(TABLE, &Query::new().eq("id", id).select("id"), summary)
            .await?;
        Ok(())
    }
}
