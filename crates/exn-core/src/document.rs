//! # Catalog Documents
//!
//! A [`Document`] is one downloadable study PDF as stored in the `pdfs`
//! table. [`DocumentDraft`] is the admin-editable subset sent on create and
//! update; the rating aggregates and timestamps are owned by the data-access
//! layer.
//!
//! Documents are addressed in links by a slug derived from the title
//! ([`slugify`]). The detail view reverses it with [`title_from_slug`] and
//! looks the document up by a case-insensitive substring match, so the slug
//! does not have to round-trip exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;
use crate::exam::is_catalog_tag;
use crate::identity::DocumentId;

/// A catalog entry, as returned by the `pdfs` table.
///
/// Every column except `id` and `title` may be missing or `null` in a row;
/// either reads as the field's default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Row id.
    pub id: DocumentId,
    /// Display title.
    pub title: String,
    /// Long description.
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Thumbnail path or URL.
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_path: String,
    /// Free-text tags.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    /// File size in megabytes.
    #[serde(default, deserialize_with = "null_as_default")]
    pub size_mb: f64,
    /// Link to an online preview.
    #[serde(default, deserialize_with = "null_as_default")]
    pub preview_link: String,
    /// Link to the file itself.
    #[serde(default, deserialize_with = "null_as_default")]
    pub download_link: String,
    /// Mean of all ratings, 0 when unrated.
    #[serde(default, deserialize_with = "null_as_default")]
    pub average_rating: f64,
    /// Number of ratings.
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_ratings: u32,
    /// Insert time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Document {
    /// Link slug for this document.
    pub fn slug(&self) -> String {
        slugify(&self.title)
    }

    /// Whole stars to display for the average rating (0-5).
    pub fn display_stars(&self) -> u8 {
        crate::rating::display_stars(self.average_rating)
    }

    /// Whether the document carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Admin-editable document fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentDraft {
    /// Display title.
    pub title: String,
    /// Long description.
    pub description: String,
    /// Thumbnail path or URL.
    pub image_path: String,
    /// Tags from the catalog vocabulary.
    pub tags: Vec<String>,
    /// File size in megabytes.
    pub size_mb: f64,
    /// Link to an online preview.
    pub preview_link: String,
    /// Link to the file itself.
    pub download_link: String,
}

impl DocumentDraft {
    /// Pre-fill a draft from an existing document, for editing.
    pub fn from_document(doc: &Document) -> Self {
        Self {
            title: doc.title.clone(),
            description: doc.description.clone(),
            image_path: doc.image_path.clone(),
            tags: doc.tags.clone(),
            size_mb: doc.size_mb,
            preview_link: doc.preview_link.clone(),
            download_link: doc.download_link.clone(),
        }
    }

    /// Check the admin form rules.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule: a blank required field, a size that
    /// is not a positive finite number, or a tag outside the vocabulary.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("image path", &self.image_path),
            ("title", &self.title),
            ("description", &self.description),
            ("preview link", &self.preview_link),
            ("download link", &self.download_link),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(name));
            }
        }
        if !self.size_mb.is_finite() || self.size_mb <= 0.0 {
            return Err(ValidationError::InvalidSize(self.size_mb));
        }
        if let Some(tag) = self.tags.iter().find(|t| !is_catalog_tag(t)) {
            return Err(ValidationError::UnknownTag(tag.clone()));
        }
        Ok(())
    }
}

/// Link slug: whitespace runs become `-`, then lowercase.
pub fn slugify(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Title search term for a slug: every `-` becomes a space.
pub fn title_from_slug(slug: &str) -> String {
    slug.replace('-', " ")
}

/// Site-relative path of a document's detail page.
pub fn detail_path(slug: &str) -> String {
    format!("/download-pdf/{slug}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> DocumentDraft {
        DocumentDraft {
            title: "SBI PO Prelims Mock 1".into(),
            description: "Full-length mock".into(),
            image_path: "/images/pdf-thumbnail.jpg".into(),
            tags: vec!["sbi po".into(), "practice sets".into()],
            size_mb: 2.5,
            preview_link: "https://example.com/p".into(),
            download_link: "https://example.com/d".into(),
        }
    }

    #[test]
    fn null_columns_read_as_defaults() {
        let doc: Document = serde_json::from_str(
            r#"{"id":1,"title":"T","description":null,"image_path":null,"tags":null,
                "size_mb":null,"average_rating":null,"total_ratings":null,
                "created_at":null}"#,
        )
        .unwrap();
        assert_eq!(doc.description, "");
        assert!(doc.tags.is_empty());
        assert_eq!(doc.average_rating, 0.0);
        assert_eq!(doc.total_ratings, 0);
        assert_eq!(doc.created_at, None);
        assert_eq!(doc.display_stars(), 0);

        let sparse: Document = serde_json::from_str(r#"{"id":2,"title":"U"}"#).unwrap();
        assert_eq!(sparse.preview_link, "");
    }

    #[test]
    fn slug_collapses_whitespace_and_lowercases() {
        assert_eq!(slugify("SBI  PO Prelims\tMock"), "sbi-po-prelims-mock");
        assert_eq!(slugify("  Trimmed  "), "trimmed");
    }

    #[test]
    fn title_from_slug_restores_spaces() {
        assert_eq!(title_from_slug("ibps-clerk-notes"), "ibps clerk notes");
    }

    #[test]
    fn detail_path_uses_download_route() {
        assert_eq!(detail_path("rrb-po"), "/download-pdf/rrb-po");
    }

    #[test]
    fn valid_draft_passes() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn blank_required_field_rejected() {
        let mut d = draft();
        d.download_link = "   ".into();
        assert_eq!(d.validate(), Err(ValidationError::MissingField("download link")));
    }

    #[test]
    fn non_positive_or_nan_size_rejected() {
        for size in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let mut d = draft();
            d.size_mb = size;
            assert!(matches!(d.validate(), Err(ValidationError::InvalidSize(_))));
        }
    }

    #[test]
    fn unknown_tag_rejected() {
        let mut d = draft();
        d.tags.push("astrology".into());
        assert_eq!(d.validate(), Err(ValidationError::UnknownTag("astrology".into())));
    }

    #[test]
    fn document_deserializes_service_row() {
        let doc: Document = serde_json::from_value(serde_json::json!({
            "id": 3,
            "title": "Quant Shortcuts",
            "description": "Tricks",
            "image_path": "/img/q.jpg",
            "tags": ["quant", "notes"],
            "size_mb": 1.25,
            "preview_link": "https://x/p",
            "download_link": "https://x/d",
            "average_rating": 4.5,
            "total_ratings": 2,
            "created_at": "2025-03-01T08:30:00.123456+00:00",
            "updated_at": "2025-03-02T08:30:00+00:00"
        }))
        .unwrap();
        assert_eq!(doc.id, DocumentId::new(3));
        assert_eq!(doc.slug(), "quant-shortcuts");
        assert_eq!(doc.display_stars(), 5);
        assert!(doc.has_tag("quant"));
        assert!(doc.created_at.is_some());
    }

    #[test]
    fn draft_from_document_copies_editable_fields() {
        let doc = Document {
            id: DocumentId::new(9),
            title: "T".into(),
            description: "D".into(),
            image_path: "I".into(),
            tags: vec!["notes".into()],
            size_mb: 1.0,
            preview_link: "P".into(),
            download_link: "L".into(),
            average_rating: 3.0,
            total_ratings: 1,
            created_at: None,
            updated_at: None,
        };
        let d = DocumentDraft::from_document(&doc);
        assert_eq!(d.title, "T");
        assert_eq!(d.tags, vec!["notes".to_string()]);
    }
}
