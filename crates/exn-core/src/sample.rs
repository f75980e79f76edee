//! Built-in sample catalog.
//!
//! Shown in place of the live catalog when the service is unreachable and the
//! caller opts into a populated view. Ids are negative so they can never be
//! confused with real rows.

use crate::document::Document;
use crate::identity::DocumentId;

/// A small fixed catalog covering the common tag families.
pub fn sample_catalog() -> Vec<Document> {
    vec![
        sample(
            -1,
            "SBI PO Prelims Practice Set",
            "Ten full-length practice sets for the SBI PO preliminary exam.",
            &["practice sets", "sbi po", "quant", "reasoning", "english"],
            3.2,
            4.5,
            12,
        ),
        sample(
            -2,
            "IBPS Clerk Previous Year Papers",
            "Solved previous year papers for IBPS Clerk mains.",
            &["PYQs", "ibps clerk"],
            5.8,
            4.0,
            8,
        ),
        sample(
            -3,
            "Banking Awareness Notes",
            "Concise notes on banking awareness and current affairs.",
            &["notes", "general awareness", "RBI grade B"],
            1.4,
            0.0,
            0,
        ),
    ]
}

fn sample(
    id: i64,
    title: &str,
    description: &str,
    tags: &[&str],
    size_mb: f64,
    average_rating: f64,
    total_ratings: u32,
) -> Document {
    Document {
        id: DocumentId::new(id),
        title: title.to_string(),
        description: description.to_string(),
        image_path: "/images/pdf-thumbnail.jpg".to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        size_mb,
        preview_link: String::new(),
        download_link: String::new(),
        average_rating,
        total_ratings,
        created_at: None,
        updated_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exam::is_catalog_tag;

    #[test]
    fn sample_ids_are_negative_and_tags_known() {
        let docs = sample_catalog();
        assert_eq!(docs.len(), 3);
        for d in &docs {
            assert!(d.id.get() < 0);
            assert!(d.tags.iter().all(|t| is_catalog_tag(t)));
        }
    }
}
