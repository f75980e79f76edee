//! # Tag Filters
//!
//! The catalog view narrows documents by a set of selected tags. A document
//! matches when any of its tags is selected; no selection means no
//! filtering.

use std::collections::BTreeSet;

use crate::document::Document;

/// Currently selected tags, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    selected: Vec<String>,
}

impl TagFilter {
    /// An empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter with the given tags selected (duplicates dropped).
    pub fn with_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut filter = Self::new();
        for tag in tags {
            let tag = tag.into();
            if !filter.is_selected(&tag) {
                filter.selected.push(tag);
            }
        }
        filter
    }

    /// Select `tag` if unselected, otherwise unselect it. Returns whether it
    /// is selected afterwards.
    pub fn toggle(&mut self, tag: &str) -> bool {
        if let Some(pos) = self.selected.iter().position(|t| t == tag) {
            self.selected.remove(pos);
            false
        } else {
            self.selected.push(tag.to_string());
            true
        }
    }

    /// Unselect everything.
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Whether `tag` is selected.
    pub fn is_selected(&self, tag: &str) -> bool {
        self.selected.iter().any(|t| t == tag)
    }

    /// Selected tags in selection order.
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Whether `doc` passes the filter.
    pub fn matches(&self, doc: &Document) -> bool {
        self.is_empty() || doc.tags.iter().any(|t| self.is_selected(t))
    }

    /// Documents passing the filter, in their original order.
    pub fn apply<'a>(&self, docs: &'a [Document]) -> Vec<&'a Document> {
        docs.iter().filter(|d| self.matches(d)).collect()
    }
}

/// Sorted, de-duplicated union of all document tags: the filter options.
pub fn distinct_tags(docs: &[Document]) -> Vec<String> {
    docs.iter()
        .flat_map(|d| d.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::DocumentId;
    use proptest::prelude::*;

    fn doc(id: i64, tags: &[&str]) -> Document {
        Document {
            id: DocumentId::new(id),
            title: format!("Doc {id}"),
            description: String::new(),
            image_path: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            size_mb: 1.0,
            preview_link: String::new(),
            download_link: String::new(),
            average_rating: 0.0,
            total_ratings: 0,
            created_at: None,
            updated_at: None,
        }
    }

    fn catalog() -> Vec<Document> {
        vec![
            doc(1, &["quant", "notes"]),
            doc(2, &["reasoning"]),
            doc(3, &["english", "PYQs"]),
            doc(4, &[]),
        ]
    }

    #[test]
    fn empty_filter_returns_everything_in_order() {
        let docs = catalog();
        let ids: Vec<_> = TagFilter::new().apply(&docs).iter().map(|d| d.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn filter_keeps_intersecting_documents() {
        let docs = catalog();
        let filter = TagFilter::with_tags(["notes", "PYQs"]);
        let ids: Vec<_> = filter.apply(&docs).iter().map(|d| d.id.get()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut filter = TagFilter::new();
        assert!(filter.toggle("quant"));
        assert!(filter.is_selected("quant"));
        assert!(!filter.toggle("quant"));
        assert!(filter.is_empty());
    }

    #[test]
    fn clear_restores_full_list() {
        let docs = catalog();
        let mut filter = TagFilter::with_tags(["reasoning"]);
        assert_eq!(filter.apply(&docs).len(), 1);
        filter.clear();
        assert_eq!(filter.apply(&docs).len(), docs.len());
    }

    #[test]
    fn with_tags_drops_duplicates() {
        let filter = TagFilter::with_tags(["a", "b", "a"]);
        assert_eq!(filter.selected(), ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn tag_match_is_case_sensitive() {
        let docs = catalog();
        assert!(TagFilter::with_tags(["pyqs"]).apply(&docs).is_empty());
    }

    #[test]
    fn distinct_tags_sorted_union() {
        assert_eq!(
            distinct_tags(&catalog()),
            vec!["PYQs", "english", "notes", "quant", "reasoning"]
        );
    }

    proptest! {
        #[test]
        fn filtered_documents_intersect_selection(
            doc_tags in proptest::collection::vec(
                proptest::collection::vec("[a-d]", 0..4), 0..12),
            selection in proptest::collection::vec("[a-d]", 1..3),
        ) {
            let docs: Vec<Document> = doc_tags
                .iter()
                .enumerate()
                .map(|(i, tags)| {
                    let refs: Vec<&str> = tags.iter().map(String::as_str).collect();
                    doc(i as i64, &refs)
                })
                .collect();
            let filter = TagFilter::with_tags(selection.clone());
            let kept = filter.apply(&docs);
            for d in &kept {
                prop_assert!(d.tags.iter().any(|t| selection.contains(t)));
            }
            let kept_count = docs
                .iter()
                .filter(|d| d.tags.iter().any(|t| selection.contains(t)))
                .count();
            prop_assert_eq!(kept.len(), kept_count);
        }
    }
}
