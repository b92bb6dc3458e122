//! Query and match-set data model.

use std::collections::BTreeSet;

use sift_index::{MetadataFilter, ScoredPoint};

use crate::error::PipelineError;

/// Metadata field holding a passage's text.
pub const CONTENT_FIELD: &str = "page_content";
/// Metadata field holding a passage's document source.
pub const SOURCE_FIELD: &str = "source";

/// A user query. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
    top_k: usize,
    source_filter: BTreeSet<String>,
}

impl Query {
    /// A query with no source filter. Validation happens at retrieval.
    #[must_use]
    pub fn new(text: impl Into<String>, top_k: usize) -> Self {
        Self {
            text: text.into(),
            top_k,
            source_filter: BTreeSet::new(),
        }
    }

    /// Restrict matches to the given sources. An empty set means no filter.
    #[must_use]
    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_filter = sources.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    #[must_use]
    pub fn source_filter(&self) -> &BTreeSet<String> {
        &self.source_filter
    }

    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidQuery`] for blank text or a zero `top_k`.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.text.trim().is_empty() {
            return Err(PipelineError::InvalidQuery("query text is empty".into()));
        }
        if self.top_k == 0 {
            return Err(PipelineError::InvalidQuery(
                "top_k must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn index_filter(&self) -> Option<MetadataFilter> {
        (!self.source_filter.is_empty())
            .then(|| MetadataFilter::field_in(SOURCE_FIELD, self.source_filter.iter().cloned()))
    }
}

/// A retrieved passage.
#[derive(Debug, Clone, PartialEq)]
pub struct Passage {
    /// Index id; integer-valued when the index follows the contiguous id scheme.
    pub id: String,
    pub content: String,
    pub source: String,
    pub score: f32,
}

impl From<ScoredPoint> for Passage {
    fn from(point: ScoredPoint) -> Self {
        let content = point.text(CONTENT_FIELD).unwrap_or_default().to_owned();
        let source = point.text(SOURCE_FIELD).unwrap_or_default().to_owned();
        Self {
            id: point.id,
            content,
            source,
            score: point.score,
        }
    }
}

/// Passages in the order the index ranked them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchSet {
    passages: Vec<Passage>,
}

impl MatchSet {
    #[must_use]
    pub fn new(passages: Vec<Passage>) -> Self {
        Self { passages }
    }

    #[must_use]
    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Passage> {
        self.passages.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

impl<'a> IntoIterator for &'a MatchSet {
    type Item = &'a Passage;
    type IntoIter = std::slice::Iter<'a, Passage>;

    fn into_iter(self) -> Self::IntoIter {
        self.passages.iter()
    }
}

impl IntoIterator for MatchSet {
    type Item = Passage;
    type IntoIter = std::vec::IntoIter<Passage>;

    fn into_iter(self) -> Self::IntoIter {
        self.passages.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn blank_text_is_invalid() {
        for text in ["", "   ", "\n\t"] {
            assert!(matches!(
                Query::new(text, 5).validate(),
                Err(PipelineError::InvalidQuery(_))
            ));
        }
    }

    #[test]
    fn zero_top_k_is_invalid() {
        assert!(matches!(
            Query::new("What is X?", 0).validate(),
            Err(PipelineError::InvalidQuery(_))
        ));
        assert!(Query::new("What is X?", 1).validate().is_ok());
    }

    #[test]
    fn empty_source_filter_means_no_index_filter() {
        assert!(Query::new("q", 5).index_filter().is_none());
        assert!(
            Query::new("q", 5)
                .with_sources(Vec::<String>::new())
                .index_filter()
                .is_none()
        );
    }

    #[test]
    fn source_filter_targets_source_field() {
        let filter = Query::new("q", 5)
            .with_sources(["docB", "docA", "docA"])
            .index_filter()
            .unwrap();
        assert_eq!(filter.field, "source");
        assert_eq!(filter.any_of, ["docA", "docB"]);
    }

    #[test]
    fn passage_from_scored_point() {
        let point = ScoredPoint {
            id: "41".into(),
            score: 0.9,
            payload: HashMap::from([
                ("page_content".into(), serde_json::json!("alpha")),
                ("source".into(), serde_json::json!("docA")),
            ]),
        };
        let passage = Passage::from(point);
        assert_eq!(passage.id, "41");
        assert_eq!(passage.content, "alpha");
        assert_eq!(passage.source, "docA");
    }

    #[test]
    fn passage_missing_metadata_defaults_to_empty() {
        let point = ScoredPoint {
            id: "1".into(),
            score: 0.1,
            payload: HashMap::new(),
        };
        let passage = Passage::from(point);
        assert!(passage.content.is_empty());
        assert!(passage.source.is_empty());
    }
}
