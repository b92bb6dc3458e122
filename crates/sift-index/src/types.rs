use std::collections::HashMap;

/// Metadata attached to an indexed vector.
pub type Payload = HashMap<String, serde_json::Value>;

/// A vector with its id and metadata, as written to the index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: Payload,
}

/// A similarity-query match.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
    pub id: String,
    pub score: f32,
    pub payload: Payload,
}

/// A point returned by fetch-by-id.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPoint {
    pub id: String,
    pub payload: Payload,
}

impl ScoredPoint {
    /// String metadata field, if present.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        payload_text(&self.payload, field)
    }
}

impl FetchedPoint {
    /// String metadata field, if present.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        payload_text(&self.payload, field)
    }
}

fn payload_text<'a>(payload: &'a Payload, field: &str) -> Option<&'a str> {
    payload.get(field).and_then(serde_json::Value::as_str)
}

/// Inclusion filter: metadata `field` must equal one of `any_of`.
///
/// Backends enforce it before ranking, so a filtered top-k query returns the
/// k best matches among the admitted points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataFilter {
    pub field: String,
    pub any_of: Vec<String>,
}

impl MetadataFilter {
    #[must_use]
    pub fn field_in<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field: field.into(),
            any_of: values.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn matches(&self, payload: &Payload) -> bool {
        payload_text(payload, &self.field)
            .is_some_and(|v| self.any_of.iter().any(|allowed| allowed == v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(source: &str) -> Payload {
        HashMap::from([("source".into(), serde_json::json!(source))])
    }

    #[test]
    fn filter_admits_listed_values() {
        let f = MetadataFilter::field_in("source", ["docA", "docC"]);
        assert!(f.matches(&payload("docA")));
        assert!(f.matches(&payload("docC")));
        assert!(!f.matches(&payload("docB")));
    }

    #[test]
    fn filter_rejects_missing_or_non_string_field() {
        let f = MetadataFilter::field_in("source", ["1"]);
        assert!(!f.matches(&Payload::new()));
        let numeric = HashMap::from([("source".into(), serde_json::json!(1))]);
        assert!(!f.matches(&numeric));
    }

    #[test]
    fn text_reads_string_fields_only() {
        let p = ScoredPoint {
            id: "1".into(),
            score: 0.5,
            payload: HashMap::from([
                ("page_content".into(), serde_json::json!("hello")),
                ("page".into(), serde_json::json!(3)),
            ]),
        };
        assert_eq!(p.text("page_content"), Some("hello"));
        assert_eq!(p.text("page"), None);
        assert_eq!(p.text("missing"), None);
    }
}
