//! Qdrant backend over the gRPC client.

use std::collections::HashMap;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::{
    Condition, Filter, GetPointsBuilder, PointId, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, Value, value::Kind,
};

use crate::error::{IndexError, Result};
use crate::types::{FetchedPoint, IndexedPoint, MetadataFilter, Payload, ScoredPoint};
use crate::vector_index::{BoxFuture, VectorIndex};

/// One Qdrant collection.
#[derive(Clone)]
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
}

impl std::fmt::Debug for QdrantIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantIndex")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl QdrantIndex {
    /// Connect to `collection` on the Qdrant server at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the Qdrant client cannot be created.
    pub fn new(url: &str, api_key: Option<String>, collection: impl Into<String>) -> Result<Self> {
        let mut builder = Qdrant::from_url(url);
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }
        let client = builder.build().map_err(Box::new)?;
        Ok(Self {
            client,
            collection: collection.into(),
        })
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    async fn query_inner(
        &self,
        vector: Vec<f32>,
        top_k: u64,
        filter: Option<MetadataFilter>,
    ) -> Result<Vec<ScoredPoint>> {
        let mut builder =
            SearchPointsBuilder::new(&self.collection, vector, top_k).with_payload(true);
        if let Some(f) = filter {
            builder = builder.filter(Filter::must([Condition::matches(f.field, f.any_of)]));
        }
        let response = self.client.search_points(builder).await.map_err(Box::new)?;
        Ok(response
            .result
            .into_iter()
            .map(|p| ScoredPoint {
                id: p.id.as_ref().map(point_id_to_string).unwrap_or_default(),
                score: p.score,
                payload: payload_to_json(p.payload),
            })
            .collect())
    }

    async fn fetch_inner(&self, ids: Vec<String>) -> Result<HashMap<String, FetchedPoint>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let point_ids = ids
            .iter()
            .map(|id| parse_point_id(id))
            .collect::<Result<Vec<_>>>()?;
        let response = self
            .client
            .get_points(GetPointsBuilder::new(&self.collection, point_ids).with_payload(true))
            .await
            .map_err(Box::new)?;
        Ok(response
            .result
            .into_iter()
            .filter_map(|p| {
                let id = point_id_to_string(p.id.as_ref()?);
                Some((
                    id.clone(),
                    FetchedPoint {
                        id,
                        payload: payload_to_json(p.payload),
                    },
                ))
            })
            .collect())
    }

    async fn upsert_inner(&self, points: Vec<IndexedPoint>) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        let structs = points
            .into_iter()
            .map(|p| {
                let payload: HashMap<String, Value> =
                    serde_json::from_value(serde_json::Value::Object(p.payload.into_iter().collect()))?;
                Ok(PointStruct::new(parse_point_id(&p.id)?, p.vector, payload))
            })
            .collect::<Result<Vec<_>>>()?;
        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, structs).wait(true))
            .await
            .map_err(Box::new)?;
        Ok(())
    }
}

impl VectorIndex for QdrantIndex {
    fn upsert(&self, points: Vec<IndexedPoint>) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.upsert_inner(points))
    }

    fn query(
        &self,
        vector: Vec<f32>,
        top_k: u64,
        filter: Option<MetadataFilter>,
    ) -> BoxFuture<'_, Result<Vec<ScoredPoint>>> {
        Box::pin(self.query_inner(vector, top_k, filter))
    }

    fn fetch(&self, ids: Vec<String>) -> BoxFuture<'_, Result<HashMap<String, FetchedPoint>>> {
        Box::pin(self.fetch_inner(ids))
    }

    fn backend(&self) -> &'static str {
        "qdrant"
    }
}

/// Qdrant ids are unsigned integers or UUIDs.
fn parse_point_id(id: &str) -> Result<PointId> {
    if let Ok(n) = id.parse::<u64>() {
        return Ok(PointId::from(n));
    }
    match uuid::Uuid::parse_str(id) {
        Ok(u) => Ok(PointId::from(u.to_string())),
        Err(_) => Err(IndexError::InvalidId(id.to_owned())),
    }
}

fn point_id_to_string(id: &PointId) -> String {
    match &id.point_id_options {
        Some(PointIdOptions::Num(n)) => n.to_string(),
        Some(PointIdOptions::Uuid(u)) => u.clone(),
        None => String::new(),
    }
}

fn payload_to_json(payload: HashMap<String, Value>) -> Payload {
    payload
        .into_iter()
        .map(|(k, v)| (k, value_to_json(v)))
        .collect()
}

fn value_to_json(value: Value) -> serde_json::Value {
    match value.kind {
        None | Some(Kind::NullValue(_)) => serde_json::Value::Null,
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(Kind::IntegerValue(i)) => serde_json::Value::from(i),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(d)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        Some(Kind::StringValue(s)) => serde_json::Value::String(s),
        Some(Kind::ListValue(list)) => {
            serde_json::Value::Array(list.values.into_iter().map(value_to_json).collect())
        }
        Some(Kind::StructValue(st)) => serde_json::Value::Object(
            st.fields
                .into_iter()
                .map(|(k, v)| (k, value_to_json(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_map_to_num_points() {
        let id = parse_point_id("41").unwrap();
        assert_eq!(id.point_id_options, Some(PointIdOptions::Num(41)));
        assert_eq!(point_id_to_string(&id), "41");
    }

    #[test]
    fn uuid_ids_round_trip() {
        let raw = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        let id = parse_point_id(raw).unwrap();
        assert_eq!(point_id_to_string(&id), raw);
    }

    #[test]
    fn other_ids_are_rejected() {
        assert!(matches!(
            parse_point_id("chunk-7"),
            Err(IndexError::InvalidId(s)) if s == "chunk-7"
        ));
    }

    #[test]
    fn payload_conversion_keeps_strings_and_numbers() {
        let payload = HashMap::from([
            ("page_content".to_owned(), Value::from("hello")),
            ("page".to_owned(), Value::from(3_i64)),
            ("score".to_owned(), Value::from(0.5_f64)),
            ("draft".to_owned(), Value::from(false)),
        ]);
        let json = payload_to_json(payload);
        assert_eq!(json["page_content"], serde_json::json!("hello"));
        assert_eq!(json["page"], serde_json::json!(3));
        assert_eq!(json["score"], serde_json::json!(0.5));
        assert_eq!(json["draft"], serde_json::json!(false));
    }

    #[test]
    fn nan_double_becomes_null() {
        assert_eq!(value_to_json(Value::from(f64::NAN)), serde_json::Value::Null);
    }

    #[test]
    fn new_accepts_url_without_connecting() {
        let index = QdrantIndex::new("http://localhost:6334", None, "docs").unwrap();
        assert_eq!(index.collection(), "docs");
        assert_eq!(index.backend(), "qdrant");
    }

    #[test]
    fn debug_hides_client() {
        let index =
            QdrantIndex::new("http://localhost:6334", Some("qd-secret".into()), "docs").unwrap();
        let dbg = format!("{index:?}");
        assert!(dbg.contains("docs"));
        assert!(!dbg.contains("qd-secret"));
    }
}
