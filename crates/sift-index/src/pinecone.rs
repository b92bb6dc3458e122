//! Pinecone data-plane REST backend.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};
use crate::types::{FetchedPoint, IndexedPoint, MetadataFilter, Payload, ScoredPoint};
use crate::vector_index::{BoxFuture, VectorIndex};

const API_VERSION: &str = "2024-07";
const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";

/// A single Pinecone index addressed by its data-plane host.
pub struct PineconeIndex {
    client: reqwest::Client,
    api_key: String,
    host: url::Url,
    namespace: Option<String>,
}

impl fmt::Debug for PineconeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PineconeIndex")
            .field("api_key", &"<redacted>")
            .field("host", &self.host.as_str())
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl PineconeIndex {
    /// Address an index by its data-plane host (`https://<index>-<project>.svc.<env>.pinecone.io`).
    ///
    /// A host given without a scheme is treated as `https://`.
    ///
    /// # Errors
    ///
    /// Returns an error if `host` is not a valid URL.
    pub fn new(api_key: String, host: &str) -> Result<Self> {
        Ok(Self {
            client: default_client(),
            api_key,
            host: parse_host(host)?,
            namespace: None,
        })
    }

    /// Resolve the data-plane host of `index_name` through the control plane.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be described.
    pub async fn connect(api_key: String, index_name: &str) -> Result<Self> {
        Self::connect_via(api_key, index_name, CONTROL_PLANE_URL).await
    }

    /// Same as [`PineconeIndex::connect`] against a custom control-plane URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be described.
    pub async fn connect_via(api_key: String, index_name: &str, control_plane: &str) -> Result<Self> {
        let client = default_client();
        let url = format!("{}/indexes/{index_name}", control_plane.trim_end_matches('/'));
        let response = client
            .get(url)
            .header("Api-Key", &api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await?;
        let description: IndexDescription = checked_json(response).await?;
        tracing::debug!(index = index_name, host = %description.host, "resolved Pinecone index host");
        Ok(Self {
            client,
            api_key,
            host: parse_host(&description.host)?,
            namespace: None,
        })
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace.filter(|ns| !ns.is_empty());
        self
    }

    fn endpoint(&self, path: &str) -> Result<url::Url> {
        Ok(self.host.join(path)?)
    }

    fn post(&self, url: url::Url) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    async fn query_inner(
        &self,
        vector: Vec<f32>,
        top_k: u64,
        filter: Option<MetadataFilter>,
    ) -> Result<Vec<ScoredPoint>> {
        let body = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            filter: filter.as_ref().map(filter_to_json),
            namespace: self.namespace.as_deref(),
        };
        let response = self.post(self.endpoint("query")?).json(&body).send().await?;
        let parsed: QueryResponse = checked_json(response).await?;
        Ok(parsed
            .matches
            .into_iter()
            .map(|m| ScoredPoint {
                id: m.id,
                score: m.score,
                payload: m.metadata.unwrap_or_default(),
            })
            .collect())
    }

    async fn fetch_inner(&self, ids: Vec<String>) -> Result<HashMap<String, FetchedPoint>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut url = self.endpoint("vectors/fetch")?;
        {
            let mut pairs = url.query_pairs_mut();
            for id in &ids {
                pairs.append_pair("ids", id);
            }
            if let Some(ns) = &self.namespace {
                pairs.append_pair("namespace", ns);
            }
        }
        let response = self
            .client
            .get(url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await?;
        let parsed: FetchResponse = checked_json(response).await?;
        Ok(parsed
            .vectors
            .into_iter()
            .map(|(id, v)| {
                let point = FetchedPoint {
                    id: v.id.unwrap_or_else(|| id.clone()),
                    payload: v.metadata.unwrap_or_default(),
                };
                (id, point)
            })
            .collect())
    }

    async fn upsert_inner(&self, points: Vec<IndexedPoint>) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        let body = UpsertRequest {
            vectors: points
                .into_iter()
                .map(|p| UpsertVector {
                    id: p.id,
                    values: p.vector,
                    metadata: p.payload,
                })
                .collect(),
            namespace: self.namespace.as_deref(),
        };
        let response = self
            .post(self.endpoint("vectors/upsert")?)
            .json(&body)
            .send()
            .await?;
        let _: serde_json::Value = checked_json(response).await?;
        Ok(())
    }
}

impl VectorIndex for PineconeIndex {
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
        "pinecone"
    }
}

/// Same settings as the provider client in `sift-llm`.
fn default_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(concat!("sift/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("reqwest client with static settings")
}

fn parse_host(host: &str) -> Result<url::Url> {
    let with_scheme = if host.contains("://") {
        host.to_owned()
    } else {
        format!("https://{host}")
    };
    // Trailing slash so `join` appends instead of replacing the last segment.
    let normalized = format!("{}/", with_scheme.trim_end_matches('/'));
    Ok(url::Url::parse(&normalized)?)
}

fn filter_to_json(filter: &MetadataFilter) -> serde_json::Value {
    serde_json::json!({ filter.field.as_str(): { "$in": filter.any_of } })
}

async fn checked_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        tracing::error!(%status, "Pinecone API error: {text}");
        return Err(IndexError::Status {
            backend: "pinecone",
            status: status.as_u16(),
        });
    }
    Ok(serde_json::from_str(&text)?)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: Vec<f32>,
    top_k: u64,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Payload>,
}

#[derive(Deserialize)]
struct FetchResponse {
    #[serde(default)]
    vectors: HashMap<String, FetchedVector>,
}

#[derive(Deserialize)]
struct FetchedVector {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    metadata: Option<Payload>,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<UpsertVector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Serialize)]
struct UpsertVector {
    id: String,
    values: Vec<f32>,
    metadata: Payload,
}

#[derive(Deserialize)]
struct IndexDescription {
    host: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn index_for(server: &MockServer) -> PineconeIndex {
        PineconeIndex::new("pc-secret".into(), &server.uri()).unwrap()
    }

    #[test]
    fn parse_host_adds_scheme_and_slash() {
        let url = parse_host("idx-abc.svc.us-east-1.pinecone.io").unwrap();
        assert_eq!(url.as_str(), "https://idx-abc.svc.us-east-1.pinecone.io/");
        assert_eq!(
            url.join("query").unwrap().as_str(),
            "https://idx-abc.svc.us-east-1.pinecone.io/query"
        );
    }

    #[test]
    fn filter_serializes_as_in_operator() {
        let json = filter_to_json(&MetadataFilter::field_in("source", ["docA", "docB"]));
        assert_eq!(json, serde_json::json!({"source": {"$in": ["docA", "docB"]}}));
    }

    #[test]
    fn query_request_uses_camel_case() {
        let body = QueryRequest {
            vector: vec![0.5],
            top_k: 5,
            include_metadata: true,
            include_values: false,
            filter: None,
            namespace: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["topK"], 5);
        assert_eq!(json["includeMetadata"], true);
        assert!(json.get("filter").is_none());
        assert!(json.get("namespace").is_none());
    }

    #[test]
    fn debug_redacts_api_key() {
        let index = PineconeIndex::new("pc-secret".into(), "idx.pinecone.io").unwrap();
        let dbg = format!("{index:?}");
        assert!(!dbg.contains("pc-secret"));
        assert!(dbg.contains("idx.pinecone.io"));
    }

    #[tokio::test]
    async fn query_sends_filter_and_parses_matches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(header("api-key", "pc-secret"))
            .and(body_partial_json(serde_json::json!({
                "topK": 5,
                "includeMetadata": true,
                "filter": {"source": {"$in": ["docA"]}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "matches": [
                    {"id": "41", "score": 0.92, "metadata": {"page_content": "alpha", "source": "docA"}},
                    {"id": "7", "score": 0.80, "metadata": {"page_content": "beta", "source": "docA"}}
                ],
                "namespace": ""
            })))
            .mount(&server)
            .await;

        let index = index_for(&server);
        let matches = index
            .query(
                vec![0.1, 0.2],
                5,
                Some(MetadataFilter::field_in("source", ["docA"])),
            )
            .await
            .unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "41");
        assert_eq!(matches[0].text("page_content"), Some("alpha"));
        assert!((matches[1].score - 0.80).abs() < 1e-6);
    }

    #[tokio::test]
    async fn requests_identify_as_sift() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(header("user-agent", concat!("sift/", env!("CARGO_PKG_VERSION"))))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"matches": []})))
            .expect(1)
            .mount(&server)
            .await;

        let matches = index_for(&server).query(vec![0.1], 1, None).await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn query_error_status_maps_to_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let err = index_for(&server)
            .query(vec![0.1], 3, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IndexError::Status {
                backend: "pinecone",
                status: 503
            }
        ));
    }

    #[tokio::test]
    async fn fetch_returns_only_existing_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vectors/fetch"))
            .and(query_param("ids", "42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "vectors": {
                    "42": {"id": "42", "values": [0.1], "metadata": {"page_content": "next chunk", "source": "docA"}}
                },
                "namespace": ""
            })))
            .mount(&server)
            .await;

        let fetched = index_for(&server)
            .fetch(vec!["42".into()])
            .await
            .unwrap();
        assert_eq!(fetched["42"].text("page_content"), Some("next chunk"));
    }

    #[tokio::test]
    async fn fetch_missing_id_yields_empty_map() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vectors/fetch"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"vectors": {}})),
            )
            .mount(&server)
            .await;

        let fetched = index_for(&server)
            .fetch(vec!["9000".into()])
            .await
            .unwrap();
        assert!(fetched.is_empty());
    }

    #[tokio::test]
    async fn upsert_posts_vectors_with_namespace() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vectors/upsert"))
            .and(body_partial_json(serde_json::json!({
                "namespace": "docs",
                "vectors": [{"id": "1", "values": [1.0], "metadata": {"source": "docA"}}]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"upsertedCount": 1})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let index = index_for(&server).with_namespace(Some("docs".into()));
        index
            .upsert(vec![IndexedPoint {
                id: "1".into(),
                vector: vec![1.0],
                payload: HashMap::from([("source".into(), serde_json::json!("docA"))]),
            }])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn connect_resolves_host_from_control_plane() {
        let data_plane = MockServer::start().await;
        let control_plane = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes/abstractive-question-answering"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "abstractive-question-answering",
                "host": data_plane.uri(),
            })))
            .mount(&control_plane)
            .await;

        let index = PineconeIndex::connect_via(
            "pc-secret".into(),
            "abstractive-question-answering",
            &control_plane.uri(),
        )
        .await
        .unwrap();
        assert_eq!(index.host.as_str(), format!("{}/", data_plane.uri()));
    }
}
