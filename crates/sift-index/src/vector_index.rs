use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use crate::error::IndexError;
use crate::types::{FetchedPoint, IndexedPoint, MetadataFilter, ScoredPoint};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A vector index bound to a single named index/collection.
///
/// Implementations are shared read-only handles: every method takes `&self`
/// and must be safe to call concurrently from independent requests.
pub trait VectorIndex: Send + Sync {
    /// Insert or replace points by id.
    fn upsert(&self, points: Vec<IndexedPoint>) -> BoxFuture<'_, Result<(), IndexError>>;

    /// Top-k similarity query with full metadata.
    ///
    /// Results are ordered by descending score. When `filter` is set only points
    /// it admits are ranked.
    fn query(
        &self,
        vector: Vec<f32>,
        top_k: u64,
        filter: Option<MetadataFilter>,
    ) -> BoxFuture<'_, Result<Vec<ScoredPoint>, IndexError>>;

    /// Fetch points by id. Ids that do not exist are absent from the map.
    fn fetch(
        &self,
        ids: Vec<String>,
    ) -> BoxFuture<'_, Result<HashMap<String, FetchedPoint>, IndexError>>;

    /// Backend name for logs.
    fn backend(&self) -> &'static str;
}
