use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::IndexError;
use crate::types::{FetchedPoint, IndexedPoint, MetadataFilter, Payload, ScoredPoint};
use crate::vector_index::{BoxFuture, VectorIndex};

struct StoredPoint {
    id: String,
    vector: Vec<f32>,
    payload: Payload,
}

/// Cosine-similarity index held in memory.
///
/// Points keep insertion order, so equal scores rank in the order the points
/// were first upserted.
pub struct InMemoryIndex {
    points: RwLock<Vec<StoredPoint>>,
}

impl InMemoryIndex {
    #[must_use]
    pub fn new() -> Self {
        Self {
            points: RwLock::new(Vec::new()),
        }
    }

    /// Number of stored points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.read().map_or(0, |p| p.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryIndex")
            .field("len", &self.len())
            .finish()
    }
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl VectorIndex for InMemoryIndex {
    fn upsert(&self, points: Vec<IndexedPoint>) -> BoxFuture<'_, Result<(), IndexError>> {
        Box::pin(async move {
            let mut stored = self
                .points
                .write()
                .map_err(|e| IndexError::Other(e.to_string()))?;
            for p in points {
                if let Some(existing) = stored.iter_mut().find(|s| s.id == p.id) {
                    existing.vector = p.vector;
                    existing.payload = p.payload;
                } else {
                    stored.push(StoredPoint {
                        id: p.id,
                        vector: p.vector,
                        payload: p.payload,
                    });
                }
            }
            Ok(())
        })
    }

    fn query(
        &self,
        vector: Vec<f32>,
        top_k: u64,
        filter: Option<MetadataFilter>,
    ) -> BoxFuture<'_, Result<Vec<ScoredPoint>, IndexError>> {
        Box::pin(async move {
            let stored = self
                .points
                .read()
                .map_err(|e| IndexError::Other(e.to_string()))?;

            let mut scored: Vec<ScoredPoint> = stored
                .iter()
                .filter(|sp| filter.as_ref().is_none_or(|f| f.matches(&sp.payload)))
                .map(|sp| ScoredPoint {
                    id: sp.id.clone(),
                    score: cosine_similarity(&vector, &sp.vector),
                    payload: sp.payload.clone(),
                })
                .collect();

            // sort_by is stable: ties keep insertion order
            scored.sort_by(|a, b| b.score.total_cmp(&a.score));
            scored.truncate(usize::try_from(top_k).unwrap_or(usize::MAX));
            Ok(scored)
        })
    }

    fn fetch(
        &self,
        ids: Vec<String>,
    ) -> BoxFuture<'_, Result<HashMap<String, FetchedPoint>, IndexError>> {
        Box::pin(async move {
            let stored = self
                .points
                .read()
                .map_err(|e| IndexError::Other(e.to_string()))?;
            let found = ids
                .into_iter()
                .filter_map(|id| {
                    let sp = stored.iter().find(|sp| sp.id == id)?;
                    Some((
                        id.clone(),
                        FetchedPoint {
                            id,
                            payload: sp.payload.clone(),
                        },
                    ))
                })
                .collect();
            Ok(found)
        })
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
