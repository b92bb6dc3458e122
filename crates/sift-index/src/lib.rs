//! Vector index abstraction: top-k similarity query with metadata filtering,
//! fetch by id, and upsert.

pub mod error;
pub mod memory;
pub mod pinecone;
pub mod qdrant;
pub mod types;
pub mod vector_index;

pub use error::{IndexError, Result};
pub use memory::InMemoryIndex;
pub use pinecone::PineconeIndex;
pub use qdrant::QdrantIndex;
pub use types::{FetchedPoint, IndexedPoint, MetadataFilter, Payload, ScoredPoint};
pub use vector_index::{BoxFuture, VectorIndex};
