//! Storage seams.
//!
//! Ingestion and search talk to storage only through these traits. The
//! datastore behind them (SQL, a vector database, the in-memory reference
//! store in `vitrine-store`) is an external collaborator.
//!
//! All traits require `Send + Sync` so a single store can be shared
//! behind an `Arc` by concurrent search branches.

use async_trait::async_trait;

use crate::Result;
use crate::types::{EmbeddingChunk, Product, VectorHit};

/// Substring matching over product text.
#[async_trait]
pub trait LexicalStore: Send + Sync {
    /// Return up to `cap` products whose title or search booster contains
    /// `term` or `folded_term` (case-insensitive), in store-defined order.
    async fn find_by_text_match(
        &self,
        term: &str,
        folded_term: &str,
        cap: usize,
    ) -> Result<Vec<Product>>;
}

/// Nearest-neighbor search over stored chunk embeddings.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Return up to `k` chunk matches, best first. A product may appear
    /// more than once when several of its chunks match.
    async fn nearest_neighbors(&self, embedding: &[f32], k: usize) -> Result<Vec<VectorHit>>;
}

/// Canonical product rows.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Fetch products by id. Unknown ids are skipped; order is unspecified.
    async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<Product>>;

    /// Insert or replace products keyed on URL. Returns rows written.
    ///
    /// Backends without a unique URL constraint return
    /// [`Error::UpsertUnsupported`](crate::Error::UpsertUnsupported).
    async fn upsert_products(&self, products: &[Product]) -> Result<usize>;

    /// Insert products without conflict resolution. Returns rows written.
    async fn insert_products(&self, products: &[Product]) -> Result<usize>;
}

/// Embedding chunk rows.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Delete every chunk of `product_id`, then insert `chunks`.
    async fn replace_chunks(&self, product_id: &str, chunks: Vec<EmbeddingChunk>) -> Result<()>;
}
