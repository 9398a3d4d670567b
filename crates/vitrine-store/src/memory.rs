//! In-memory store implementing every storage trait.

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use vitrine_core::text::fold;
use vitrine_core::{
    ChunkStore, EmbeddingChunk, Error, LexicalStore, Product, ProductStore, Result, VectorHit,
    VectorStore,
};

/// Everything the store holds, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub products: Vec<Product>,
    pub chunks: Vec<EmbeddingChunk>,
}

/// A catalog held in memory behind an async lock.
///
/// With `unique_url` (the default) upserts replace the row with the same
/// URL in place. [`MemoryStore::without_unique_url`] models a backend with
/// no such constraint: upserts are refused and inserts append duplicates.
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<Catalog>,
    unique_url: bool,
}

impl MemoryStore {
    /// Empty store with a unique URL constraint.
    pub fn new() -> Self {
        Self::from_catalog(Catalog::default(), true)
    }

    /// Empty store without a unique URL constraint.
    pub fn without_unique_url() -> Self {
        Self::from_catalog(Catalog::default(), false)
    }

    /// Wrap an existing catalog.
    pub fn from_catalog(catalog: Catalog, unique_url: bool) -> Self {
        Self {
            state: RwLock::new(catalog),
            unique_url,
        }
    }

    /// Whether upserts are supported.
    pub fn has_unique_url(&self) -> bool {
        self.unique_url
    }

    /// Clone of the current catalog.
    pub async fn catalog(&self) -> Catalog {
        self.state.read().await.clone()
    }

    /// All products in insertion order.
    pub async fn products(&self) -> Vec<Product> {
        self.state.read().await.products.clone()
    }

    /// Chunks belonging to one product.
    pub async fn chunks_for(&self, product_id: &str) -> Vec<EmbeddingChunk> {
        self.state
            .read()
            .await
            .chunks
            .iter()
            .filter(|c| c.product_id == product_id)
            .cloned()
            .collect()
    }

    pub async fn product_count(&self) -> usize {
        self.state.read().await.products.len()
    }

    pub async fn chunk_count(&self) -> usize {
        self.state.read().await.chunks.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Cosine similarity in `[-1.0, 1.0]`; zero when either vector has no norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;
    if denom < 1e-12 {
        return 0.0;
    }
    dot / denom
}

#[async_trait]
impl LexicalStore for MemoryStore {
    async fn find_by_text_match(
        &self,
        term: &str,
        folded_term: &str,
        cap: usize,
    ) -> Result<Vec<Product>> {
        let needles: Vec<String> = [term.to_lowercase(), folded_term.to_lowercase()]
            .into_iter()
            .filter(|n| !n.trim().is_empty())
            .collect();
        if needles.is_empty() {
            return Ok(Vec::new());
        }

        let state = self.state.read().await;
        let matches: Vec<Product> = state
            .products
            .iter()
            .filter(|p| {
                let title = p.title.to_lowercase();
                let folded_title = fold(&p.title);
                let booster = p.search_booster.to_lowercase();
                needles.iter().any(|n| {
                    title.contains(n.as_str())
                        || folded_title.contains(n.as_str())
                        || booster.contains(n.as_str())
                })
            })
            .take(cap)
            .cloned()
            .collect();
        debug!("lexical match '{term}': {} products", matches.len());
        Ok(matches)
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn nearest_neighbors(&self, embedding: &[f32], k: usize) -> Result<Vec<VectorHit>> {
        let state = self.state.read().await;
        let mut scored: Vec<(usize, f32)> = state
            .chunks
            .iter()
            .enumerate()
            .filter(|(_, c)| c.embedding.len() == embedding.len())
            .map(|(i, c)| (i, cosine_similarity(embedding, &c.embedding)))
            .collect();
        // Stable: equal scores keep insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(scored
            .into_iter()
            .take(k)
            .enumerate()
            .map(|(rank, (i, _))| VectorHit {
                product_id: state.chunks[i].product_id.clone(),
                rank,
            })
            .collect())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.products.iter().find(|p| &p.id == id).cloned())
            .collect())
    }

    async fn upsert_products(&self, products: &[Product]) -> Result<usize> {
        if !self.unique_url {
            return Err(Error::upsert_unsupported(
                "no unique constraint on product url",
            ));
        }
        let mut state = self.state.write().await;
        for product in products {
            match state.products.iter().position(|p| p.url == product.url) {
                Some(i) => state.products[i] = product.clone(),
                None => state.products.push(product.clone()),
            }
        }
        Ok(products.len())
    }

    async fn insert_products(&self, products: &[Product]) -> Result<usize> {
        let mut state = self.state.write().await;
        state.products.extend_from_slice(products);
        Ok(products.len())
    }
}

#[async_trait]
impl ChunkStore for MemoryStore {
    async fn replace_chunks(&self, product_id: &str, chunks: Vec<EmbeddingChunk>) -> Result<()> {
        if let Some(stray) = chunks.iter().find(|c| c.product_id != product_id) {
            return Err(Error::invalid_input(format!(
                "chunk for '{}' passed to replace_chunks('{product_id}')",
                stray.product_id
            )));
        }
        let mut state = self.state.write().await;
        state.chunks.retain(|c| c.product_id != product_id);
        state.chunks.extend(chunks);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_core::{ChunkKind, ErrorKind};

    fn product(id: &str, title: &str, url: &str) -> Product {
        Product {
            id: id.to_string(),
            source_id: None,
            title: title.to_string(),
            price: 100_000,
            url: url.to_string(),
            image: None,
            gallery: Vec::new(),
            style: Vec::new(),
            occasion: Vec::new(),
            match_with: Vec::new(),
            why_recommend: None,
            description_text: String::new(),
            tags: Vec::new(),
            variants: Vec::new(),
            return_policy: None,
            search_booster: fold(title),
            category_guess: "khac".to_string(),
            fit_guess: "regular".to_string(),
        }
    }

    fn chunk(product_id: &str, kind: ChunkKind, embedding: Vec<f32>) -> EmbeddingChunk {
        EmbeddingChunk {
            product_id: product_id.to_string(),
            kind,
            content: String::new(),
            embedding,
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_url_in_place() {
        let store = MemoryStore::new();
        store
            .upsert_products(&[product("a", "Áo", "u1"), product("b", "Quần", "u2")])
            .await
            .unwrap();
        store
            .upsert_products(&[product("a", "Áo mới", "u1")])
            .await
            .unwrap();

        let products = store.products().await;
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].title, "Áo mới");
    }

    #[tokio::test]
    async fn test_without_unique_url() {
        let store = MemoryStore::without_unique_url();
        let err = store
            .upsert_products(&[product("a", "Áo", "u1")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UpsertUnsupported(_)));
        assert_eq!(err.kind(), ErrorKind::Storage);

        store.insert_products(&[product("a", "Áo", "u1")]).await.unwrap();
        store.insert_products(&[product("a", "Áo", "u1")]).await.unwrap();
        assert_eq!(store.product_count().await, 2);
    }

    #[tokio::test]
    async fn test_lexical_match_raw_and_folded() {
        let store = MemoryStore::new();
        store
            .insert_products(&[
                product("a", "Áo Sơ Mi Trắng", "u1"),
                product("b", "Quần tây", "u2"),
                product("c", "Sơ mi đen", "u3"),
            ])
            .await
            .unwrap();

        let hits = store.find_by_text_match("sơ mi", "so mi", 20).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);

        let capped = store.find_by_text_match("sơ mi", "so mi", 1).await.unwrap();
        assert_eq!(capped.len(), 1);

        let none = store.find_by_text_match("  ", "", 20).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_nearest_neighbors_ranked_by_cosine() {
        let store = MemoryStore::new();
        store
            .replace_chunks("a", vec![chunk("a", ChunkKind::Overview, vec![0.0, 1.0])])
            .await
            .unwrap();
        store
            .replace_chunks("b", vec![chunk("b", ChunkKind::Overview, vec![1.0, 0.1])])
            .await
            .unwrap();

        let hits = store.nearest_neighbors(&[1.0, 0.0], 5).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].product_id, "b");
        assert_eq!(hits[0].rank, 0);
        assert_eq!(hits[1].product_id, "a");
        assert_eq!(hits[1].rank, 1);

        let top = store.nearest_neighbors(&[1.0, 0.0], 1).await.unwrap();
        assert_eq!(top.len(), 1);
    }

    #[tokio::test]
    async fn test_replace_chunks_is_total() {
        let store = MemoryStore::new();
        let all: Vec<_> = ChunkKind::ALL
            .iter()
            .map(|&k| chunk("a", k, vec![1.0]))
            .collect();
        store.replace_chunks("a", all.clone()).await.unwrap();
        store.replace_chunks("a", all[..1].to_vec()).await.unwrap();
        assert_eq!(store.chunks_for("a").await.len(), 1);

        let err = store
            .replace_chunks("a", vec![chunk("b", ChunkKind::Policy, vec![1.0])])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(store.chunk_count().await, 1);
    }

    #[tokio::test]
    async fn test_fetch_by_ids_skips_unknown() {
        let store = MemoryStore::new();
        store
            .insert_products(&[product("a", "Áo", "u1"), product("b", "Quần", "u2")])
            .await
            .unwrap();
        let found = store
            .fetch_by_ids(&["b".to_string(), "zzz".to_string(), "a".to_string()])
            .await
            .unwrap();
        let ids: Vec<_> = found.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}
