//! Embedding providers and the dimension-checked call helpers.
//!
//! Search and ingestion only ever see `dyn EmbeddingProvider`, and only
//! through [`embed_checked`] / [`embed_batch_checked`], which pin the
//! vector length to [`EMBEDDING_DIMENSION`].

use async_trait::async_trait;
use vitrine_core::text::fold;
use vitrine_core::{EMBEDDING_DIMENSION, Error, Result};

/// A text embedding backend, shared by concurrent search branches.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, one output per input, in input order.
    ///
    /// Falls back to sequential `embed` calls.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Check that the provider can be called at all (credentials present).
    ///
    /// Called before any I/O so misconfiguration surfaces as
    /// [`Error::Config`] rather than as an upstream failure.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Length of the vectors this provider returns.
    fn dimension(&self) -> usize;

    /// Short name recorded in logs and snapshot metadata.
    fn name(&self) -> &str;
}

/// Embed one text and enforce the fixed [`EMBEDDING_DIMENSION`].
///
/// Provider failures are attributed to the "embedding provider"
/// dependency; a vector of the wrong length is a contract violation.
pub async fn embed_checked(provider: &dyn EmbeddingProvider, text: &str) -> Result<Vec<f32>> {
    let vector = provider
        .embed(text)
        .await
        .map_err(|e| e.into_upstream("embedding provider"))?;
    check_dimension(provider, &vector)?;
    Ok(vector)
}

/// Batch variant of [`embed_checked`]; also checks the vector count.
pub async fn embed_batch_checked(
    provider: &dyn EmbeddingProvider,
    texts: &[&str],
) -> Result<Vec<Vec<f32>>> {
    let vectors = provider
        .embed_batch(texts)
        .await
        .map_err(|e| e.into_upstream("embedding provider"))?;
    if vectors.len() != texts.len() {
        return Err(Error::upstream(
            "embedding provider",
            format!(
                "{} returned {} embeddings for {} inputs",
                provider.name(),
                vectors.len(),
                texts.len()
            ),
        ));
    }
    for vector in &vectors {
        check_dimension(provider, vector)?;
    }
    Ok(vectors)
}

fn check_dimension(provider: &dyn EmbeddingProvider, vector: &[f32]) -> Result<()> {
    if vector.len() != EMBEDDING_DIMENSION {
        return Err(Error::config(format!(
            "embedding provider '{}' returned {} dimensions, expected {}",
            provider.name(),
            vector.len(),
            EMBEDDING_DIMENSION
        )));
    }
    Ok(())
}

/// Offline provider for tests and `provider = "mock"` runs.
///
/// Each folded word is hashed into one of `dimension` buckets, so texts
/// sharing words point in similar directions. Output is unit length, or all
/// zeros for text without words.
pub struct MockEmbeddingProvider {
    dimension: usize,
}

impl MockEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn bag_of_words(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        if self.dimension == 0 {
            return vector;
        }
        for word in fold(text).split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let hash = fnv1a(word.as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            vector[bucket] += if hash & (1 << 63) == 0 { 1.0 } else { -1.0 };
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    })
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new(EMBEDDING_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.bag_of_words(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| self.bag_of_words(t))
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_core::ErrorKind;

    struct FailingProvider;

    #[async_trait]
    impl EmbeddingProvider for FailingProvider {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(Error::invalid_data("socket closed"))
        }

        fn dimension(&self) -> usize {
            EMBEDDING_DIMENSION
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_mock_provider_default_dimension() {
        let provider = MockEmbeddingProvider::default();
        assert_eq!(provider.dimension(), EMBEDDING_DIMENSION);
        assert_eq!(provider.name(), "mock");
        assert!(provider.validate().is_ok());
    }

    #[tokio::test]
    async fn test_mock_embed_unit_norm() {
        let provider = MockEmbeddingProvider::new(8);
        let embedding = provider.embed("áo sơ mi").await.unwrap();

        assert_eq!(embedding.len(), 8);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_mock_embed_shared_words_are_closer() {
        let provider = MockEmbeddingProvider::default();
        let query = provider.embed("áo sơ mi").await.unwrap();
        let shirt = provider.embed("Áo Sơ Mi Oxford").await.unwrap();
        let trousers = provider.embed("Quần Tây Slim").await.unwrap();

        let dot = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
        assert!(dot(&query, &shirt) > dot(&query, &trousers));
    }

    #[tokio::test]
    async fn test_mock_embed_without_words_is_zero() {
        let provider = MockEmbeddingProvider::new(4);
        assert_eq!(provider.embed(" - ").await.unwrap(), vec![0.0; 4]);
    }

    #[tokio::test]
    async fn test_mock_embed_deterministic() {
        let provider = MockEmbeddingProvider::new(16);
        let e1 = provider.embed("same text").await.unwrap();
        let e2 = provider.embed("same text").await.unwrap();
        assert_eq!(e1, e2);
    }

    #[tokio::test]
    async fn test_embed_checked_accepts_fixed_dimension() {
        let provider = MockEmbeddingProvider::default();
        let vector = embed_checked(&provider, "quần tây").await.unwrap();
        assert_eq!(vector.len(), EMBEDDING_DIMENSION);
    }

    #[tokio::test]
    async fn test_embed_checked_rejects_wrong_dimension() {
        let provider = MockEmbeddingProvider::new(384);
        let err = embed_checked(&provider, "quần tây").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_embed_checked_marks_provider_failure_upstream() {
        let err = embed_checked(&FailingProvider, "x").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamDependency);
    }

    #[tokio::test]
    async fn test_embed_batch_checked() {
        let provider = MockEmbeddingProvider::default();
        let vectors = embed_batch_checked(&provider, &["a", "b", "c", "d"])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 4);
        assert!(vectors.iter().all(|v| v.len() == EMBEDDING_DIMENSION));
    }

    #[test]
    fn test_trait_object_safety() {
        fn _assert_object_safe(_: &dyn EmbeddingProvider) {}
    }
}
