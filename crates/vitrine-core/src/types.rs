//! Canonical catalog and retrieval types.
//!
//! These types are shared by ingestion, storage, and search. A [`Product`]
//! is immutable-by-replacement: ingestion writes whole rows, search only
//! reads them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dimension every stored and query embedding must have.
pub const EMBEDDING_DIMENSION: usize = 1536;

/// Upper bound (in characters) of [`Product::search_booster`].
pub const SEARCH_BOOSTER_MAX_CHARS: usize = 5000;

// ============================================================================
// Catalog
// ============================================================================

/// A canonical, searchable product row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Stable identifier derived from the URL, so it is unique wherever
    /// the URL is.
    pub id: String,

    /// The record's own id, when it had one. Not unique across sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,

    /// Display title (never empty).
    pub title: String,

    /// Normalized integer price.
    pub price: i64,

    /// Canonical product URL; natural dedup key.
    pub url: String,

    /// Primary image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Gallery image URLs.
    #[serde(default)]
    pub gallery: Vec<String>,

    /// Style tags (e.g. "smart-casual").
    #[serde(default)]
    pub style: Vec<String>,

    /// Occasion tags (e.g. "đi làm").
    #[serde(default)]
    pub occasion: Vec<String>,

    /// Items this product pairs well with.
    #[serde(default)]
    pub match_with: Vec<String>,

    /// Editorial recommendation text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub why_recommend: Option<String>,

    /// Plain description text.
    #[serde(default)]
    pub description_text: String,

    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Purchasable variants, owned by this product.
    #[serde(default)]
    pub variants: Vec<Variant>,

    /// Raw return-policy text (may contain HTML).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_policy: Option<String>,

    /// Derived token bag for lexical matching.
    #[serde(default)]
    pub search_booster: String,

    /// Inferred category slug ("khac" when unclassified).
    pub category_guess: String,

    /// Inferred fit ("regular" by default).
    pub fit_guess: String,
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
}

// ============================================================================
// Chunks
// ============================================================================

/// The four fixed-purpose text blocks embedded per product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Overview,
    Features,
    Variants,
    Policy,
}

impl ChunkKind {
    /// All kinds, in the order chunks are built and stored.
    pub const ALL: [ChunkKind; 4] = [
        ChunkKind::Overview,
        ChunkKind::Features,
        ChunkKind::Variants,
        ChunkKind::Policy,
    ];

    /// Lowercase name used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkKind::Overview => "overview",
            ChunkKind::Features => "features",
            ChunkKind::Variants => "variants",
            ChunkKind::Policy => "policy",
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One embedded chunk of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingChunk {
    /// Owning product.
    pub product_id: String,

    /// Which block this is.
    pub kind: ChunkKind,

    /// Text that was embedded.
    pub content: String,

    /// Embedding vector of [`EMBEDDING_DIMENSION`] components.
    pub embedding: Vec<f32>,
}

// ============================================================================
// Retrieval
// ============================================================================

/// A nearest-neighbor match returned by a vector store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorHit {
    /// Product owning the matched chunk.
    pub product_id: String,

    /// 0-based rank in the store's answer.
    pub rank: usize,
}

/// A ranked product for one query. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub product: Product,
    pub fused_score: i64,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_kind_order_and_names() {
        let names: Vec<&str> = ChunkKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["overview", "features", "variants", "policy"]);
        assert_eq!(ChunkKind::Policy.to_string(), "policy");
    }

    #[test]
    fn test_chunk_kind_serializes_lowercase() {
        let json = serde_json::to_string(&ChunkKind::Variants).unwrap();
        assert_eq!(json, "\"variants\"");
    }

    #[test]
    fn test_variant_skips_empty_fields() {
        let variant = Variant {
            size: Some("M".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&variant).unwrap();
        assert_eq!(json, r#"{"size":"M"}"#);
    }
}
