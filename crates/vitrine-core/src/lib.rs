//! Vitrine Core: shared types, traits, errors, and text utilities.
//!
//! This crate provides the foundational types used across all Vitrine
//! crates. It has no internal Vitrine dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error taxonomy and Result alias
//! - [`types`]: Canonical product, variant, chunk, and result types
//! - [`text`]: Diacritic folding and bounded-text helpers
//! - [`traits`]: Storage seams (lexical, vector, product, chunk stores)

pub mod error;
pub mod text;
pub mod traits;
pub mod types;

// Re-export key types at crate root for convenience
pub use error::{Error, ErrorKind, Result};
pub use traits::{ChunkStore, LexicalStore, ProductStore, VectorStore};
pub use types::{
    ChunkKind, EMBEDDING_DIMENSION, EmbeddingChunk, Product, SEARCH_BOOSTER_MAX_CHARS, SearchResult,
    Variant, VectorHit,
};
