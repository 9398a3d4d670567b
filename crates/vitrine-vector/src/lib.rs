//! Embedding providers for Vitrine.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     vitrine-vector                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider trait                                    │
//! │  ├── MockEmbeddingProvider (deterministic, offline)         │
//! │  └── OpenAiEmbeddingProvider (OpenAI-compatible HTTP)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  embed_checked / embed_batch_checked (dimension guard)      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use vitrine_vector::{EmbeddingProvider, OpenAiEmbeddingProvider, embed_checked};
//!
//! let provider = OpenAiEmbeddingProvider::new(api_key, "text-embedding-3-small")?;
//! provider.validate()?;
//! let vector = embed_checked(&provider, "áo sơ mi đi làm").await?;
//! ```

pub mod embedding;
pub mod openai;

pub use embedding::{EmbeddingProvider, MockEmbeddingProvider, embed_batch_checked, embed_checked};
pub use openai::OpenAiEmbeddingProvider;
