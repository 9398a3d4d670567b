//! Catalog ingestion for Vitrine.
//!
//! Turns heterogeneous raw catalog records into canonical [`Product`]s,
//! derives the four embedding chunks and the lexical search booster, and
//! writes the result to storage.
//!
//! # Modules
//!
//! - [`normalizer`]: Field resolution over ordered fallback paths, price rules
//! - [`rules`]: Regex attribute rules and the inference fold
//! - [`chunks`]: Overview/features/variants/policy chunks and search booster
//! - [`ingest`]: Batch pipeline (normalize, dedup, upsert, embed)
//!
//! [`Product`]: vitrine_core::Product

pub mod chunks;
mod html;
pub mod ingest;
pub mod normalizer;
pub mod rules;

pub use chunks::{ChunkDraft, build_chunks, build_search_booster};
pub use ingest::{IngestReport, IngestionPipeline, PreparedProduct, read_raw_records};
pub use normalizer::{Normalizer, normalize_price, to_array};
pub use rules::{AttributeRule, Attributes, RuleSet, infer_attributes};
