//! Storage adapters for Vitrine.
//!
//! [`MemoryStore`] implements every storage trait from `vitrine-core`
//! (lexical, vector, product and chunk) over a single in-process catalog.
//! It backs the command line and the test suites.
//!
//! The [`persistence`] module saves and restores the catalog as JSON, with
//! a content hash so unchanged sources can skip re-ingestion.

pub mod memory;
pub mod persistence;

pub use memory::{Catalog, MemoryStore, cosine_similarity};
pub use persistence::{
    CATALOG_FILE, METADATA_FILE, SnapshotMetadata, hash_sources, is_snapshot_fresh, load_metadata,
};
