//! Snapshot persistence and freshness checking.
//!
//! A snapshot directory holds two files: [`CATALOG_FILE`] with every product
//! and chunk, and [`METADATA_FILE`] describing how it was built. The content
//! hash of the source files is stored in the metadata; when it matches a
//! freshly computed hash the snapshot is still valid and ingestion can be
//! skipped.

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use vitrine_core::{EMBEDDING_DIMENSION, Error, Result};

use crate::memory::{Catalog, MemoryStore};

/// Products and chunks.
pub const CATALOG_FILE: &str = "catalog.json";
/// Build metadata.
pub const METADATA_FILE: &str = "snapshot_metadata.json";

/// Metadata stored alongside a snapshot for freshness checking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// Hash of the source files at build time.
    pub content_hash: String,

    /// Number of products stored.
    pub product_count: usize,

    /// Number of chunks stored.
    pub chunk_count: usize,

    /// Embedding dimension.
    pub embedding_dimension: usize,

    /// Build timestamp (RFC 3339).
    pub built_at: String,

    /// Embedding provider name.
    pub provider: String,

    /// Model name used for embeddings.
    pub model: String,
}

impl SnapshotMetadata {
    /// Metadata for a snapshot built now; counts are filled in on save.
    pub fn new(
        content_hash: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            content_hash: content_hash.into(),
            product_count: 0,
            chunk_count: 0,
            embedding_dimension: EMBEDDING_DIMENSION,
            built_at: chrono::Utc::now().to_rfc3339(),
            provider: provider.into(),
            model: model.into(),
        }
    }
}

/// Hash the contents of `paths`, in order.
pub fn hash_sources<P: AsRef<Path>>(paths: &[P]) -> Result<String> {
    let mut hasher = blake3::Hasher::new();
    for path in paths {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::io_with_path(e, path))?;
        hasher.update(path.to_string_lossy().as_bytes());
        hasher.update(&(bytes.len() as u64).to_le_bytes());
        hasher.update(&bytes);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Whether the snapshot in `dir` was built from content hashing to
/// `current_hash`. A missing or unreadable snapshot is never fresh.
pub fn is_snapshot_fresh(dir: &Path, current_hash: &str) -> bool {
    if !dir.join(CATALOG_FILE).is_file() {
        return false;
    }
    match load_metadata(dir) {
        Ok(metadata) => metadata.content_hash == current_hash,
        Err(_) => false,
    }
}

/// Load snapshot metadata from `dir`.
pub fn load_metadata(dir: &Path) -> Result<SnapshotMetadata> {
    let path = dir.join(METADATA_FILE);
    let json = std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
    Ok(serde_json::from_str(&json)?)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(|e| Error::io_with_path(e, path))
}

impl MemoryStore {
    /// Write the catalog and metadata to `dir`, creating it if needed.
    ///
    /// Counts in `metadata` are overwritten with the stored totals; the
    /// saved metadata is returned.
    pub async fn save_snapshot(
        &self,
        dir: &Path,
        mut metadata: SnapshotMetadata,
    ) -> Result<SnapshotMetadata> {
        std::fs::create_dir_all(dir).map_err(|e| Error::io_with_path(e, dir))?;
        let catalog = self.catalog().await;
        metadata.product_count = catalog.products.len();
        metadata.chunk_count = catalog.chunks.len();

        write_json(&dir.join(CATALOG_FILE), &catalog)?;
        write_json(&dir.join(METADATA_FILE), &metadata)?;
        debug!(
            "saved snapshot to {} ({} products, {} chunks)",
            dir.display(),
            metadata.product_count,
            metadata.chunk_count
        );
        Ok(metadata)
    }

    /// Load a store from the snapshot in `dir`.
    pub fn load_snapshot(dir: &Path, unique_url: bool) -> Result<Self> {
        let path = dir.join(CATALOG_FILE);
        if !path.is_file() {
            return Err(Error::not_found(format!(
                "no snapshot at {}",
                dir.display()
            )));
        }
        let json = std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
        let catalog: Catalog = serde_json::from_str(&json)?;
        debug!(
            "loaded snapshot from {} ({} products, {} chunks)",
            dir.display(),
            catalog.products.len(),
            catalog.chunks.len()
        );
        Ok(Self::from_catalog(catalog, unique_url))
    }
}

// ============================================================================
// Tests
// ============================================================================
