//! Batch ingestion pipeline.
//!
//! ```text
//! raw records ─► normalize ─► dedup by URL ─► upsert rows ─► embed + replace chunks
//!                  (drop)       (first wins)   (or insert)     (per product, sequential)
//! ```
//!
//! Row writes are all-or-nothing for the batch; chunk writes are per product
//! and a failure there is logged and counted without stopping the batch.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vitrine_core::{ChunkStore, Error, Product, ProductStore, Result};
use vitrine_vector::{EmbeddingProvider, embed_batch_checked};

use crate::chunks::{ChunkDraft, build_chunks};
use crate::normalizer::Normalizer;

/// Outcome counts for one ingestion batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Product rows written by the store.
    pub inserted: usize,
    /// Records dropped by the normalizer.
    pub rejected: usize,
    /// Records dropped because an earlier record had the same URL.
    pub duplicates: usize,
    /// Products whose chunks could not be embedded or stored.
    pub chunk_failures: usize,
    /// Whether rows were written with the plain-insert fallback.
    pub upsert_fallback: bool,
}

/// A normalized product together with its chunk texts.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedProduct {
    pub product: Product,
    pub chunks: Vec<ChunkDraft>,
}

impl PreparedProduct {
    /// Build chunks for an already-normalized product.
    pub fn new(product: Product) -> Self {
        let chunks = build_chunks(&product);
        Self { product, chunks }
    }
}

/// Writes catalog records into product and chunk storage.
pub struct IngestionPipeline {
    normalizer: Normalizer,
    provider: Arc<dyn EmbeddingProvider>,
    products: Arc<dyn ProductStore>,
    chunks: Arc<dyn ChunkStore>,
}

impl IngestionPipeline {
    /// Create a pipeline with the standard normalizer.
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        products: Arc<dyn ProductStore>,
        chunks: Arc<dyn ChunkStore>,
    ) -> Result<Self> {
        Ok(Self::with_normalizer(
            Normalizer::new()?,
            provider,
            products,
            chunks,
        ))
    }

    /// Create a pipeline with a custom normalizer.
    pub fn with_normalizer(
        normalizer: Normalizer,
        provider: Arc<dyn EmbeddingProvider>,
        products: Arc<dyn ProductStore>,
        chunks: Arc<dyn ChunkStore>,
    ) -> Self {
        Self {
            normalizer,
            provider,
            products,
            chunks,
        }
    }

    /// Normalize and chunk one record.
    pub fn prepare(&self, record: &Value) -> Option<PreparedProduct> {
        self.normalizer.normalize(record).map(PreparedProduct::new)
    }

    /// Ingest a batch of raw records.
    pub async fn ingest(&self, records: &[Value]) -> Result<IngestReport> {
        self.provider.validate()?;

        let mut report = IngestReport::default();
        let prepared: Vec<PreparedProduct> = records
            .iter()
            .filter_map(|record| {
                let item = self.prepare(record);
                if item.is_none() {
                    report.rejected += 1;
                }
                item
            })
            .collect();

        let survivors = dedup_by_url(prepared);
        report.duplicates = records.len() - report.rejected - survivors.len();
        debug!(
            "prepared {} products ({} rejected, {} duplicates)",
            survivors.len(),
            report.rejected,
            report.duplicates
        );

        if survivors.is_empty() {
            info!("nothing to ingest");
            return Ok(report);
        }

        let rows: Vec<Product> = survivors.iter().map(|p| p.product.clone()).collect();
        report.inserted = match self.products.upsert_products(&rows).await {
            Ok(written) => written,
            Err(Error::UpsertUnsupported(reason)) => {
                warn!("upsert unsupported ({reason}); falling back to plain insert");
                report.upsert_fallback = true;
                self.products
                    .insert_products(&rows)
                    .await
                    .map_err(|e| e.into_upstream("product store"))?
            }
            Err(e) => return Err(e.into_upstream("product store")),
        };

        for item in survivors {
            if let Err(e) = self.store_chunks(item.product.id.as_str(), item.chunks).await {
                warn!("failed to store chunks for '{}': {e}", item.product.id);
                report.chunk_failures += 1;
            }
        }

        info!(
            "ingested {} products ({} rejected, {} duplicates, {} chunk failures)",
            report.inserted, report.rejected, report.duplicates, report.chunk_failures
        );
        Ok(report)
    }

    /// Read JSON catalog files and ingest their records.
    pub async fn ingest_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<IngestReport> {
        let records = read_raw_records(paths)?;
        self.ingest(&records).await
    }

    async fn store_chunks(&self, product_id: &str, drafts: Vec<ChunkDraft>) -> Result<()> {
        let texts: Vec<&str> = drafts.iter().map(|d| d.content.as_str()).collect();
        let vectors = embed_batch_checked(self.provider.as_ref(), &texts).await?;
        let chunks = drafts
            .into_iter()
            .zip(vectors)
            .map(|(draft, vector)| draft.into_chunk(product_id, vector))
            .collect();
        self.chunks
            .replace_chunks(product_id, chunks)
            .await
            .map_err(|e| e.into_upstream("chunk store"))
    }
}

fn dedup_by_url(items: Vec<PreparedProduct>) -> Vec<PreparedProduct> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.product.url.clone()))
        .collect()
}

/// Read raw records from JSON files, in path order.
///
/// Each file holds either a JSON array of records or an object with a
/// `products` array. Any unreadable or malformed file fails the whole read.
pub fn read_raw_records<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Value>> {
    let mut records = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        let value: Value = serde_json::from_str(&content)
            .map_err(|e| Error::invalid_data(format!("{}: {e}", path.display())))?;
        match value {
            Value::Array(items) => records.extend(items),
            Value::Object(mut map) => match map.remove("products") {
                Some(Value::Array(items)) => records.extend(items),
                _ => {
                    return Err(Error::invalid_data(format!(
                        "{}: expected a JSON array or an object with a 'products' array",
                        path.display()
                    )));
                }
            },
            _ => {
                return Err(Error::invalid_data(format!(
                    "{}: expected a JSON array of records",
                    path.display()
                )));
            }
        }
        debug!("read {}; {} records so far", path.display(), records.len());
    }
    Ok(records)
}

// ============================================================================
// Tests
// ============================================================================
