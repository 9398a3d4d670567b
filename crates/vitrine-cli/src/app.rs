//! The Vitrine CLI application.
//!
//! Every command works against the snapshot directory named by
//! `store.path`: `ingest` rebuilds it, `search` and `stats` load it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vitrine_catalog::{IngestReport, IngestionPipeline};
use vitrine_core::{Error, Result, SearchResult};
use vitrine_search::RetrievalEngine;
use vitrine_store::{
    Catalog, MemoryStore, SnapshotMetadata, hash_sources, is_snapshot_fresh, load_metadata,
};

use crate::cli::{CliArgs, Command};
use crate::config::VitrineConfig;
use crate::config_handlers;

/// Initialise tracing-based logging.
///
/// `RUST_LOG` wins when set; otherwise `--quiet` selects warn, `--verbose`
/// debug, and the default is info. Library crates log through `log`, which
/// the subscriber picks up.
pub fn init_logging(verbose: bool, quiet: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if quiet {
        EnvFilter::new("warn")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // A subscriber may already be installed (tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Counts and build metadata of the current snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub products: usize,
    pub chunks: usize,
    pub metadata: Option<SnapshotMetadata>,
}

/// CLI application bound to one loaded configuration.
pub struct VitrineApp {
    config: VitrineConfig,
}

impl VitrineApp {
    pub fn new(config: VitrineConfig) -> Self {
        Self { config }
    }

    /// Create from CLI args, loading config from file/env.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        Ok(Self::new(VitrineConfig::load(args.config.as_deref())?))
    }

    pub fn config(&self) -> &VitrineConfig {
        &self.config
    }

    /// Dispatch a parsed command.
    pub async fn run(&self, args: CliArgs) -> Result<()> {
        match args.command {
            Some(Command::Ingest { files, force }) => {
                match self.ingest(&files, force).await? {
                    Some(report) => println!(
                        "Ingested {} products ({} rejected, {} duplicates, {} chunk failures)",
                        report.inserted, report.rejected, report.duplicates, report.chunk_failures
                    ),
                    None => println!(
                        "Snapshot at {} is up to date; use --force to rebuild",
                        self.config.store.path
                    ),
                }
                Ok(())
            }
            Some(Command::Search { query, limit, json }) => {
                let results = self.search(&query.join(" "), limit).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&results)?);
                } else {
                    print!("{}", render_results(&results));
                }
                Ok(())
            }
            Some(Command::Stats) => {
                let stats = self.stats().await?;
                println!("products: {}", stats.products);
                println!("chunks:   {}", stats.chunks);
                if let Some(meta) = &stats.metadata {
                    println!("built:    {} ({} / {})", meta.built_at, meta.provider, meta.model);
                }
                Ok(())
            }
            Some(Command::Config(config_cmd)) => {
                config_handlers::handle_config_command(args.config.as_deref(), config_cmd.command)
            }
            None => {
                println!(
                    "{} {}: use --help for usage",
                    self.config.project_name,
                    env!("CARGO_PKG_VERSION")
                );
                Ok(())
            }
        }
    }

    /// Ingest `files` into the snapshot.
    ///
    /// Returns `None` without touching the snapshot when it was already
    /// built from identical files and `force` is off. Records are ingested
    /// on top of any existing snapshot.
    pub async fn ingest(&self, files: &[PathBuf], force: bool) -> Result<Option<IngestReport>> {
        let dir = self.config.store_path();
        let hash = hash_sources(files)?;
        if !force && is_snapshot_fresh(&dir, &hash) {
            info!("snapshot at {} is fresh, skipping ingest", dir.display());
            return Ok(None);
        }

        let provider = self.config.embedding_provider()?;
        let store = Arc::new(self.open_or_create(&dir)?);
        let pipeline = IngestionPipeline::new(provider.clone(), store.clone(), store.clone())?;
        let report = pipeline.ingest_files(files).await?;

        let metadata = SnapshotMetadata::new(hash, provider.name(), &self.config.embedding.model);
        store.save_snapshot(&dir, metadata).await?;
        info!(
            "ingested {} products from {} files into {}",
            report.inserted,
            files.len(),
            dir.display()
        );
        Ok(Some(report))
    }

    /// Search the snapshot. `limit` falls back to `search.default_limit`.
    pub async fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<SearchResult>> {
        let store = Arc::new(MemoryStore::load_snapshot(
            &self.config.store_path(),
            self.config.store.unique_url,
        )?);
        let engine = RetrievalEngine::new(
            self.config.embedding_provider()?,
            store.clone(),
            store.clone(),
            store,
        )?;
        engine
            .search(query, limit.or(Some(self.config.search.default_limit)))
            .await
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        let dir = self.config.store_path();
        let store = MemoryStore::load_snapshot(&dir, self.config.store.unique_url)?;
        Ok(StoreStats {
            products: store.product_count().await,
            chunks: store.chunk_count().await,
            metadata: load_metadata(&dir).ok(),
        })
    }

    fn open_or_create(&self, dir: &Path) -> Result<MemoryStore> {
        let unique_url = self.config.store.unique_url;
        match MemoryStore::load_snapshot(dir, unique_url) {
            Ok(store) => Ok(store),
            Err(Error::NotFound(_)) => {
                Ok(MemoryStore::from_catalog(Catalog::default(), unique_url))
            }
            Err(e) => Err(e),
        }
    }
}

fn render_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No matching products.\n".to_string();
    }
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "{:>2}. {} | {} | score {}\n    {}\n",
                i + 1,
                r.product.title,
                r.product.price,
                r.fused_score,
                r.product.url
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use vitrine_core::ErrorKind;

    const CATALOG: &str = r#"{"products": [
        {"title": "Áo Sơ Mi Oxford", "price": 350000, "url": "https://shop.vn/so-mi",
         "tags": ["công sở"]},
        {"title": "Áo Thun Basic", "price": 150000, "url": "https://shop.vn/thun"},
        {"title": "", "price": 1, "url": "https://shop.vn/empty"}
    ]}"#;

    fn test_app(dir: &tempfile::TempDir) -> (VitrineApp, PathBuf) {
        let mut config = VitrineConfig::default();
        config.embedding.provider = "mock".to_string();
        config.store.path = dir.path().join("store").to_string_lossy().into_owned();

        let catalog = dir.path().join("catalog.json");
        std::fs::write(&catalog, CATALOG).unwrap();
        (VitrineApp::new(config), catalog)
    }

    #[tokio::test]
    async fn test_ingest_then_search() {
        let dir = tempfile::TempDir::new().unwrap();
        let (app, catalog) = test_app(&dir);

        let report = app.ingest(&[catalog], false).await.unwrap().unwrap();
        assert_eq!(report.inserted, 2);
        assert_eq!(report.rejected, 1);

        let results = app.search("sơ mi", None).await.unwrap();
        assert_eq!(results[0].product.title, "Áo Sơ Mi Oxford");
        assert!(results.len() <= 8);
    }

    #[tokio::test]
    async fn test_ingest_skips_fresh_snapshot() {
        let dir = tempfile::TempDir::new().unwrap();
        let (app, catalog) = test_app(&dir);
        let files = vec![catalog];

        assert!(app.ingest(&files, false).await.unwrap().is_some());
        assert!(app.ingest(&files, false).await.unwrap().is_none());

        let forced = app.ingest(&files, true).await.unwrap().unwrap();
        assert_eq!(forced.inserted, 2);
        // Upsert by URL keeps the catalog the same size.
        assert_eq!(app.stats().await.unwrap().products, 2);
    }

    #[tokio::test]
    async fn test_stats() {
        let dir = tempfile::TempDir::new().unwrap();
        let (app, catalog) = test_app(&dir);
        app.ingest(&[catalog], false).await.unwrap();

        let stats = app.stats().await.unwrap();
        assert_eq!(stats.products, 2);
        assert_eq!(stats.chunks, 8);
        let meta = stats.metadata.unwrap();
        assert_eq!(meta.provider, "mock");
        assert_eq!(meta.product_count, 2);
    }

    #[tokio::test]
    async fn test_search_without_snapshot() {
        let dir = tempfile::TempDir::new().unwrap();
        let (app, _) = test_app(&dir);
        let err = app.search("áo", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_empty_query_is_invalid_input() {
        let dir = tempfile::TempDir::new().unwrap();
        let (app, catalog) = test_app(&dir);
        app.ingest(&[catalog], false).await.unwrap();

        let err = app.search("  %_ ", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_ingest_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let (app, _) = test_app(&dir);
        let missing = dir.path().join("missing.json");
        assert!(app.ingest(&[missing], false).await.is_err());
    }

    #[tokio::test]
    async fn test_run_without_command() {
        let dir = tempfile::TempDir::new().unwrap();
        let (app, _) = test_app(&dir);
        let args = CliArgs::parse_from(["vitrine"]);
        assert!(app.run(args).await.is_ok());
    }

    #[test]
    fn test_render_results() {
        assert_eq!(render_results(&[]), "No matching products.\n");
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging(false, true);
        init_logging(true, false);
    }
}
