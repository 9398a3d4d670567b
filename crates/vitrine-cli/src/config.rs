//! Configuration for the Vitrine CLI.
//!
//! Provides the [`VitrineConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `VITRINE_CONFIG` environment variable
//! 3. XDG default: `~/.config/vitrine/config.toml`
//! 4. Built-in defaults
//!
//! `VITRINE_<SECTION>_<KEY>` variables overlay the `embedding`, `search`
//! and `store` sections.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use confyg::{Confygery, env};
use serde::{Deserialize, Serialize};
use vitrine_core::{Error, Result};
use vitrine_search::DEFAULT_LIMIT;
use vitrine_vector::openai::DEFAULT_BASE_URL;
use vitrine_vector::{EmbeddingProvider, MockEmbeddingProvider, OpenAiEmbeddingProvider};

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VitrineConfig {
    /// Project name, used in log lines and the default store path.
    pub project_name: String,

    /// Embedding provider settings.
    pub embedding: EmbeddingConfig,

    /// Query defaults.
    pub search: SearchConfig,

    /// Snapshot store settings.
    pub store: StoreConfig,
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// `"openai"` or `"mock"`.
    pub provider: String,

    /// Model name sent to the provider.
    pub model: String,

    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

/// Query defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Results returned when `--limit` is not given.
    pub default_limit: usize,
}

/// Snapshot store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Snapshot directory.
    pub path: String,

    /// Whether the store enforces unique product URLs (enables upsert).
    pub unique_url: bool,
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for VitrineConfig {
    fn default() -> Self {
        Self {
            project_name: "vitrine".to_string(),
            embedding: EmbeddingConfig::default(),
            search: SearchConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "./.vitrine".to_string(),
            unique_url: true,
        }
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl VitrineConfig {
    /// Load configuration from file, environment, and defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path)
            && path.exists()
        {
            builder
                .add_file(&path.to_string_lossy())
                .map_err(|e| Error::config(format!("config file: {e}")))?;
        }

        let mut env_opts = env::Options::with_top_level("VITRINE");
        env_opts.add_section("embedding");
        env_opts.add_section("search");
        env_opts.add_section("store");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let config: Self = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;

        Ok(config)
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var("VITRINE_CONFIG") {
            return Some(PathBuf::from(path));
        }
        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("vitrine").join("config.toml"))
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Flatten this config into environment variable pairs with `VITRINE_` prefix.
    pub fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let value: toml::Value =
            toml::Value::try_from(self).map_err(|e| Error::config(e.to_string()))?;
        let mut vars = Vec::new();
        flatten_toml_value(&value, "VITRINE", &mut vars);
        Ok(vars)
    }

    /// Snapshot directory.
    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(&self.store.path)
    }

    /// Build the configured embedding provider.
    ///
    /// A missing API key is not an error here; the provider reports it from
    /// `validate()` before the first request.
    pub fn embedding_provider(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        match self.embedding.provider.as_str() {
            "mock" => Ok(Arc::new(MockEmbeddingProvider::default())),
            "openai" => {
                let api_key = std::env::var(&self.embedding.api_key_env).unwrap_or_default();
                Ok(Arc::new(OpenAiEmbeddingProvider::with_options(
                    api_key,
                    &self.embedding.model,
                    &self.embedding.base_url,
                    Duration::from_secs(self.embedding.timeout_secs),
                )?))
            }
            other => Err(Error::config(format!(
                "unknown embedding provider '{other}' (expected \"openai\" or \"mock\")"
            ))),
        }
    }
}

// ============================================================================
// Helper: flatten TOML to env vars
// ============================================================================

/// Recursively flatten a TOML value into `KEY=value` pairs.
fn flatten_toml_value(value: &toml::Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                flatten_toml_value(val, &format!("{prefix}_{}", key.to_uppercase()), out);
            }
        }
        toml::Value::Array(arr) => {
            if let Ok(json) = serde_json::to_string(arr) {
                out.push((prefix.to_string(), json));
            }
        }
        toml::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

// ============================================================================
// Tests
// ============================================================================
