//! OpenAI-compatible embedding provider.
//!
//! Talks to any endpoint implementing `POST {base_url}/embeddings`. Requests
//! ask for [`EMBEDDING_DIMENSION`] dimensions explicitly; the returned
//! length is still verified by [`embed_checked`](crate::embed_checked).
//!
//! No retries happen here: a transient failure surfaces to the caller.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use vitrine_core::{EMBEDDING_DIMENSION, Error, Result};

use crate::embedding::EmbeddingProvider;

/// Default base URL for the OpenAI API.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const SERVICE: &str = "embedding provider";

/// Embedding provider backed by an OpenAI-compatible HTTP API.
pub struct OpenAiEmbeddingProvider {
    api_key: String,
    model: String,
    endpoint: String,
    client: reqwest::Client,
}

impl OpenAiEmbeddingProvider {
    /// Create a provider against the default OpenAI base URL.
    ///
    /// A blank `api_key` is accepted here and reported by
    /// [`EmbeddingProvider::validate`], so callers can build the provider
    /// eagerly and fail before the first request.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::with_options(api_key, model, DEFAULT_BASE_URL, Duration::from_secs(30))
    }

    /// Create a provider with an explicit base URL and request timeout.
    pub fn with_options(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            client,
        })
    }

    async fn request(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.validate()?;
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let body = EmbeddingRequest {
            model: &self.model,
            input: inputs,
            dimensions: EMBEDDING_DIMENSION,
        };

        debug!("requesting {} embeddings from {}", inputs.len(), self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.trim())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::upstream(SERVICE, format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(Error::upstream(
                SERVICE,
                format!("API error {status}: {error_text}"),
            ));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::upstream(SERVICE, format!("failed to parse response: {e}")))?;

        if parsed.data.len() != inputs.len() {
            return Err(Error::upstream(
                SERVICE,
                format!(
                    "returned {} embeddings for {} inputs",
                    parsed.data.len(),
                    inputs.len()
                ),
            ));
        }

        parsed.data.sort_by_key(|entry| entry.index);
        Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.request(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::upstream(SERVICE, "no embedding returned"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.request(texts).await
    }

    fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::config("missing embedding provider API key"));
        }
        if self.model.trim().is_empty() {
            return Err(Error::config("missing embedding model name"));
        }
        Ok(())
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    dimensions: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
