use crate::provider::{truncate_at_word_boundary, EmbeddingError, EmbeddingProvider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// HTTP-backed embedding provider shared by the local-service and
/// remote-API variants — both are a `reqwest::Client` wrapping a base URL,
/// an optional bearer token, and a request timeout (shaped after the
/// teacher's upstream-service adapter pattern).
pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    dimensions: usize,
    char_budget: usize,
}

impl HttpEmbeddingProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        dimensions: usize,
        char_budget: usize,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbeddingError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
            dimensions,
            char_budget,
        })
    }

    /// Probes `/health` with a short timeout; used by provider
    /// auto-detection, not by the trait itself.
    pub async fn reachable(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        let mut req = self.client.get(&url);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        matches!(req.send().await, Ok(resp) if resp.status().is_success())
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(std::slice::from_ref(&text.to_string())).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::Malformed("empty embeddings array".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let truncated: Vec<String> = texts
            .iter()
            .map(|t| truncate_at_word_boundary(t, self.char_budget).to_string())
            .collect();

        let url = format!("{}/v1/embeddings", self.base_url);
        let mut req = self.client.post(&url).json(&EmbedRequest { inputs: &truncated });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req
            .send()
            .await
            .map_err(|e| EmbeddingError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EmbeddingError::Request(format!(
                "embedding provider returned status {}",
                response.status()
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Malformed(e.to_string()))?;

        if parsed.embeddings.len() != truncated.len() {
            return Err(EmbeddingError::Malformed(
                "embedding count does not match input count".to_string(),
            ));
        }

        Ok(parsed.embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
