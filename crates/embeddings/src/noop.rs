use crate::provider::{EmbeddingError, EmbeddingProvider};
use async_trait::async_trait;

/// Returns zero vectors without performing any I/O. Selected when no
/// provider is reachable or configured; semantic search and conflict
/// scoring are effectively disabled (every decision's embedding is present
/// but uninformative, so similarity scores collapse to a constant).
pub struct NoopEmbeddingProvider {
    dimensions: usize,
}

impl NoopEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for NoopEmbeddingProvider {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(vec![0.0; self.dimensions])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|_| vec![0.0; self.dimensions]).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
