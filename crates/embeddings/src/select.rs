use crate::http::HttpEmbeddingProvider;
use crate::noop::NoopEmbeddingProvider;
use crate::provider::EmbeddingProvider;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Explicit choice: "local" | "remote" | "noop"; unset falls through to
    /// auto-detection.
    pub provider: Option<String>,
    pub local_url: Option<String>,
    pub remote_url: Option<String>,
    pub remote_api_key: Option<String>,
    pub dimensions: usize,
    pub char_budget: usize,
}

/// Resolves the embedding provider to use. Explicit configuration wins;
/// otherwise auto-detection order is local reachable ≺ remote-key
/// configured ≺ noop (§4.1).
pub async fn select_provider(cfg: &EmbeddingConfig) -> Arc<dyn EmbeddingProvider> {
    match cfg.provider.as_deref() {
        Some("noop") => return Arc::new(NoopEmbeddingProvider::new(cfg.dimensions)),
        Some("local") => {
            if let Some(provider) = build_http(cfg, cfg.local_url.clone(), None) {
                return Arc::new(provider);
            }
        }
        Some("remote") => {
            if let Some(provider) = build_http(cfg, cfg.remote_url.clone(), cfg.remote_api_key.clone()) {
                return Arc::new(provider);
            }
        }
        _ => {}
    }

    if cfg.provider.is_none() {
        if let Some(local) = build_http(cfg, cfg.local_url.clone(), None) {
            if local.reachable().await {
                tracing::info!("auto-detected local embedding provider");
                return Arc::new(local);
            }
        }

        if cfg.remote_api_key.is_some() {
            if let Some(remote) = build_http(cfg, cfg.remote_url.clone(), cfg.remote_api_key.clone()) {
                tracing::info!("auto-detected remote embedding provider");
                return Arc::new(remote);
            }
        }
    }

    tracing::warn!("no embedding provider reachable or configured, falling back to noop");
    Arc::new(NoopEmbeddingProvider::new(cfg.dimensions))
}

fn build_http(
    cfg: &EmbeddingConfig,
    base_url: Option<String>,
    api_key: Option<String>,
) -> Option<HttpEmbeddingProvider> {
    let base_url = base_url?;
    HttpEmbeddingProvider::new(base_url, api_key, cfg.dimensions, cfg.char_budget, Duration::from_secs(10)).ok()
}
