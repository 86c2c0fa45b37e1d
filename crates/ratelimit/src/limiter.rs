use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("rate limiter unavailable: {0}")]
    Unavailable(String),
}

/// The process-local enforcement primitive. Errors from an implementation
/// are fail-open at the call site — a caller that gets `Err` must permit
/// the request rather than block it (§4.12, §7).
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn allow(&self, key: &str) -> Result<bool, RateLimitError>;
}
