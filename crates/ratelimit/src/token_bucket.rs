use crate::limiter::{RateLimitError, RateLimiter};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

const DEFAULT_EVICT_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

struct Bucket {
    tokens: f64,
    last_access: Instant,
}

struct Inner {
    buckets: Mutex<HashMap<String, Bucket>>,
    rate: f64,
    burst: f64,
    idle_timeout: Duration,
}

/// Per-key token bucket: one mutex-guarded map, refilled lazily on access
/// rather than by a ticking background task — only the eviction sweep runs
/// on its own loop. A new key starts with a full bucket minus the token
/// consumed for the request that created it.
pub struct TokenBucketLimiter {
    inner: Arc<Inner>,
    shutdown: Arc<Notify>,
    closed: Arc<AtomicBool>,
    evictor: Mutex<Option<JoinHandle<()>>>,
}

impl TokenBucketLimiter {
    /// `rate` is tokens/second refill, `burst` is bucket capacity.
    pub fn new(rate: f64, burst: f64) -> Self {
        Self::with_idle_timeout(rate, burst, DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(rate: f64, burst: f64, idle_timeout: Duration) -> Self {
        let inner = Arc::new(Inner {
            buckets: Mutex::new(HashMap::new()),
            rate,
            burst,
            idle_timeout,
        });
        let shutdown = Arc::new(Notify::new());
        let closed = Arc::new(AtomicBool::new(false));

        let evictor_inner = inner.clone();
        let evictor_shutdown = shutdown.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(DEFAULT_EVICT_INTERVAL);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let now = Instant::now();
                        let mut buckets = evictor_inner.buckets.lock();
                        buckets.retain(|_, bucket| now.duration_since(bucket.last_access) < evictor_inner.idle_timeout);
                    }
                    _ = evictor_shutdown.notified() => break,
                }
            }
        });

        Self {
            inner,
            shutdown,
            closed,
            evictor: Mutex::new(Some(handle)),
        }
    }

    /// Stops the eviction loop. Idempotent: a second call is a no-op.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shutdown.notify_one();
        if let Some(handle) = self.evictor.lock().take() {
            let _ = handle.await;
        }
    }

    /// Number of keys currently tracked; exposed for tests and metrics.
    pub fn tracked_keys(&self) -> usize {
        self.inner.buckets.lock().len()
    }
}

#[async_trait]
impl RateLimiter for TokenBucketLimiter {
    async fn allow(&self, key: &str) -> Result<bool, RateLimitError> {
        let now = Instant::now();
        let mut buckets = self.inner.buckets.lock();
        let bucket = buckets.entry(key.to_string()).or_insert_with(|| Bucket {
            tokens: self.inner.burst,
            last_access: now,
        });

        let elapsed = now.duration_since(bucket.last_access).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.inner.rate).min(self.inner.burst);
        bucket.last_access = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_request_on_a_new_key_consumes_one_token() {
        let limiter = TokenBucketLimiter::new(1.0, 5.0);
        assert!(limiter.allow("k").await.unwrap());
        assert_eq!(limiter.tracked_keys(), 1);
        limiter.close().await;
    }

    #[tokio::test]
    async fn burst_is_respected_then_exhausted() {
        let limiter = TokenBucketLimiter::new(0.0, 3.0);
        assert!(limiter.allow("k").await.unwrap());
        assert!(limiter.allow("k").await.unwrap());
        assert!(limiter.allow("k").await.unwrap());
        assert!(!limiter.allow("k").await.unwrap());
        limiter.close().await;
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = TokenBucketLimiter::new(0.0, 1.0);
        assert!(limiter.allow("a").await.unwrap());
        assert!(limiter.allow("b").await.unwrap());
        assert!(!limiter.allow("a").await.unwrap());
        limiter.close().await;
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let limiter = TokenBucketLimiter::new(1.0, 1.0);
        limiter.close().await;
        limiter.close().await;
    }

    #[tokio::test]
    async fn refill_restores_tokens_over_time() {
        let limiter = TokenBucketLimiter::with_idle_timeout(1000.0, 1.0, Duration::from_secs(600));
        assert!(limiter.allow("k").await.unwrap());
        assert!(!limiter.allow("k").await.unwrap());
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(limiter.allow("k").await.unwrap());
        limiter.close().await;
    }
}
