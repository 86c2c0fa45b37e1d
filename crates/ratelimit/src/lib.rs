pub mod limiter;
pub mod token_bucket;

pub use limiter::{RateLimitError, RateLimiter};
pub use token_bucket::TokenBucketLimiter;
