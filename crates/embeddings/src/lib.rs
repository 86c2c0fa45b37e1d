pub mod http;
pub mod noop;
pub mod provider;
pub mod select;

pub use http::HttpEmbeddingProvider;
pub use noop::NoopEmbeddingProvider;
pub use provider::{truncate_at_word_boundary, EmbeddingError, EmbeddingProvider};
pub use select::{select_provider, EmbeddingConfig};
