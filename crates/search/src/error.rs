use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorIndexError {
    #[error("vector index unreachable: {0}")]
    Unreachable(String),
    #[error("vector index returned status {0}")]
    BadStatus(u16),
    #[error("vector index response decode failed: {0}")]
    Decode(String),
}
