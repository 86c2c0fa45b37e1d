pub mod client;
pub mod error;
pub mod trait_def;
pub mod types;

pub use client::{VectorIndexClient, VectorIndexConfig};
pub use error::VectorIndexError;
pub use trait_def::VectorIndex;
pub use types::{Point, PointPayload, SearchFilters, SearchHit};

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(base_url: String) -> VectorIndexConfig {
        VectorIndexConfig { base_url, api_key: None, timeout_ms: 2000, dimensions: 1536 }
    }

    #[tokio::test]
    async fn healthy_reports_unreachable_when_nothing_listens() {
        // Port 1 is reserved and will refuse the connection immediately.
        let client = VectorIndexClient::new(config("http://127.0.0.1:1".to_string())).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(2), client.healthy()).await.unwrap();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn upsert_of_empty_points_is_a_noop() {
        let client = VectorIndexClient::new(config("http://127.0.0.1:1".to_string())).unwrap();
        assert!(client.upsert(&[]).await.is_ok());
    }

    #[tokio::test]
    async fn delete_by_ids_of_empty_is_a_noop() {
        let client = VectorIndexClient::new(config("http://127.0.0.1:1".to_string())).unwrap();
        assert!(client.delete_by_ids(&[]).await.is_ok());
    }
}
