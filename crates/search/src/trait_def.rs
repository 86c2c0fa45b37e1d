use crate::error::VectorIndexError;
use crate::types::{Point, SearchFilters, SearchHit};
use async_trait::async_trait;
use uuid::Uuid;

/// Abstraction over the external vector index, so the server can swap in a
/// mock for handler tests without a live ANN service (§4.7).
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn ensure_collection(&self) -> Result<(), VectorIndexError>;
    async fn upsert(&self, points: &[Point]) -> Result<(), VectorIndexError>;
    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<(), VectorIndexError>;
    async fn delete_by_org(&self, org_id: Uuid) -> Result<(), VectorIndexError>;
    async fn search(
        &self,
        org_id: Uuid,
        embedding: &[f32],
        filters: &SearchFilters,
        limit: usize,
    ) -> Result<Vec<SearchHit>, VectorIndexError>;
    async fn find_similar(
        &self,
        org_id: Uuid,
        embedding: &[f32],
        exclude_id: Uuid,
        project: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SearchHit>, VectorIndexError>;
    async fn healthy(&self) -> Result<(), VectorIndexError>;
}
