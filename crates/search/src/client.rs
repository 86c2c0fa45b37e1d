use crate::error::VectorIndexError;
use crate::trait_def::VectorIndex;
use crate::types::{Point, SearchFilters, SearchHit};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

const HNSW_M: u32 = 16;
const HNSW_EF_CONSTRUCT: u32 = 128;
const HEALTH_CACHE_TTL: Duration = Duration::from_secs(5);
const OVER_FETCH_FACTOR: usize = 3;

#[derive(Debug, Clone)]
pub struct VectorIndexConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub dimensions: u32,
}

struct HealthCache {
    checked_at: Option<Instant>,
    result: Option<Result<(), String>>,
}

/// HTTP client to the external ANN service, shaped like a thin ecosystem
/// consumer adapter: base URL + optional API key, JSON request/response,
/// a `health_check`-style method. Every query carries the org_id tenant
/// filter; `healthy` caches its result for 5s and serializes concurrent
/// callers through the same mutex so only one probe is ever in flight.
pub struct VectorIndexClient {
    config: VectorIndexConfig,
    client: reqwest::Client,
    health: Mutex<HealthCache>,
}

impl VectorIndexClient {
    pub fn new(config: VectorIndexConfig) -> Result<Self, VectorIndexError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| VectorIndexError::Unreachable(e.to_string()))?;

        Ok(Self {
            config,
            client,
            health: Mutex::new(HealthCache { checked_at: None, result: None }),
        })
    }

    pub async fn ensure_collection(&self) -> Result<(), VectorIndexError> {
        #[derive(Serialize)]
        struct Body {
            dimensions: u32,
            distance: &'static str,
            hnsw_m: u32,
            hnsw_ef_construct: u32,
            keyword_indexes: &'static [&'static str],
            float_indexes: &'static [&'static str],
        }

        let body = Body {
            dimensions: self.config.dimensions,
            distance: "cosine",
            hnsw_m: HNSW_M,
            hnsw_ef_construct: HNSW_EF_CONSTRUCT,
            keyword_indexes: &["org_id", "agent_id", "decision_type", "session_id", "tool", "model", "project"],
            float_indexes: &["confidence", "completeness_score", "valid_from_unix"],
        };

        let url = format!("{}/collections/decisions/ensure", self.config.base_url);
        self.post_json::<_, serde_json::Value>(&url, &body).await?;
        Ok(())
    }

    pub async fn upsert(&self, points: &[Point]) -> Result<(), VectorIndexError> {
        if points.is_empty() {
            return Ok(());
        }
        #[derive(Serialize)]
        struct Body<'a> {
            points: &'a [Point],
        }
        let url = format!("{}/collections/decisions/upsert", self.config.base_url);
        self.post_json::<_, serde_json::Value>(&url, &Body { points }).await?;
        Ok(())
    }

    pub async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<(), VectorIndexError> {
        if ids.is_empty() {
            return Ok(());
        }
        #[derive(Serialize)]
        struct Body<'a> {
            ids: &'a [Uuid],
        }
        let url = format!("{}/collections/decisions/delete", self.config.base_url);
        self.post_json::<_, serde_json::Value>(&url, &Body { ids }).await?;
        Ok(())
    }

    pub async fn delete_by_org(&self, org_id: Uuid) -> Result<(), VectorIndexError> {
        #[derive(Serialize)]
        struct Body {
            org_id: Uuid,
        }
        let url = format!("{}/collections/decisions/delete_by_org", self.config.base_url);
        self.post_json::<_, serde_json::Value>(&url, &Body { org_id }).await?;
        Ok(())
    }

    pub async fn search(
        &self,
        org_id: Uuid,
        embedding: &[f32],
        filters: &SearchFilters,
        limit: usize,
    ) -> Result<Vec<SearchHit>, VectorIndexError> {
        #[derive(Serialize)]
        struct Body<'a> {
            org_id: Uuid,
            embedding: &'a [f32],
            filters: &'a SearchFilters,
            limit: usize,
        }
        #[derive(Deserialize)]
        struct Resp {
            hits: Vec<SearchHit>,
        }

        let url = format!("{}/collections/decisions/search", self.config.base_url);
        let body = Body { org_id, embedding, filters, limit: limit * OVER_FETCH_FACTOR };
        let resp: Resp = self.post_json(&url, &body).await?;
        Ok(resp.hits.into_iter().take(limit).collect())
    }

    pub async fn find_similar(
        &self,
        org_id: Uuid,
        embedding: &[f32],
        exclude_id: Uuid,
        project: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SearchHit>, VectorIndexError> {
        #[derive(Serialize)]
        struct Body<'a> {
            org_id: Uuid,
            embedding: &'a [f32],
            exclude_id: Uuid,
            project: Option<&'a str>,
            limit: usize,
        }
        #[derive(Deserialize)]
        struct Resp {
            hits: Vec<SearchHit>,
        }

        let url = format!("{}/collections/decisions/find_similar", self.config.base_url);
        let body = Body { org_id, embedding, exclude_id, project, limit };
        let resp: Resp = self.post_json(&url, &body).await?;
        Ok(resp.hits)
    }

    /// 5s-cached, singleflight health probe: concurrent callers block on the
    /// same mutex, so only the first past a stale cache issues a request.
    pub async fn healthy(&self) -> Result<(), VectorIndexError> {
        let mut cache = self.health.lock().await;

        if let (Some(checked_at), Some(result)) = (cache.checked_at, &cache.result) {
            if checked_at.elapsed() < HEALTH_CACHE_TTL {
                return result.clone().map_err(VectorIndexError::Unreachable);
            }
        }

        let url = format!("{}/health", self.config.base_url);
        let outcome = match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => Ok(()),
            Ok(resp) => Err(format!("status {}", resp.status())),
            Err(e) => Err(e.to_string()),
        };

        cache.checked_at = Some(Instant::now());
        cache.result = Some(outcome.clone());
        outcome.map_err(VectorIndexError::Unreachable)
    }

    async fn post_json<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<R, VectorIndexError> {
        let mut req = self.client.post(url).json(body);
        if let Some(ref key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let resp = req.send().await.map_err(|e| VectorIndexError::Unreachable(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            warn!(status, url, "vector index request failed");
            return Err(VectorIndexError::BadStatus(status));
        }

        resp.json().await.map_err(|e| VectorIndexError::Decode(e.to_string()))
    }
}

#[async_trait]
impl VectorIndex for VectorIndexClient {
    async fn ensure_collection(&self) -> Result<(), VectorIndexError> {
        VectorIndexClient::ensure_collection(self).await
    }

    async fn upsert(&self, points: &[Point]) -> Result<(), VectorIndexError> {
        VectorIndexClient::upsert(self, points).await
    }

    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<(), VectorIndexError> {
        VectorIndexClient::delete_by_ids(self, ids).await
    }

    async fn delete_by_org(&self, org_id: Uuid) -> Result<(), VectorIndexError> {
        VectorIndexClient::delete_by_org(self, org_id).await
    }

    async fn search(
        &self,
        org_id: Uuid,
        embedding: &[f32],
        filters: &SearchFilters,
        limit: usize,
    ) -> Result<Vec<SearchHit>, VectorIndexError> {
        VectorIndexClient::search(self, org_id, embedding, filters, limit).await
    }

    async fn find_similar(
        &self,
        org_id: Uuid,
        embedding: &[f32],
        exclude_id: Uuid,
        project: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SearchHit>, VectorIndexError> {
        VectorIndexClient::find_similar(self, org_id, embedding, exclude_id, project, limit).await
    }

    async fn healthy(&self) -> Result<(), VectorIndexError> {
        VectorIndexClient::healthy(self).await
    }
}
