use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Backs at-least-once-safe client retries on `POST /v1/trace` (§9 Design
/// Notes). The first write of a key stores the response body hash and a
/// snapshot of the response; a replay with a mismatched request body is
/// rejected with `Conflict`, a replay with a matching body returns the
/// stored response unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IdempotencyKeyRecord {
    pub id: Uuid,
    pub org_id: Uuid,
    pub key: String,
    pub request_body_hash: String,
    pub response_snapshot: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
