use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A detected pair of contradictory decisions (§4.8).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScoredConflict {
    pub id: Uuid,
    pub org_id: Uuid,
    pub decision_a_id: Uuid,
    pub decision_b_id: Uuid,
    pub agent_a_id: Uuid,
    pub agent_b_id: Uuid,
    pub decision_type: Option<String>,
    pub topic_similarity: f64,
    pub outcome_divergence: f64,
    pub significance: f64,
    pub conflict_kind: ConflictKind,
    pub status: ConflictStatus,
    pub detected_at: DateTime<Utc>,
    pub severity: Option<String>,
    pub category: Option<String>,
    pub explanation: Option<String>,
    pub resolution_metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    CrossAgent,
    SelfContradiction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConflictStatus {
    Open,
    Acknowledged,
    Resolved,
    WontFix,
}

/// Patch body for `PATCH /v1/conflicts/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConflictPatch {
    pub status: Option<ConflictStatus>,
    pub resolution_metadata: Option<serde_json::Value>,
}
