use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fields indexed alongside a vector so the adapter can apply structured
/// filters without round-tripping to the primary store (§4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointPayload {
    pub org_id: Uuid,
    pub agent_id: Uuid,
    pub decision_type: String,
    pub session_id: Option<String>,
    pub tool: Option<String>,
    pub model: Option<String>,
    pub project: Option<String>,
    pub confidence: f64,
    pub completeness_score: f64,
    pub valid_from_unix: i64,
}

/// A single vector + payload to be upserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    pub id: Uuid,
    pub embedding: Vec<f32>,
    pub payload: PointPayload,
}

/// Structured filters applied server-side, in addition to the mandatory
/// org_id tenant filter every query carries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    pub agent_id: Option<Uuid>,
    pub decision_type: Option<String>,
    pub session_id: Option<String>,
    pub tool: Option<String>,
    pub model: Option<String>,
    pub project: Option<String>,
    pub min_confidence: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: Uuid,
    pub score: f64,
}
