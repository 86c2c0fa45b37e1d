use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A supporting datum for a decision. Exclusively owned by its decision.
/// `source_type` is a restricted identifier (e.g. "log", "doc", "metric",
/// "tool_output") validated at the handler boundary, not enforced here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Evidence {
    pub id: Uuid,
    pub decision_id: Uuid,
    pub org_id: Uuid,
    pub source_type: String,
    pub source_uri: Option<String>,
    pub content: String,
    pub relevance_score: Option<f64>,
    pub embedding: Option<pgvector::Vector>,
}

pub const ALLOWED_SOURCE_TYPES: &[&str] = &[
    "log",
    "doc",
    "metric",
    "tool_output",
    "human_feedback",
    "prior_decision",
    "external_api",
];

pub fn is_allowed_source_type(source_type: &str) -> bool {
    ALLOWED_SOURCE_TYPES.contains(&source_type)
}
