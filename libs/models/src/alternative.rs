use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An option considered for a decision. Exclusively owned by its decision.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Alternative {
    pub id: Uuid,
    pub decision_id: Uuid,
    pub label: String,
    pub score: Option<f64>,
    pub selected: bool,
    pub rejection_reason: Option<String>,
}
