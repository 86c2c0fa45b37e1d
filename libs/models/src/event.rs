use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Append-only event log row, partitioned by `occurred_at`. No referential
/// integrity to runs is enforced at the database level — partitioning makes
/// an FK to a non-partitioned `runs` table impractical, so the relationship
/// is application-enforced only.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AgentEvent {
    pub id: Uuid,
    pub org_id: Uuid,
    pub run_id: Uuid,
    pub agent_id: Uuid,
    pub event_type: String,
    pub sequence_num: i64,
    pub occurred_at: DateTime<Utc>,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied event, prior to sequence number allocation.
#[derive(Debug, Clone, Deserialize)]
pub struct EventInput {
    pub event_type: String,
    pub occurred_at: Option<DateTime<Utc>>,
    pub payload: serde_json::Value,
}
