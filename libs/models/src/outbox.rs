use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Mirrors a decision; consumed-then-destroyed by the outbox worker.
/// `(decision_id, operation)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SearchOutboxEntry {
    pub id: i64,
    pub decision_id: Uuid,
    pub org_id: Uuid,
    pub operation: OutboxOperation,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OutboxOperation {
    Upsert,
    Delete,
}

/// Archival mirror of `SearchOutboxEntry`, populated by the hourly
/// dead-letter sweep (§4.6 step 7).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeadLetterOutboxEntry {
    pub id: i64,
    pub decision_id: Uuid,
    pub org_id: Uuid,
    pub operation: OutboxOperation,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub archived_at: DateTime<Utc>,
}
