use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The central entity. Bi-temporal: `valid_from`/`valid_to` track business
/// time, `transaction_time` tracks system time. `valid_to IS NULL` means the
/// row is currently in force. Revising a decision closes the prior row and
/// inserts a new one whose `supersedes` points back at it (§3 invariant).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Decision {
    pub id: Uuid,
    pub org_id: Uuid,
    pub run_id: Uuid,
    pub agent_id: Uuid,
    pub decision_type: String,
    pub outcome: String,
    pub confidence: f64,
    pub reasoning: Option<String>,
    pub embedding_full: Option<pgvector::Vector>,
    pub embedding_outcome: Option<pgvector::Vector>,
    pub completeness_score: f64,
    pub precedent_id: Option<Uuid>,
    pub supersedes: Option<Uuid>,
    pub session_id: Option<String>,
    pub agent_context: serde_json::Value,

    // Bi-temporal columns.
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
    pub transaction_time: DateTime<Utc>,

    // Derived outcome signals consumed by the re-ranker (§4.9). Maintained
    // by the conflict scorer and by precedent/assessment bookkeeping outside
    // the scope of a single `trace` call; default to neutral on insert.
    pub precedent_citation_count: i32,
    pub conflict_wins: i32,
    pub conflict_losses: i32,
    pub agreement_count: i32,
    pub supersession_velocity_hours: Option<f64>,
    pub assessment_score: Option<f64>,
}

/// Text used to build the full-embedding: decision_type + outcome + reasoning.
pub fn full_embedding_text(decision_type: &str, outcome: &str, reasoning: Option<&str>) -> String {
    match reasoning {
        Some(r) if !r.is_empty() => format!("{decision_type}\n{outcome}\n{r}"),
        _ => format!("{decision_type}\n{outcome}"),
    }
}

/// Text used to build the outcome-only embedding.
pub fn outcome_embedding_text(outcome: &str) -> String {
    outcome.to_string()
}

/// Input payload for `trace` (§4.4 step 1-3).
#[derive(Debug, Clone, Deserialize)]
pub struct TraceInput {
    pub run_id: Option<Uuid>,
    pub parent_run_id: Option<Uuid>,
    pub agent_id: Uuid,
    pub decision_type: String,
    pub outcome: String,
    pub confidence: f64,
    pub reasoning: Option<String>,
    pub session_id: Option<String>,
    pub agent_context: Option<serde_json::Value>,
    pub supersedes: Option<Uuid>,
    pub precedent_id: Option<Uuid>,
    pub alternatives: Vec<AlternativeInput>,
    pub evidence: Vec<EvidenceInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlternativeInput {
    pub label: String,
    pub score: Option<f64>,
    pub selected: bool,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvidenceInput {
    pub source_type: String,
    pub source_uri: Option<String>,
    pub content: String,
    pub relevance_score: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_embedding_text_includes_reasoning_when_present() {
        let text = full_embedding_text("security", "enable TLS", Some("reduces MITM risk"));
        assert_eq!(text, "security\nenable TLS\nreduces MITM risk");
    }

    #[test]
    fn full_embedding_text_omits_empty_reasoning() {
        let text = full_embedding_text("security", "enable TLS", Some(""));
        assert_eq!(text, "security\nenable TLS");
    }

    #[test]
    fn full_embedding_text_omits_absent_reasoning() {
        let text = full_embedding_text("security", "enable TLS", None);
        assert_eq!(text, "security\nenable TLS");
    }
}
