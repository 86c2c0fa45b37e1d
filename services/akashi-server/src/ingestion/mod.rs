use crate::conflict::ConflictScorer;
use crate::notify;
use akashi_common::{AppError, Result};
use akashi_database::{bulk_insert_alternatives, bulk_insert_evidence};
use akashi_embeddings::{truncate_at_word_boundary, EmbeddingProvider};
use akashi_models::decision::{full_embedding_text, outcome_embedding_text, Decision, TraceInput};
use akashi_models::outbox::OutboxOperation;
use akashi_models::run::{Run, RunStatus};
use akashi_ranking::{quality_score, QualityInputs};
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Implements the `trace` write path end to end (§4.4): embeds, scores,
/// writes the run/decision/alternatives/evidence/outbox rows in one
/// transaction, publishes a post-commit notification, and dispatches
/// conflict scoring fire-and-forget.
pub struct TraceService {
    pool: PgPool,
    embeddings: Arc<dyn EmbeddingProvider>,
    char_budget: usize,
    conflict_scorer: Arc<ConflictScorer>,
}

impl TraceService {
    pub fn new(
        pool: PgPool,
        embeddings: Arc<dyn EmbeddingProvider>,
        char_budget: usize,
        conflict_scorer: Arc<ConflictScorer>,
    ) -> Self {
        Self { pool, embeddings, char_budget, conflict_scorer }
    }

    pub async fn trace(&self, org_id: Uuid, input: TraceInput) -> Result<Decision> {
        let run_id = self.resolve_run(org_id, &input).await?;

        let full_text = {
            let text = full_embedding_text(&input.decision_type, &input.outcome, input.reasoning.as_deref());
            truncate_at_word_boundary(&text, self.char_budget).to_string()
        };
        let outcome_text = {
            let text = outcome_embedding_text(&input.outcome);
            truncate_at_word_boundary(&text, self.char_budget).to_string()
        };

        let embeddings = match self.embeddings.embed_batch(&[full_text, outcome_text]).await {
            Ok(mut pair) if pair.len() == 2 => {
                let outcome_vec = pair.pop().unwrap();
                let full_vec = pair.pop().unwrap();
                Some((pgvector::Vector::from(full_vec), pgvector::Vector::from(outcome_vec)))
            }
            Ok(_) => None,
            Err(err) => {
                warn!(error = %err, "embedding request failed, storing decision without embedding");
                None
            }
        };

        let completeness_score = quality_score(&QualityInputs {
            reasoning: input.reasoning.as_deref(),
            alternatives: &input
                .alternatives
                .iter()
                .map(|a| (a.selected, a.rejection_reason.is_some()))
                .collect::<Vec<_>>(),
            evidence_has_relevance: &input.evidence.iter().map(|e| e.relevance_score.is_some()).collect::<Vec<_>>(),
        });

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        if let Some(prior_id) = input.supersedes {
            let result = sqlx::query("UPDATE decisions SET valid_to = $1 WHERE id = $2 AND org_id = $3 AND valid_to IS NULL")
                .bind(now)
                .bind(prior_id)
                .bind(org_id)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 0 {
                return Err(AppError::InvalidInput("supersedes must reference a currently-valid decision".to_string()));
            }
        }

        let decision_id = Uuid::new_v4();
        let decision = sqlx::query_as::<_, Decision>(
            r#"
            INSERT INTO decisions (
                id, org_id, run_id, agent_id, decision_type, outcome, confidence, reasoning,
                embedding_full, embedding_outcome, completeness_score, precedent_id, supersedes,
                session_id, agent_context, valid_from, valid_to, transaction_time,
                precedent_citation_count, conflict_wins, conflict_losses, agreement_count,
                supersession_velocity_hours, assessment_score
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, NULL, $16,
                0, 0, 0, 0, NULL, NULL
            )
            RETURNING *
            "#,
        )
        .bind(decision_id)
        .bind(org_id)
        .bind(run_id)
        .bind(input.agent_id)
        .bind(&input.decision_type)
        .bind(&input.outcome)
        .bind(input.confidence)
        .bind(&input.reasoning)
        .bind(embeddings.as_ref().map(|(f, _)| f.clone()))
        .bind(embeddings.as_ref().map(|(_, o)| o.clone()))
        .bind(completeness_score)
        .bind(input.precedent_id)
        .bind(input.supersedes)
        .bind(&input.session_id)
        .bind(input.agent_context.clone().unwrap_or_else(|| serde_json::json!({})))
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let alt_rows: Vec<(String, Option<f64>, bool, Option<String>)> = input
            .alternatives
            .iter()
            .map(|a| (a.label.clone(), a.score, a.selected, a.rejection_reason.clone()))
            .collect();
        bulk_insert_alternatives(&mut tx, decision_id, &alt_rows).await?;

        let evidence_rows: Vec<(String, Option<String>, String, Option<f64>, Option<pgvector::Vector>)> = input
            .evidence
            .iter()
            .map(|e| (e.source_type.clone(), e.source_uri.clone(), e.content.clone(), e.relevance_score, None))
            .collect();
        bulk_insert_evidence(&mut tx, decision_id, org_id, &evidence_rows).await?;

        if embeddings.is_some() {
            sqlx::query("INSERT INTO search_outbox (decision_id, org_id, operation) VALUES ($1, $2, $3)")
                .bind(decision_id)
                .bind(org_id)
                .bind(OutboxOperation::Upsert)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        info!(decision_id = %decision.id, run_id = %run_id, revision = input.supersedes.is_some(), "decision traced");

        notify::publish(
            &self.pool,
            "decisions",
            &serde_json::json!({
                "org_id": org_id,
                "decision_id": decision.id,
                "run_id": run_id,
                "agent_id": decision.agent_id,
                "decision_type": decision.decision_type,
                "event": if input.supersedes.is_some() { "revised" } else { "created" },
            }),
        )
        .await;

        if embeddings.is_some() {
            let scorer = self.conflict_scorer.clone();
            let decision_for_scoring = decision.clone();
            tokio::spawn(async move {
                scorer.score(&decision_for_scoring).await;
            });
        }

        Ok(decision)
    }

    /// Resolves the run a trace belongs to: reuses an existing run row when
    /// `run_id` is given, otherwise opens a new one on the caller's behalf
    /// (§4.2 — a trace call outside an explicit run still needs a run to
    /// hang its events and decisions off of).
    async fn resolve_run(&self, org_id: Uuid, input: &TraceInput) -> Result<Uuid> {
        if let Some(run_id) = input.run_id {
            let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM runs WHERE id = $1 AND org_id = $2")
                .bind(run_id)
                .bind(org_id)
                .fetch_optional(&self.pool)
                .await?;
            return exists.ok_or_else(|| AppError::NotFound(format!("run {run_id} not found")));
        }

        let run: Run = sqlx::query_as(
            r#"
            INSERT INTO runs (id, org_id, agent_id, parent_run_id, status, started_at, completed_at, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, NULL, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(org_id)
        .bind(input.agent_id)
        .bind(input.parent_run_id)
        .bind(RunStatus::Running)
        .bind(Utc::now())
        .bind(serde_json::json!({}))
        .fetch_one(&self.pool)
        .await?;

        Ok(run.id)
    }
}
