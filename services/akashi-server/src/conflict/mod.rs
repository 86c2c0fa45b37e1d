use crate::notify;
use akashi_models::conflict::{ConflictKind, ScoredConflict};
use akashi_models::decision::Decision;
use akashi_search::VectorIndex;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

const TOP_K: i64 = 50;

/// Post-commit semantic conflict detector (§4.8). Invoked fire-and-forget
/// after a successful `trace`; errors are logged, never propagated, since
/// this never blocks the ingestion response.
pub struct ConflictScorer {
    pool: PgPool,
    index: Arc<dyn VectorIndex>,
    significance_threshold: f64,
}

impl ConflictScorer {
    pub fn new(pool: PgPool, index: Arc<dyn VectorIndex>, significance_threshold: f64) -> Self {
        Self { pool, index, significance_threshold }
    }

    pub async fn score(&self, decision: &Decision) {
        if let Err(err) = self.try_score(decision).await {
            error!(error = %err, decision_id = %decision.id, "conflict scoring failed");
        }
    }

    async fn try_score(&self, decision: &Decision) -> Result<(), sqlx::Error> {
        let (full, outcome) = match (&decision.embedding_full, &decision.embedding_outcome) {
            (Some(f), Some(o)) => (f.to_vec(), o.to_vec()),
            _ => return Ok(()),
        };

        let candidates = self.find_candidates(decision, &full).await?;

        for candidate in candidates {
            let candidate_outcome = match &candidate.embedding_outcome {
                Some(v) => v.to_vec(),
                None => continue,
            };
            let candidate_full = match &candidate.embedding_full {
                Some(v) => v.to_vec(),
                None => continue,
            };

            let topic_similarity = cosine_similarity(&full, &candidate_full);
            let outcome_divergence = 1.0 - cosine_similarity(&outcome, &candidate_outcome);
            let significance = topic_similarity * outcome_divergence;

            if significance < self.significance_threshold {
                continue;
            }

            let kind = if candidate.agent_id == decision.agent_id {
                ConflictKind::SelfContradiction
            } else {
                ConflictKind::CrossAgent
            };

            let conflict = self.insert_conflict(decision, &candidate, topic_similarity, outcome_divergence, significance, kind).await?;
            info!(decision_a = %decision.id, decision_b = %candidate.id, significance, "recorded scored conflict");

            notify::publish(
                &self.pool,
                "conflicts",
                &serde_json::json!({
                    "org_id": conflict.org_id,
                    "conflict_id": conflict.id,
                    "decision_a_id": conflict.decision_a_id,
                    "decision_b_id": conflict.decision_b_id,
                    "significance": conflict.significance,
                }),
            )
            .await;
        }

        Ok(())
    }

    /// Prefers the external vector index's internal ANN when healthy;
    /// falls back to a direct kNN over the primary store's vector column.
    async fn find_candidates(&self, decision: &Decision, full: &[f32]) -> Result<Vec<Decision>, sqlx::Error> {
        if self.index.healthy().await.is_ok() {
            if let Ok(hits) = self.index.find_similar(decision.org_id, full, decision.id, None, TOP_K as usize).await {
                let ids: Vec<Uuid> = hits.into_iter().map(|h| h.id).collect();
                if !ids.is_empty() {
                    return sqlx::query_as::<_, Decision>(
                        "SELECT * FROM decisions WHERE id = ANY($1) AND org_id = $2 AND valid_to IS NULL",
                    )
                    .bind(&ids)
                    .bind(decision.org_id)
                    .fetch_all(&self.pool)
                    .await;
                }
                return Ok(Vec::new());
            }
        }

        sqlx::query_as::<_, Decision>(
            r#"
            SELECT * FROM decisions
            WHERE org_id = $1 AND valid_to IS NULL AND id != $2 AND embedding_full IS NOT NULL
            ORDER BY embedding_full <=> $3
            LIMIT $4
            "#,
        )
        .bind(decision.org_id)
        .bind(decision.id)
        .bind(decision.embedding_full.clone())
        .bind(TOP_K)
        .fetch_all(&self.pool)
        .await
    }

    async fn insert_conflict(
        &self,
        a: &Decision,
        b: &Decision,
        topic_similarity: f64,
        outcome_divergence: f64,
        significance: f64,
        kind: ConflictKind,
    ) -> Result<ScoredConflict, sqlx::Error> {
        sqlx::query_as::<_, ScoredConflict>(
            r#"
            INSERT INTO scored_conflicts
                (id, org_id, decision_a_id, decision_b_id, agent_a_id, agent_b_id, decision_type,
                 topic_similarity, outcome_divergence, significance, conflict_kind, status, detected_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'open', $12)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(a.org_id)
        .bind(a.id)
        .bind(b.id)
        .bind(a.agent_id)
        .bind(b.agent_id)
        .bind(&a.decision_type)
        .bind(topic_similarity)
        .bind(outcome_divergence)
        .bind(significance)
        .bind(kind)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_are_maximally_similar() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn opposite_vectors_are_maximally_dissimilar() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_vector_yields_zero_similarity() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 1.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }
}
