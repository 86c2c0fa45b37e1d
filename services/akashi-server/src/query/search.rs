use akashi_embeddings::EmbeddingProvider;
use akashi_models::decision::Decision;
use akashi_ranking::{rerank, Candidate, OutcomeSignals, Ranked};
use akashi_search::{SearchFilters, VectorIndex};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

/// Raw similarity assigned to fallback-path hits, which have no real
/// cosine distance to report. Keeps these candidates rankable by the same
/// outcome-weighted formula without implying false precision.
const FALLBACK_SIMILARITY: f64 = 0.5;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SemanticQuery {
    pub query: String,
    pub decision_type: Option<String>,
    pub agent_id: Option<Uuid>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

/// `/v1/search` (§4.11, §6). Embeds the query text, prefers the external
/// ANN index when healthy, and falls back to a substring scan over the
/// primary store otherwise — never fails outright because the index is
/// unreachable (§8 scenario 3).
pub async fn semantic_search(
    pool: &PgPool,
    embeddings: &dyn EmbeddingProvider,
    index: &dyn VectorIndex,
    org_id: Uuid,
    params: &SemanticQuery,
    allowed: &Option<HashSet<Uuid>>,
) -> Result<Vec<Ranked<Decision>>, sqlx::Error> {
    let embedding = embeddings.embed(&params.query).await.ok();

    let decisions = match embedding {
        Some(ref vector) if index.healthy().await.is_ok() => {
            let filters = SearchFilters {
                agent_id: params.agent_id,
                decision_type: params.decision_type.clone(),
                ..Default::default()
            };
            match index.search(org_id, vector, &filters, params.limit).await {
                Ok(hits) if !hits.is_empty() => {
                    let scores: std::collections::HashMap<Uuid, f64> =
                        hits.iter().map(|h| (h.id, h.score)).collect();
                    let ids: Vec<Uuid> = hits.iter().map(|h| h.id).collect();
                    let rows = fetch_by_ids(pool, org_id, &ids).await?;
                    rows.into_iter()
                        .map(|d| {
                            let score = *scores.get(&d.id).unwrap_or(&FALLBACK_SIMILARITY);
                            (d, score)
                        })
                        .collect()
                }
                _ => fallback_scan(pool, org_id, params).await?,
            }
        }
        _ => fallback_scan(pool, org_id, params).await?,
    };

    let candidates: Vec<Candidate<Decision>> = decisions
        .into_iter()
        .filter(|(d, _)| allowed.as_ref().map(|set| set.contains(&d.agent_id)).unwrap_or(true))
        .map(|(d, raw_similarity)| {
            let signals = OutcomeSignals {
                precedent_citation_count: d.precedent_citation_count.max(0) as u32,
                conflict_wins: d.conflict_wins.max(0) as u32,
                conflict_losses: d.conflict_losses.max(0) as u32,
                agreement_count: d.agreement_count.max(0) as u32,
                supersession_velocity_hours: d.supersession_velocity_hours,
                assessment_score: d.assessment_score,
                completeness_score: d.completeness_score,
                valid_from: d.valid_from,
            };
            Candidate { item: d, raw_similarity, signals }
        })
        .collect();

    Ok(rerank(candidates, Utc::now(), params.limit))
}

async fn fetch_by_ids(pool: &PgPool, org_id: Uuid, ids: &[Uuid]) -> Result<Vec<Decision>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, Decision>("SELECT * FROM decisions WHERE id = ANY($1) AND org_id = $2 AND valid_to IS NULL")
        .bind(ids)
        .bind(org_id)
        .fetch_all(pool)
        .await
}

/// Plain substring match over outcome/reasoning, used when the vector
/// index is unreachable or the embedding provider failed. Every hit gets
/// the same nominal similarity so ranking falls through entirely to the
/// outcome-weighted signals (§4.9, §4.11).
async fn fallback_scan(
    pool: &PgPool,
    org_id: Uuid,
    params: &SemanticQuery,
) -> Result<Vec<(Decision, f64)>, sqlx::Error> {
    let pattern = format!("%{}%", params.query.replace('%', "\\%").replace('_', "\\_"));

    let mut qb = sqlx::QueryBuilder::new(
        "SELECT * FROM decisions WHERE org_id = ",
    );
    qb.push_bind(org_id);
    qb.push(" AND valid_to IS NULL AND (outcome ILIKE ");
    qb.push_bind(pattern.clone());
    qb.push(" OR reasoning ILIKE ");
    qb.push_bind(pattern);
    qb.push(")");

    if let Some(decision_type) = &params.decision_type {
        qb.push(" AND decision_type = ");
        qb.push_bind(decision_type);
    }
    if let Some(agent_id) = params.agent_id {
        qb.push(" AND agent_id = ");
        qb.push_bind(agent_id);
    }

    qb.push(" ORDER BY valid_from DESC LIMIT ");
    qb.push_bind((params.limit * 3) as i64);

    let rows: Vec<Decision> = qb.build_query_as::<Decision>().fetch_all(pool).await?;
    Ok(rows.into_iter().map(|d| (d, FALLBACK_SIMILARITY)).collect())
}
