use akashi_models::decision::Decision;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{PgPool, QueryBuilder};
use std::collections::HashSet;
use uuid::Uuid;

/// Shared filter set for `/v1/query` and `/v1/query/temporal` (§4.11, §6).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryFilters {
    pub decision_type: Option<String>,
    pub agent_id: Option<Uuid>,
    pub session_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// Current-state structured lookup: `valid_to IS NULL` plus caller filters
/// and the access filter, newest first.
pub async fn structured_query(
    pool: &PgPool,
    org_id: Uuid,
    filters: &QueryFilters,
    allowed: &Option<HashSet<Uuid>>,
) -> Result<Vec<Decision>, sqlx::Error> {
    let mut qb = QueryBuilder::new("SELECT * FROM decisions WHERE org_id = ");
    qb.push_bind(org_id);
    qb.push(" AND valid_to IS NULL");

    push_common_filters(&mut qb, filters, allowed);

    qb.push(" ORDER BY valid_from DESC LIMIT ");
    qb.push_bind(filters.limit.clamp(1, 500));
    qb.push(" OFFSET ");
    qb.push_bind(filters.offset.max(0));

    qb.build_query_as::<Decision>().fetch_all(pool).await
}

/// Point-in-time lookup: the row that was current as of `as_of`, i.e. the
/// row whose `[valid_from, valid_to)` interval contains `as_of` (§4.11,
/// §8 scenario 5 — a revision never moves what an earlier point-in-time
/// query returns).
pub async fn temporal_query(
    pool: &PgPool,
    org_id: Uuid,
    as_of: DateTime<Utc>,
    filters: &QueryFilters,
    allowed: &Option<HashSet<Uuid>>,
) -> Result<Vec<Decision>, sqlx::Error> {
    let mut qb = QueryBuilder::new("SELECT * FROM decisions WHERE org_id = ");
    qb.push_bind(org_id);
    qb.push(" AND valid_from <= ");
    qb.push_bind(as_of);
    qb.push(" AND (valid_to IS NULL OR valid_to > ");
    qb.push_bind(as_of);
    qb.push(")");

    push_common_filters(&mut qb, filters, allowed);

    qb.push(" ORDER BY valid_from DESC LIMIT ");
    qb.push_bind(filters.limit.clamp(1, 500));
    qb.push(" OFFSET ");
    qb.push_bind(filters.offset.max(0));

    qb.build_query_as::<Decision>().fetch_all(pool).await
}

fn push_common_filters<'a>(
    qb: &mut QueryBuilder<'a, sqlx::Postgres>,
    filters: &'a QueryFilters,
    allowed: &'a Option<HashSet<Uuid>>,
) {
    if let Some(decision_type) = &filters.decision_type {
        qb.push(" AND decision_type = ");
        qb.push_bind(decision_type);
    }
    if let Some(agent_id) = filters.agent_id {
        qb.push(" AND agent_id = ");
        qb.push_bind(agent_id);
    }
    if let Some(session_id) = &filters.session_id {
        qb.push(" AND session_id = ");
        qb.push_bind(session_id);
    }
    if let Some(set) = allowed {
        let ids: Vec<Uuid> = set.iter().copied().collect();
        qb.push(" AND agent_id = ANY(");
        qb.push_bind(ids);
        qb.push(")");
    }
}
