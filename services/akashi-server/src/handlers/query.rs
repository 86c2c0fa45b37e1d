use crate::handlers::auth::{load_caller, parse_claims};
use crate::query::{can_see_pair, compute_allowed_set, semantic_search, structured_query, temporal_query, QueryFilters, SemanticQuery};
use crate::state::AppState;
use akashi_common::utils::request_id;
use akashi_common::{AppError, ApiResponse, Result};
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// `POST /v1/query` (§4.11, §6).
pub async fn query(state: web::Data<AppState>, req: HttpRequest, body: web::Json<QueryFilters>) -> Result<HttpResponse> {
    let claims = parse_claims(&req)?;
    let caller = load_caller(&state, &claims).await?;
    let allowed = compute_allowed_set(&state.pool, &caller).await?;

    let decisions = structured_query(&state.pool, claims.org_id, &body, &allowed).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(request_id(&req), decisions)))
}

#[derive(Debug, Deserialize)]
pub struct TemporalQueryRequest {
    pub as_of: DateTime<Utc>,
    #[serde(flatten)]
    pub filters: QueryFilters,
}

/// `POST /v1/query/temporal` (§4.11, §6, §8 scenario 5).
pub async fn temporal(state: web::Data<AppState>, req: HttpRequest, body: web::Json<TemporalQueryRequest>) -> Result<HttpResponse> {
    let claims = parse_claims(&req)?;
    let caller = load_caller(&state, &claims).await?;
    let allowed = compute_allowed_set(&state.pool, &caller).await?;

    let decisions = temporal_query(&state.pool, claims.org_id, body.as_of, &body.filters, &allowed).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(request_id(&req), decisions)))
}

/// `POST /v1/search` (§4.9, §4.11, §6).
pub async fn search(state: web::Data<AppState>, req: HttpRequest, body: web::Json<SemanticQuery>) -> Result<HttpResponse> {
    let claims = parse_claims(&req)?;
    let caller = load_caller(&state, &claims).await?;
    let allowed = compute_allowed_set(&state.pool, &caller).await?;

    let ranked = semantic_search(
        &state.pool,
        state.embeddings.as_ref(),
        state.vector_index.as_ref(),
        claims.org_id,
        &body,
        &allowed,
    )
    .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(request_id(&req), ranked)))
}

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub decision_type: String,
    pub query: String,
    #[serde(default = "default_check_limit")]
    pub limit: usize,
}

fn default_check_limit() -> usize {
    5
}

/// `POST /v1/check` (§4.9, §6): precedent lookup before acting — same
/// semantic search, scoped to a single `decision_type`.
pub async fn check(state: web::Data<AppState>, req: HttpRequest, body: web::Json<CheckRequest>) -> Result<HttpResponse> {
    let claims = parse_claims(&req)?;
    let caller = load_caller(&state, &claims).await?;
    let allowed = compute_allowed_set(&state.pool, &caller).await?;

    let params = SemanticQuery {
        query: body.query.clone(),
        decision_type: Some(body.decision_type.clone()),
        agent_id: None,
        limit: body.limit,
    };

    let ranked = semantic_search(
        &state.pool,
        state.embeddings.as_ref(),
        state.vector_index.as_ref(),
        claims.org_id,
        &params,
        &allowed,
    )
    .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(request_id(&req), ranked)))
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_recent_limit")]
    pub limit: i64,
}

fn default_recent_limit() -> i64 {
    50
}

/// `GET /v1/decisions/recent` (§6).
pub async fn recent(state: web::Data<AppState>, req: HttpRequest, query: web::Query<RecentQuery>) -> Result<HttpResponse> {
    let claims = parse_claims(&req)?;
    let caller = load_caller(&state, &claims).await?;
    let allowed = compute_allowed_set(&state.pool, &caller).await?;

    let filters = QueryFilters { limit: query.limit, ..Default::default() };
    let decisions = structured_query(&state.pool, claims.org_id, &filters, &allowed).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(request_id(&req), decisions)))
}

#[derive(Debug, Deserialize)]
pub struct ConflictsQuery {
    pub status: Option<String>,
}

/// `GET /v1/conflicts` (§4.8, §4.11, §6): only pairs where the caller can
/// see both sides are returned.
pub async fn list_conflicts(state: web::Data<AppState>, req: HttpRequest, query: web::Query<ConflictsQuery>) -> Result<HttpResponse> {
    let claims = parse_claims(&req)?;
    let caller = load_caller(&state, &claims).await?;
    let allowed = compute_allowed_set(&state.pool, &caller).await?;

    let rows: Vec<akashi_models::conflict::ScoredConflict> = match &query.status {
        Some(status) => {
            sqlx::query_as("SELECT * FROM scored_conflicts WHERE org_id = $1 AND status = $2 ORDER BY detected_at DESC LIMIT 200")
                .bind(claims.org_id)
                .bind(status)
                .fetch_all(&state.pool)
                .await?
        }
        None => {
            sqlx::query_as("SELECT * FROM scored_conflicts WHERE org_id = $1 ORDER BY detected_at DESC LIMIT 200")
                .bind(claims.org_id)
                .fetch_all(&state.pool)
                .await?
        }
    };

    let visible: Vec<_> = rows
        .into_iter()
        .filter(|c| can_see_pair(&allowed, c.agent_a_id, c.agent_b_id))
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(request_id(&req), visible)))
}

/// `PATCH /v1/conflicts/{id}` (§4.8, §6): caller must see both sides of the
/// pair being patched, same as the list endpoint.
pub async fn patch_conflict(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<uuid::Uuid>,
    body: web::Json<akashi_models::conflict::ConflictPatch>,
) -> Result<HttpResponse> {
    let claims = parse_claims(&req)?;
    let caller = load_caller(&state, &claims).await?;
    let allowed = compute_allowed_set(&state.pool, &caller).await?;
    let conflict_id = path.into_inner();

    let existing: akashi_models::conflict::ScoredConflict =
        sqlx::query_as("SELECT * FROM scored_conflicts WHERE id = $1 AND org_id = $2")
            .bind(conflict_id)
            .bind(claims.org_id)
            .fetch_optional(&state.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("conflict {conflict_id} not found")))?;

    if !can_see_pair(&allowed, existing.agent_a_id, existing.agent_b_id) {
        return Err(AppError::Forbidden);
    }

    let updated: akashi_models::conflict::ScoredConflict = sqlx::query_as(
        r#"
        UPDATE scored_conflicts
        SET status = COALESCE($1, status), resolution_metadata = COALESCE($2, resolution_metadata)
        WHERE id = $3 AND org_id = $4
        RETURNING *
        "#,
    )
    .bind(body.status)
    .bind(&body.resolution_metadata)
    .bind(conflict_id)
    .bind(claims.org_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(request_id(&req), updated)))
}
