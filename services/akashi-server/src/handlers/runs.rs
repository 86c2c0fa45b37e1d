use crate::handlers::auth::parse_claims;
use crate::state::AppState;
use akashi_common::utils::request_id;
use akashi_common::{AppError, ApiResponse, Result};
use akashi_models::event::EventInput;
use akashi_models::run::{Run, RunStatus};
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateRunRequest {
    pub agent_id: Uuid,
    pub parent_run_id: Option<Uuid>,
    pub metadata: Option<serde_json::Value>,
}

/// `POST /v1/runs` (§4.2, §6).
pub async fn create_run(state: web::Data<AppState>, req: HttpRequest, body: web::Json<CreateRunRequest>) -> Result<HttpResponse> {
    let claims = parse_claims(&req)?;

    let run: Run = sqlx::query_as(
        r#"
        INSERT INTO runs (id, org_id, agent_id, parent_run_id, status, started_at, completed_at, metadata)
        VALUES ($1, $2, $3, $4, $5, $6, NULL, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(claims.org_id)
    .bind(body.agent_id)
    .bind(body.parent_run_id)
    .bind(RunStatus::Running)
    .bind(Utc::now())
    .bind(body.metadata.clone().unwrap_or_else(|| serde_json::json!({})))
    .fetch_one(&state.pool)
    .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(request_id(&req), run)))
}

#[derive(Debug, Deserialize)]
pub struct AppendEventsRequest {
    pub agent_id: Uuid,
    pub events: Vec<EventInput>,
}

#[derive(serde::Serialize)]
struct AppendEventsResponse {
    sequence_numbers: Vec<i64>,
}

/// `POST /v1/runs/{run_id}/events` (§4.5, §6). Appends to the in-memory
/// event buffer; returns `Busy` (503) when the buffer is at its hard cap.
pub async fn append_events(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<AppendEventsRequest>,
) -> Result<HttpResponse> {
    let claims = parse_claims(&req)?;
    let run_id = path.into_inner();

    let sequence_numbers = state
        .event_buffer
        .append(claims.org_id, run_id, body.agent_id, body.events.clone())
        .await?;

    Ok(HttpResponse::Accepted().json(ApiResponse::success(request_id(&req), AppendEventsResponse { sequence_numbers })))
}

#[derive(Debug, Deserialize)]
pub struct CompleteRunRequest {
    pub status: RunStatusInput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatusInput {
    Completed,
    Failed,
}

/// `POST /v1/runs/{run_id}/complete` (§4.2, §6).
pub async fn complete_run(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<CompleteRunRequest>,
) -> Result<HttpResponse> {
    let claims = parse_claims(&req)?;
    let run_id = path.into_inner();

    let status = match body.status {
        RunStatusInput::Completed => RunStatus::Completed,
        RunStatusInput::Failed => RunStatus::Failed,
    };

    let run: Option<Run> = sqlx::query_as(
        "UPDATE runs SET status = $1, completed_at = $2 WHERE id = $3 AND org_id = $4 RETURNING *",
    )
    .bind(status)
    .bind(Utc::now())
    .bind(run_id)
    .bind(claims.org_id)
    .fetch_optional(&state.pool)
    .await?;

    let run = run.ok_or_else(|| AppError::NotFound(format!("run {run_id} not found")))?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(request_id(&req), run)))
}
