use crate::auth::verify_api_key;
use crate::state::AppState;
use akashi_common::utils::request_id;
use akashi_common::{ApiResponse, AppError, Result};
use akashi_models::agent::Agent;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub org_slug: String,
    pub agent_id: String,
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_at: i64,
}

/// `POST /auth/token` (§6): exchanges an org-scoped API key for a
/// short-lived bearer token. Always runs `verify_api_key` against either
/// the stored hash or the fixed dummy hash so a nonexistent org/agent pair
/// takes the same time as a wrong key.
pub async fn issue_token(state: web::Data<AppState>, req: HttpRequest, body: web::Json<TokenRequest>) -> Result<HttpResponse> {
    let agent: Option<Agent> = sqlx::query_as(
        r#"
        SELECT a.* FROM agents a
        JOIN organizations o ON o.id = a.org_id
        WHERE o.slug = $1 AND a.agent_id = $2
        "#,
    )
    .bind(&body.org_slug)
    .bind(&body.agent_id)
    .fetch_optional(&state.pool)
    .await?;

    let stored_hash = agent.as_ref().and_then(|a| a.api_key_hash.as_deref());
    let verified = verify_api_key(&body.api_key, stored_hash);

    let agent = match (verified, agent) {
        (true, Some(agent)) => agent,
        _ => return Err(AppError::Unauthenticated),
    };

    let (token, expires_at) = state.jwt.issue(&agent.agent_id, agent.org_id, agent.id, &agent.role.to_string())?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(request_id(&req), TokenResponse { token, expires_at })))
}

/// Pulls the verified caller out of request extensions and hydrates the
/// full `Agent` row the access filter and ingestion path need.
pub async fn load_caller(state: &AppState, claims: &crate::auth::Claims) -> Result<Agent> {
    sqlx::query_as::<_, Agent>("SELECT * FROM agents WHERE id = $1 AND org_id = $2")
        .bind(claims.agent_row_id)
        .bind(claims.org_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::Unauthenticated)
}

pub fn parse_claims(req: &actix_web::HttpRequest) -> Result<crate::auth::Claims> {
    use actix_web::HttpMessage;
    req.extensions().get::<crate::auth::Claims>().cloned().ok_or(AppError::Unauthenticated)
}

