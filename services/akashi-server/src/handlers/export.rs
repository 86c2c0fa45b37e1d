use crate::handlers::auth::{load_caller, parse_claims};
use crate::query::compute_allowed_set;
use crate::state::AppState;
use akashi_common::Result;
use akashi_models::decision::Decision;
use actix_web::{web, HttpRequest, HttpResponse};
use futures::StreamExt;

/// `GET /v1/export/decisions` (§6): streams every currently-valid decision
/// visible to the caller as newline-delimited JSON, one row per line,
/// without buffering the whole result set in memory.
pub async fn export_decisions(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let claims = parse_claims(&req)?;
    let caller = load_caller(&state, &claims).await?;
    let allowed = compute_allowed_set(&state.pool, &caller).await?;

    let pool = state.pool.clone();
    let org_id = claims.org_id;

    let rows = sqlx::query_as::<_, Decision>("SELECT * FROM decisions WHERE org_id = $1 AND valid_to IS NULL ORDER BY valid_from ASC")
        .bind(org_id)
        .fetch(&pool);

    let body_stream = rows.filter_map(move |row| {
        let allowed = allowed.clone();
        async move {
            let decision = match row {
                Ok(d) => d,
                Err(err) => return Some(Err(actix_web::error::ErrorInternalServerError(err.to_string()))),
            };
            if allowed.as_ref().map(|set| set.contains(&decision.agent_id)).unwrap_or(true) {
                let mut line = serde_json::to_vec(&decision).unwrap_or_default();
                line.push(b'\n');
                Some(Ok::<_, actix_web::Error>(actix_web::web::Bytes::from(line)))
            } else {
                None
            }
        }
    });

    Ok(HttpResponse::Ok()
        .content_type("application/x-ndjson")
        .streaming(body_stream))
}
