use crate::handlers::auth::parse_claims;
use crate::idempotency::{self, IdempotencyCheck};
use crate::state::AppState;
use akashi_common::utils::request_id;
use akashi_common::{ApiResponse, Result};
use akashi_models::decision::TraceInput;
use actix_web::{web, HttpRequest, HttpResponse};

const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// `POST /v1/trace` (§4.4, §6). Honors an `Idempotency-Key` header when
/// present: a fresh key runs the real write and snapshots the response, a
/// replay with a matching body returns the snapshot unchanged.
pub async fn trace(state: web::Data<AppState>, req: HttpRequest, body: web::Json<TraceInput>) -> Result<HttpResponse> {
    let claims = parse_claims(&req)?;
    let org_id = claims.org_id;

    let idempotency_key = req
        .headers()
        .get(IDEMPOTENCY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let fresh_hash = match &idempotency_key {
        Some(key) => match idempotency::check(&state.pool, org_id, key, &*body).await? {
            IdempotencyCheck::Replay(snapshot) => return Ok(HttpResponse::Ok().json(snapshot)),
            IdempotencyCheck::Fresh(hash) => Some(hash),
        },
        None => None,
    };

    let decision = state.trace_service.trace(org_id, body.into_inner()).await?;
    let envelope = ApiResponse::success(request_id(&req), decision);
    let response = serde_json::to_value(&envelope).map_err(akashi_common::AppError::internal)?;

    if let (Some(key), Some(hash)) = (&idempotency_key, &fresh_hash) {
        idempotency::store(&state.pool, org_id, key, hash, &response).await?;
    }

    Ok(HttpResponse::Created().json(response))
}
