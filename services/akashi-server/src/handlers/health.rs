use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    database: bool,
    vector_index: bool,
    event_buffer_dropped: u64,
}

/// `GET /health` (§6): never requires auth, reports the two external
/// dependencies the process depends on without failing the request if
/// either is down — the index outage is a degraded-mode condition, not an
/// outage of this process (§8 scenario 3).
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let database = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();
    let vector_index = state.vector_index.healthy().await.is_ok();

    let body = HealthBody {
        status: if database { "ok" } else { "degraded" },
        database,
        vector_index,
        event_buffer_dropped: state.event_buffer.dropped_count(),
    };

    if database {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
