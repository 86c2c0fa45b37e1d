use actix_web::HttpRequest;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub fn generate_id() -> Uuid {
    Uuid::new_v4()
}

pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Reads `X-Request-Id` off an inbound request, generating one when absent.
/// Used by the request-id middleware and by handlers that need to echo the
/// id in a response built outside the envelope (e.g. SSE).
pub fn request_id(req: &HttpRequest) -> Uuid {
    req.headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4)
}
