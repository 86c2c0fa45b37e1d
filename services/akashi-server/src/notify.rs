use sqlx::PgPool;
use tracing::warn;

/// Publishes a JSON payload on a Postgres NOTIFY channel. Failures are
/// logged and dropped, never surfaced to the caller — notification publish
/// is non-fatal to the write path it follows (§4.4 step 4, §7).
pub async fn publish(pool: &PgPool, channel: &str, payload: &serde_json::Value) {
    let body = payload.to_string();
    if let Err(err) = sqlx::query("SELECT pg_notify($1, $2)").bind(channel).bind(&body).execute(pool).await {
        warn!(error = %err, channel, "failed to publish notification");
    }
}
