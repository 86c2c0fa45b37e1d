use akashi_common::{AppError, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

/// Result of checking an idempotency key before doing the real work
/// (§3, §9 Design Notes).
pub enum IdempotencyCheck {
    /// No prior record; caller should proceed and call [`store`] with the
    /// returned body hash once it has a response to snapshot.
    Fresh(String),
    /// A prior write with an identical request body; caller should return
    /// this response unchanged rather than repeating the write.
    Replay(serde_json::Value),
}

pub fn hash_body(body: &impl Serialize) -> Result<String> {
    let bytes = serde_json::to_vec(body).map_err(AppError::internal)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Looks up `key` within `org_id`. A replay with a body hash that doesn't
/// match the original request is rejected as `Conflict`; a replay with a
/// matching hash is not an error — the caller gets [`IdempotencyCheck::Replay`].
pub async fn check(pool: &PgPool, org_id: Uuid, key: &str, request_body: &impl Serialize) -> Result<IdempotencyCheck> {
    let hash = hash_body(request_body)?;

    let existing: Option<(String, serde_json::Value)> = sqlx::query_as(
        "SELECT request_body_hash, response_snapshot FROM idempotency_keys WHERE org_id = $1 AND key = $2",
    )
    .bind(org_id)
    .bind(key)
    .fetch_optional(pool)
    .await?;

    match existing {
        None => Ok(IdempotencyCheck::Fresh(hash)),
        Some((stored_hash, snapshot)) if stored_hash == hash => Ok(IdempotencyCheck::Replay(snapshot)),
        Some(_) => Err(AppError::Conflict("idempotency key was already used with a different request body".to_string())),
    }
}

/// Records the response snapshot for a freshly-processed key. Racing
/// concurrent callers with the same fresh key are resolved by the unique
/// `(org_id, key)` constraint; the loser's insert fails and its caller
/// falls back to treating the request as already handled.
pub async fn store(pool: &PgPool, org_id: Uuid, key: &str, request_body_hash: &str, response: &serde_json::Value) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO idempotency_keys (id, org_id, key, request_body_hash, response_snapshot, created_at)
        VALUES ($1, $2, $3, $4, $5, now())
        ON CONFLICT (org_id, key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(org_id)
    .bind(key)
    .bind(request_body_hash)
    .bind(response)
    .execute(pool)
    .await?;
    Ok(())
}
