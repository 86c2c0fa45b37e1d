use akashi_models::decision::Decision;
use akashi_models::outbox::{OutboxOperation, SearchOutboxEntry};
use akashi_search::{Point, PointPayload, VectorIndex};
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

const LOCK_DURATION_SECS: i64 = 30;
const MAX_BACKOFF_SECS: i64 = 300;
const PENDING_BACKOFF_SECS: i64 = 1800;
const DEAD_LETTER_RETENTION_DAYS: i64 = 7;

/// Eventually-consistent mirror from the primary store to the external
/// vector index. One poll loop per process; `skip_locked` lets multiple
/// instances share the queue safely (§4.6).
pub struct OutboxWorker {
    pool: PgPool,
    index: Arc<dyn VectorIndex>,
    poll_interval: Duration,
    batch_size: i64,
    max_attempts: i32,
}

impl OutboxWorker {
    pub fn new(pool: PgPool, index: Arc<dyn VectorIndex>, poll_interval: Duration, batch_size: i64, max_attempts: i32) -> Self {
        Self { pool, index, poll_interval, batch_size, max_attempts }
    }

    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        let mut last_sweep = Utc::now();
        loop {
            ticker.tick().await;
            if let Err(err) = self.process_batch().await {
                error!(error = %err, "outbox poll cycle failed");
            }

            if Utc::now() - last_sweep > chrono::Duration::hours(1) {
                if let Err(err) = self.sweep_dead_letters().await {
                    error!(error = %err, "dead-letter sweep failed");
                }
                last_sweep = Utc::now();
            }
        }
    }

    /// One poll cycle: lock a batch, partition by operation and readiness,
    /// sync to the index, then either delete the row or reschedule it.
    pub async fn process_batch(&self) -> Result<(), sqlx::Error> {
        let locked = self.lock_batch().await?;
        if locked.is_empty() {
            return Ok(());
        }

        let (upserts, deletes): (Vec<_>, Vec<_>) =
            locked.into_iter().partition(|e| e.operation == OutboxOperation::Upsert);

        if !deletes.is_empty() {
            let ids: Vec<Uuid> = deletes.iter().map(|e| e.decision_id).collect();
            match self.index.delete_by_ids(&ids).await {
                Ok(()) => self.delete_entries(&deletes.iter().map(|e| e.id).collect::<Vec<_>>()).await?,
                Err(err) => self.reschedule_on_error(&deletes, &err.to_string()).await?,
            }
        }

        if !upserts.is_empty() {
            self.process_upserts(upserts).await?;
        }

        Ok(())
    }

    async fn process_upserts(&self, entries: Vec<SearchOutboxEntry>) -> Result<(), sqlx::Error> {
        let ids: Vec<Uuid> = entries.iter().map(|e| e.decision_id).collect();
        let decisions: Vec<Decision> = sqlx::query_as::<_, Decision>(
            "SELECT * FROM decisions WHERE id = ANY($1) AND valid_to IS NULL",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_decision = std::collections::HashMap::new();
        for d in decisions {
            by_decision.insert(d.id, d);
        }

        let mut ready_entries = Vec::new();
        let mut ready_points = Vec::new();
        let mut pending_entries = Vec::new();

        for entry in entries {
            match by_decision.get(&entry.decision_id) {
                Some(decision) => match &decision.embedding_full {
                    Some(embedding) => {
                        ready_points.push(Point {
                            id: decision.id,
                            embedding: embedding.to_vec(),
                            payload: PointPayload {
                                org_id: decision.org_id,
                                agent_id: decision.agent_id,
                                decision_type: decision.decision_type.clone(),
                                session_id: decision.session_id.clone(),
                                tool: None,
                                model: None,
                                project: None,
                                confidence: decision.confidence,
                                completeness_score: decision.completeness_score,
                                valid_from_unix: decision.valid_from.timestamp(),
                            },
                        });
                        ready_entries.push(entry);
                    }
                    None => pending_entries.push(entry),
                },
                None => {
                    // Decision no longer current (superseded or purged); the
                    // outbox row has nothing left to mirror.
                    ready_entries.push(entry);
                }
            }
        }

        if !ready_points.is_empty() {
            if let Err(err) = self.index.upsert(&ready_points).await {
                self.reschedule_on_error(&ready_entries, &err.to_string()).await?;
                return Ok(());
            }
        }
        if !ready_entries.is_empty() {
            self.delete_entries(&ready_entries.iter().map(|e| e.id).collect::<Vec<_>>()).await?;
        }

        if !pending_entries.is_empty() {
            self.defer_pending(&pending_entries).await?;
        }

        Ok(())
    }

    async fn lock_batch(&self) -> Result<Vec<SearchOutboxEntry>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let rows: Vec<SearchOutboxEntry> = sqlx::query_as(
            r#"
            SELECT * FROM search_outbox
            WHERE (locked_until IS NULL OR locked_until < now()) AND attempts < $1
            ORDER BY created_at ASC
            LIMIT $2
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(self.max_attempts)
        .bind(self.batch_size)
        .fetch_all(&mut *tx)
        .await?;

        if !rows.is_empty() {
            let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
            sqlx::query("UPDATE search_outbox SET locked_until = now() + ($1 || ' seconds')::interval WHERE id = ANY($2)")
                .bind(LOCK_DURATION_SECS.to_string())
                .bind(&ids)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(rows)
    }

    async fn delete_entries(&self, ids: &[i64]) -> Result<(), sqlx::Error> {
        if ids.is_empty() {
            return Ok(());
        }
        sqlx::query("DELETE FROM search_outbox WHERE id = ANY($1)").bind(ids).execute(&self.pool).await?;
        Ok(())
    }

    async fn reschedule_on_error(&self, entries: &[SearchOutboxEntry], error: &str) -> Result<(), sqlx::Error> {
        for entry in entries {
            let attempts = entry.attempts + 1;
            let backoff_secs = (2i64.saturating_pow(attempts.max(0) as u32)).min(MAX_BACKOFF_SECS);
            if attempts >= self.max_attempts {
                warn!(decision_id = %entry.decision_id, attempts, "outbox entry reached max attempts, will be dead-lettered");
            }
            sqlx::query(
                "UPDATE search_outbox SET attempts = $1, last_error = $2, locked_until = now() + ($3 || ' seconds')::interval WHERE id = $4",
            )
            .bind(attempts)
            .bind(error)
            .bind(backoff_secs.to_string())
            .bind(entry.id)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    /// Decision exists but has no embedding yet: an expected race with the
    /// embedding backfill, so this gets a longer, distinct backoff policy
    /// rather than the hard-failure path (§4.6 step 6).
    async fn defer_pending(&self, entries: &[SearchOutboxEntry]) -> Result<(), sqlx::Error> {
        for entry in entries {
            let attempts = entry.attempts + 1;
            sqlx::query(
                "UPDATE search_outbox SET attempts = $1, last_error = $2, locked_until = now() + ($3 || ' seconds')::interval WHERE id = $4",
            )
            .bind(attempts)
            .bind("decision has no embedding yet")
            .bind(PENDING_BACKOFF_SECS.to_string())
            .bind(entry.id)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    /// Archives entries at or past `max_attempts` to the dead-letter table
    /// and removes the originals; also purges dead letters older than 7
    /// days from the archive itself (§4.6 step 7).
    async fn sweep_dead_letters(&self) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let archived = sqlx::query(
            r#"
            INSERT INTO dead_letter_outbox (id, decision_id, org_id, operation, attempts, last_error, created_at, archived_at)
            SELECT id, decision_id, org_id, operation, attempts, last_error, created_at, now()
            FROM search_outbox
            WHERE attempts >= $1
            "#,
        )
        .bind(self.max_attempts)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query("DELETE FROM search_outbox WHERE attempts >= $1").bind(self.max_attempts).execute(&mut *tx).await?;

        sqlx::query("DELETE FROM dead_letter_outbox WHERE archived_at < now() - ($1 || ' days')::interval")
            .bind(DEAD_LETTER_RETENTION_DAYS.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        if archived > 0 {
            info!(archived, "swept outbox entries to dead-letter table");
        }
        Ok(())
    }
}
