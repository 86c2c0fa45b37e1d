use akashi_common::{AppError, Result};
use akashi_database::bulk_insert_events;
use akashi_models::event::{AgentEvent, EventInput};
use chrono::Utc;
use sqlx::PgPool;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::timeout;
use tracing::{error, warn};
use uuid::Uuid;

/// Hard cap regardless of configured threshold — the backpressure signal
/// callers must surface as `Busy` (§4.5).
const HARD_CAP: usize = 100_000;

/// Per-process, in-memory batch collector for run events. A single
/// mutex-guarded queue, one flush loop; sequence numbers are reserved from
/// a shared atomic source so they stay globally unique and gap-free even
/// under concurrent `append` callers (§4.5, §5, §8).
pub struct EventBuffer {
    pool: PgPool,
    queue: Mutex<VecDeque<AgentEvent>>,
    sequence: AtomicI64,
    flush_threshold: usize,
    flush_interval: Duration,
    dropped: AtomicU64,
    flush_now: Notify,
    drained: Notify,
}

impl EventBuffer {
    pub fn new(pool: PgPool, flush_threshold: usize, flush_interval: Duration) -> Self {
        Self {
            pool,
            queue: Mutex::new(VecDeque::new()),
            sequence: AtomicI64::new(1),
            flush_threshold,
            flush_interval,
            dropped: AtomicU64::new(0),
            flush_now: Notify::new(),
            drained: Notify::new(),
        }
    }

    /// Reserves a contiguous sequence-number block and enqueues the given
    /// events. Returns `Busy` if total occupancy would exceed the hard cap.
    pub async fn append(&self, org_id: Uuid, run_id: Uuid, agent_id: Uuid, events: Vec<EventInput>) -> Result<Vec<i64>> {
        if events.is_empty() {
            return Ok(Vec::new());
        }

        let mut queue = self.queue.lock().await;
        if queue.len() + events.len() > HARD_CAP {
            return Err(AppError::Busy("event buffer at capacity".to_string()));
        }

        let start = self.sequence.fetch_add(events.len() as i64, Ordering::SeqCst);
        let mut sequence_nums = Vec::with_capacity(events.len());

        for (offset, input) in events.into_iter().enumerate() {
            let sequence_num = start + offset as i64;
            sequence_nums.push(sequence_num);
            queue.push_back(AgentEvent {
                id: Uuid::new_v4(),
                org_id,
                run_id,
                agent_id,
                event_type: input.event_type,
                sequence_num,
                occurred_at: input.occurred_at.unwrap_or_else(Utc::now),
                payload: input.payload,
                created_at: Utc::now(),
            });
        }

        let should_flush = queue.len() >= self.flush_threshold;
        drop(queue);

        if should_flush {
            self.flush_now.notify_one();
        }

        Ok(sequence_nums)
    }

    /// Triggers a flush and blocks until the queue drains or `wait` elapses.
    pub async fn drain(&self, wait: Duration) {
        self.flush_now.notify_one();
        let _ = timeout(wait, self.drained.notified()).await;
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// The single flush loop: wakes on the configured interval or an
    /// explicit `flush_now`/`drain` signal, whichever comes first.
    pub async fn run(&self) {
        loop {
            let _ = timeout(self.flush_interval, self.flush_now.notified()).await;
            self.flush_once().await;
            self.drained.notify_waiters();
        }
    }

    async fn flush_once(&self) {
        let batch: Vec<AgentEvent> = {
            let mut queue = self.queue.lock().await;
            queue.drain(..).collect()
        };

        if batch.is_empty() {
            return;
        }

        match bulk_insert_events(&self.pool, &batch).await {
            Ok(rows) => {
                tracing::debug!(rows, "flushed event buffer");
            }
            Err(err) => {
                error!(error = %err, count = batch.len(), "event buffer flush failed, requeueing");
                let mut queue = self.queue.lock().await;
                let room = HARD_CAP.saturating_sub(queue.len());
                let to_requeue = batch.len().min(room);
                let dropped = batch.len() - to_requeue;
                if dropped > 0 {
                    self.dropped.fetch_add(dropped as u64, Ordering::Relaxed);
                    warn!(dropped, "event buffer over capacity after failed flush, dropping events");
                }
                for event in batch.into_iter().take(to_requeue).rev() {
                    queue.push_front(event);
                }
            }
        }
    }
}
