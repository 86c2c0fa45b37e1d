use akashi_database::PubSubConnection;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::warn;
use uuid::Uuid;

const SUBSCRIBER_BUFFER: usize = 64;

/// A notification delivered to an SSE client: `channel` is `decisions` or
/// `conflicts`, `payload` is the JSON body published on that channel (§4.10).
#[derive(Debug, Clone, Serialize)]
pub struct BrokerEvent {
    pub channel: String,
    pub payload: serde_json::Value,
}

struct Subscriber {
    org_id: Uuid,
    sender: mpsc::Sender<BrokerEvent>,
}

/// Tenant-scoped fan-out from the single dedicated pub/sub connection to
/// per-client buffered channels. One `RwLock`: broadcast holds a read lock,
/// subscribe/unsubscribe hold a write lock (§5).
pub struct Broker {
    subscribers: RwLock<HashMap<u64, Subscriber>>,
    next_id: AtomicU64,
}

impl Broker {
    pub fn new() -> Self {
        Self { subscribers: RwLock::new(HashMap::new()), next_id: AtomicU64::new(1) }
    }

    pub async fn subscribe(&self, org_id: Uuid) -> (u64, mpsc::Receiver<BrokerEvent>) {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.write().await.insert(id, Subscriber { org_id, sender: tx });
        (id, rx)
    }

    pub async fn unsubscribe(&self, id: u64) {
        self.subscribers.write().await.remove(&id);
    }

    /// Non-blocking fan-out to every subscriber of `org_id`. A full buffer
    /// means a slow consumer; it is skipped with a warning rather than
    /// applying backpressure to the publisher (§4.10).
    pub async fn broadcast(&self, org_id: Uuid, channel: &str, payload: serde_json::Value) {
        let event = BrokerEvent { channel: channel.to_string(), payload };
        let subscribers = self.subscribers.read().await;
        for (id, sub) in subscribers.iter() {
            if sub.org_id != org_id {
                continue;
            }
            if sub.sender.try_send(event.clone()).is_err() {
                warn!(subscriber_id = id, %org_id, "broker subscriber buffer full, dropping event");
            }
        }
    }

    /// Runs the single read loop against the dedicated pub/sub connection.
    /// `recv()` reconnects transparently with backoff and resubscribes the
    /// tracked channel set; this loop never exits except on a hard error.
    pub async fn run(self: Arc<Self>, pubsub: Arc<PubSubConnection>) {
        loop {
            let notification = match pubsub.recv().await {
                Ok(note) => note,
                Err(err) => {
                    warn!(error = %err, "broker pub/sub loop terminating after reconnect exhaustion");
                    return;
                }
            };

            let channel = notification.channel().to_string();
            let payload: serde_json::Value = match serde_json::from_str(notification.payload()) {
                Ok(v) => v,
                Err(err) => {
                    warn!(error = %err, channel, "dropping malformed pub/sub payload");
                    continue;
                }
            };

            let org_id = payload.get("org_id").and_then(|v| v.as_str()).and_then(|s| Uuid::parse_str(s).ok());

            match org_id {
                Some(org_id) => self.broadcast(org_id, &channel, payload).await,
                None => warn!(channel, "dropping pub/sub payload without an org_id"),
            }
        }
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}
