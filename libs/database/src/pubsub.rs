use rand::Rng;
use sqlx::postgres::{PgListener, PgNotification};
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::Mutex;

/// Bounds how many reconnect attempts a single `connect_with_backoff` call
/// makes before giving up and returning the last error to the caller.
const MAX_RECONNECT_ATTEMPTS: u32 = 12;
const BASE_BACKOFF_MS: u64 = 500;
const MAX_BACKOFF_MS: u64 = 30_000;

/// Owns the single dedicated long-lived connection used for LISTEN/NOTIFY.
/// The pooled path (an external pooler in transaction mode, typically)
/// cannot carry session-scoped subscriptions, so this is a singleton
/// resource with its own reconnection state machine, serialized via an
/// internal mutex during reconnect (§4.3, §5).
pub struct PubSubConnection {
    database_url: String,
    channels: Mutex<HashSet<String>>,
    listener: Mutex<Option<PgListener>>,
}

impl PubSubConnection {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            channels: Mutex::new(HashSet::new()),
            listener: Mutex::new(None),
        }
    }

    /// Adds a channel to the tracked set and, if a connection is already
    /// live, subscribes immediately. Re-subscription after reconnect is
    /// handled by `connect_with_backoff` from the tracked set alone.
    pub async fn subscribe(&self, channel: &str) -> Result<(), sqlx::Error> {
        self.channels.lock().await.insert(channel.to_string());
        let mut guard = self.listener.lock().await;
        if let Some(listener) = guard.as_mut() {
            listener.listen(channel).await?;
        }
        Ok(())
    }

    /// Connects (or reconnects), re-subscribing to every tracked channel.
    /// Backoff is exponential with jitter starting at 500ms, doubling each
    /// attempt, capped at 30s, bounded at `MAX_RECONNECT_ATTEMPTS` attempts.
    pub async fn connect_with_backoff(&self) -> Result<(), sqlx::Error> {
        let mut attempt: u32 = 0;
        loop {
            match PgListener::connect(&self.database_url).await {
                Ok(mut listener) => {
                    let channels = self.channels.lock().await.clone();
                    for channel in &channels {
                        listener.listen(channel).await?;
                    }
                    *self.listener.lock().await = Some(listener);
                    return Ok(());
                }
                Err(err) => {
                    attempt += 1;
                    if attempt >= MAX_RECONNECT_ATTEMPTS {
                        tracing::error!(attempt, error = %err, "pub/sub reconnect exhausted");
                        return Err(err);
                    }
                    let delay = backoff_delay(attempt);
                    tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "pub/sub reconnect failed, backing off");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Blocks for the next notification, transparently reconnecting (with
    /// backoff) whenever the connection is absent or drops mid-receive.
    pub async fn recv(&self) -> Result<PgNotification, sqlx::Error> {
        loop {
            let mut guard = self.listener.lock().await;
            if let Some(listener) = guard.as_mut() {
                match listener.recv().await {
                    Ok(note) => return Ok(note),
                    Err(err) => {
                        tracing::warn!(error = %err, "pub/sub connection lost, reconnecting");
                        *guard = None;
                    }
                }
            } else {
                drop(guard);
                self.connect_with_backoff().await?;
            }
        }
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    let exp = attempt.min(16);
    let raw = BASE_BACKOFF_MS.saturating_mul(1u64 << exp);
    let capped = raw.min(MAX_BACKOFF_MS);
    let jitter = rand::thread_rng().gen_range(0..=capped / 2);
    Duration::from_millis(capped + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let d1 = backoff_delay(1);
        let d2 = backoff_delay(2);
        assert!(d1.as_millis() >= BASE_BACKOFF_MS as u128 * 2);
        assert!(d2.as_millis() >= d1.as_millis());
        let far = backoff_delay(30);
        assert!(far.as_millis() <= (MAX_BACKOFF_MS + MAX_BACKOFF_MS / 2) as u128);
    }
}
