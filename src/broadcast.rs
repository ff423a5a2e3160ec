/*
 * Logtap (C) 2025 - 2026 Logtap contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <http://www.gnu.org/licenses/>.
 *
 */

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{info, warn};
use ulid::Ulid;

use crate::entry::LogEntry;
use crate::queue::LogQueue;
use crate::LOCK_EXPECT;

pub const DEFAULT_DRAIN_BACKOFF: Duration = Duration::from_millis(100);
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(3);

/// The connection is no longer able to accept messages.
#[derive(Debug, thiserror::Error)]
#[error("subscriber connection is gone")]
pub struct SubscriberGone;

/// One live viewer connection, as the hub sees it. The transport behind it
/// is opaque; delivery failure is the only disconnect signal the hub needs.
#[async_trait]
pub trait Subscriber: Send + Sync {
    async fn send(&self, payload: String) -> Result<(), SubscriberGone>;
}

/// Subscriber backed by a bounded channel. The transport side owns the
/// receiving half and forwards to the socket; once that task exits the
/// channel closes and the next send fails, which is what prunes us.
pub struct ChannelSubscriber {
    tx: mpsc::Sender<String>,
}

impl ChannelSubscriber {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Subscriber for ChannelSubscriber {
    async fn send(&self, payload: String) -> Result<(), SubscriberGone> {
        self.tx.send(payload).await.map_err(|_| SubscriberGone)
    }
}

#[derive(Clone)]
struct SubscriberHandle {
    id: Ulid,
    peer: String,
    subscriber: Arc<dyn Subscriber>,
}

/// Registry of live viewers plus best-effort fan-out.
///
/// `deliver` snapshots the registry, sends to every subscriber
/// independently, and unregisters the ones whose send failed or timed out.
/// Nothing a subscriber does can surface an error past the hub.
pub struct Broadcaster {
    subscribers: RwLock<Vec<SubscriberHandle>>,
    send_timeout: Duration,
}

impl Broadcaster {
    pub fn new(send_timeout: Duration) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            send_timeout,
        }
    }

    /// Adds a subscriber and returns its identity. Identities are never
    /// reused; a reconnecting viewer registers as a new subscriber.
    pub fn register(&self, peer: impl Into<String>, subscriber: Arc<dyn Subscriber>) -> Ulid {
        let id = Ulid::new();
        self.subscribers
            .write()
            .expect(LOCK_EXPECT)
            .push(SubscriberHandle {
                id,
                peer: peer.into(),
                subscriber,
            });
        id
    }

    /// Removes a subscriber. Returns whether it was still registered;
    /// unregistering an unknown id is a no-op, so disconnect paths and
    /// delivery-failure pruning can race without double-removal.
    pub fn unregister(&self, id: Ulid) -> bool {
        let mut subscribers = self.subscribers.write().expect(LOCK_EXPECT);
        let before = subscribers.len();
        subscribers.retain(|handle| handle.id != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().expect(LOCK_EXPECT).len()
    }

    /// Sends `entry` to every registered subscriber. The entry is
    /// serialized once; each subscriber gets its own copy of the payload.
    /// A failed or timed-out send unregisters that subscriber and nothing
    /// else.
    pub async fn deliver(&self, entry: &LogEntry) {
        let payload = match serde_json::to_string(entry) {
            Ok(payload) => payload,
            Err(err) => {
                warn!("dropping undeliverable log entry: {err}");
                return;
            }
        };

        let snapshot: Vec<SubscriberHandle> =
            self.subscribers.read().expect(LOCK_EXPECT).clone();
        if snapshot.is_empty() {
            return;
        }

        let sends = snapshot.iter().map(|handle| {
            let payload = payload.clone();
            async move {
                match timeout(self.send_timeout, handle.subscriber.send(payload)).await {
                    Ok(Ok(())) => None,
                    Ok(Err(_)) => Some((handle, "connection closed")),
                    Err(_) => Some((handle, "send timed out")),
                }
            }
        });

        for (handle, reason) in join_all(sends).await.into_iter().flatten() {
            if self.unregister(handle.id) {
                info!("client disconnected: {} ({reason})", handle.peer);
            }
        }
    }
}

/// Drains the queue and broadcasts every entry, in append order, for the
/// lifetime of the process. An empty queue is polled again after a short
/// sleep rather than busy-spinning; sparse traffic therefore sees delivery
/// latency of at least the backoff interval.
pub async fn run_consumer(queue: Arc<LogQueue>, broadcaster: Arc<Broadcaster>, backoff: Duration) {
    loop {
        let drained = queue.drain_all();
        if drained.is_empty() {
            tokio::time::sleep(backoff).await;
            continue;
        }
        for entry in &drained {
            broadcaster.deliver(entry).await;
        }
    }
}
