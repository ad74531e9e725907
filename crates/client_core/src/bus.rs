//! Subscription bus: one decoded inbound stream fanned out to every view.
//!
//! The bus does no tag-based routing; each subscriber filters for itself.
//! Undecodable frames are logged and dropped here so one bad payload never
//! takes down a view, let alone the process.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{debug, warn};

use crate::registry::{self, Inbound};
use crate::transport::TransportEvent;

#[derive(Debug, Clone)]
pub enum BusEvent {
    Message(Inbound),
    /// Terminal: the transport gave up for good. Emitted at most once.
    Closed,
}

/// Token returned by [`SubscriptionBus::subscribe`]; pass it back to
/// [`SubscriptionBus::unsubscribe`] on teardown.
pub struct SubscriptionHandle {
    id: u64,
}

struct BusShared {
    subscribers: Mutex<HashMap<u64, mpsc::UnboundedSender<BusEvent>>>,
    next_id: AtomicU64,
}

impl BusShared {
    /// Fan out one event to every live subscriber, in registration-agnostic
    /// but arrival-preserving order. Subscribers whose receiver is gone are
    /// reaped here.
    async fn dispatch(&self, event: BusEvent) {
        let mut subscribers = self.subscribers.lock().await;
        subscribers.retain(|id, tx| {
            if tx.send(event.clone()).is_ok() {
                true
            } else {
                debug!(subscriber = id, "reaping dead subscriber");
                false
            }
        });
    }
}

pub struct SubscriptionBus {
    shared: Arc<BusShared>,
}

impl SubscriptionBus {
    /// Starts the pump task that decodes transport frames and fans them out.
    pub fn spawn(mut events: broadcast::Receiver<TransportEvent>) -> Arc<Self> {
        let shared = Arc::new(BusShared {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        });

        let pump = Arc::clone(&shared);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(TransportEvent::Frame(raw)) => match registry::decode_reply(&raw) {
                        Ok(inbound) => pump.dispatch(BusEvent::Message(inbound)).await,
                        Err(err) => warn!(error = %err, "dropping undecodable frame"),
                    },
                    Ok(TransportEvent::Exhausted) => {
                        pump.dispatch(BusEvent::Closed).await;
                        return;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "bus fell behind the transport stream");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        pump.dispatch(BusEvent::Closed).await;
                        return;
                    }
                }
            }
        });

        Arc::new(Self { shared })
    }

    pub async fn subscribe(&self) -> (SubscriptionHandle, mpsc::UnboundedReceiver<BusEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        self.shared.subscribers.lock().await.insert(id, tx);
        (SubscriptionHandle { id }, rx)
    }

    /// Idempotent: unsubscribing an already-removed handle is a no-op, so a
    /// teardown path may race an in-flight dispatch safely.
    pub async fn unsubscribe(&self, handle: &SubscriptionHandle) {
        self.shared.subscribers.lock().await.remove(&handle.id);
    }

    pub async fn subscriber_count(&self) -> usize {
        self.shared.subscribers.lock().await.len()
    }
}

#[cfg(test)]
#[path = "tests/bus_tests.rs"]
mod tests;
