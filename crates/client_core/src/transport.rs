//! Channel transport: one persistent websocket multiplexing every operation.
//!
//! The transport owns the connection lifecycle. On abnormal close it redials
//! with a fixed delay and a bounded retry budget; once the budget is spent it
//! parks in `Exhausted` and never resumes on its own. Outbound requests
//! queued in a dead connection epoch are discarded, never replayed.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::TransportError;

pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);
pub const MAX_RECONNECT_RETRIES: u32 = 10;

const FRAME_FANOUT_CAPACITY: usize = 1024;
const OUTBOUND_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Reconnecting { attempt: u32 },
    Exhausted,
}

#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// One raw text frame, in network arrival order within an epoch.
    Frame(String),
    /// The retry budget is spent; no further frames will ever arrive.
    Exhausted,
}

/// A live duplex to the server for one connection epoch. The inbound side
/// ends when the epoch dies; the outbound side dies with it, taking any
/// still-queued payloads along.
pub struct WireDuplex {
    pub outbound: mpsc::Sender<String>,
    pub inbound: mpsc::Receiver<String>,
}

/// Dial seam so the transport can be driven without a real network.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<WireDuplex, TransportError>;
}

/// Production connector bridging a tungstenite stream onto a [`WireDuplex`].
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<WireDuplex, TransportError> {
        let url = Url::parse(url).map_err(|err| TransportError::Handshake(err.to_string()))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(TransportError::Handshake(format!(
                "unsupported url scheme: {}",
                url.scheme()
            )));
        }

        let (stream, _) = connect_async(url.as_str())
            .await
            .map_err(|err| TransportError::Handshake(err.to_string()))?;
        let (mut sink, mut source) = stream.split();

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(OUTBOUND_QUEUE_CAPACITY);
        let (inbound_tx, inbound_rx) = mpsc::channel::<String>(FRAME_FANOUT_CAPACITY);

        tokio::spawn(async move {
            while let Some(payload) = outbound_rx.recv().await {
                if sink.send(Message::Text(payload)).await.is_err() {
                    break;
                }
            }
        });

        tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        if inbound_tx.send(text).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        warn!(error = %err, "websocket receive failed");
                        break;
                    }
                }
            }
        });

        Ok(WireDuplex {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

pub struct ChannelTransport {
    state: RwLock<ConnectionState>,
    writer: RwLock<Option<mpsc::Sender<String>>>,
    events: broadcast::Sender<TransportEvent>,
    /// Failed dials in the outage that spent the budget; 0 until then.
    exhausted_attempts: AtomicU32,
}

impl ChannelTransport {
    /// Starts the connection task and hands back the shared transport.
    /// The task runs until the retry budget is exhausted.
    pub fn spawn(connector: Arc<dyn Connector>, url: impl Into<String>) -> Arc<Self> {
        let (events, _) = broadcast::channel(FRAME_FANOUT_CAPACITY);
        let transport = Arc::new(Self {
            state: RwLock::new(ConnectionState::Connecting),
            writer: RwLock::new(None),
            events,
            exhausted_attempts: AtomicU32::new(0),
        });

        let runner = Arc::clone(&transport);
        let url = url.into();
        tokio::spawn(async move {
            runner.run(connector, url).await;
        });

        transport
    }

    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// The lazy inbound sequence: every receiver sees frames in arrival
    /// order within a connection epoch.
    pub fn events(&self) -> broadcast::Receiver<TransportEvent> {
        self.events.subscribe()
    }

    /// Writes one payload into the current epoch. Fails when the channel is
    /// not open; callers must not assume buffering across epochs. Once the
    /// retry budget is spent the failure names the spent budget instead.
    pub async fn send(&self, payload: String) -> Result<(), TransportError> {
        if self.state().await == ConnectionState::Exhausted {
            return Err(TransportError::Exhausted {
                attempts: self.exhausted_attempts.load(Ordering::SeqCst),
            });
        }
        let writer = { self.writer.read().await.clone() };
        let Some(writer) = writer else {
            return Err(TransportError::NotConnected);
        };
        writer
            .send(payload)
            .await
            .map_err(|_| TransportError::NotConnected)
    }

    async fn run(self: Arc<Self>, connector: Arc<dyn Connector>, url: String) {
        let mut failures: u32 = 0;
        let mut dials_failed: u32 = 0;
        loop {
            match connector.connect(&url).await {
                Ok(mut duplex) => {
                    failures = 0;
                    dials_failed = 0;
                    *self.writer.write().await = Some(duplex.outbound);
                    *self.state.write().await = ConnectionState::Open;
                    info!(url = %url, "channel open");

                    while let Some(raw) = duplex.inbound.recv().await {
                        // A send error only means nobody is listening right now.
                        let _ = self.events.send(TransportEvent::Frame(raw));
                    }

                    // Dropping the writer discards anything still queued in
                    // the dead epoch; the next epoch starts empty.
                    *self.writer.write().await = None;
                    warn!(url = %url, "channel lost");
                }
                Err(err) => {
                    dials_failed += 1;
                    warn!(url = %url, failures, error = %err, "connect failed");
                }
            }

            if failures >= MAX_RECONNECT_RETRIES {
                self.exhausted_attempts.store(dials_failed, Ordering::SeqCst);
                *self.state.write().await = ConnectionState::Exhausted;
                let _ = self.events.send(TransportEvent::Exhausted);
                warn!(url = %url, attempts = dials_failed, "retry budget exhausted, giving up");
                return;
            }
            failures += 1;
            *self.state.write().await = ConnectionState::Reconnecting { attempt: failures };
            tokio::time::sleep(RECONNECT_DELAY).await;
            debug!(url = %url, attempt = failures, "redialing");
        }
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
