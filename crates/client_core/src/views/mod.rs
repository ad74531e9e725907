//! View controllers: per-screen units owning query state, result state and
//! the request lifecycle. Every data-bearing screen follows the same shape;
//! [`user`] is the user-profile instance of the pattern.

pub mod user;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::transport::ChannelTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Awaiting,
    Ready,
}

/// What a controller asks its embedder to do after folding a bus event.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEffect {
    /// Result state changed wholesale; re-render from it.
    Rerender,
    /// Server-reported failure; show it to the user, state is untouched.
    Alert(String),
}

/// Outbound seam for controllers. Production sends through the transport;
/// tests record payloads instead.
#[async_trait]
pub trait RequestSink: Send + Sync {
    async fn send(&self, payload: String) -> Result<(), TransportError>;
}

#[async_trait]
impl RequestSink for ChannelTransport {
    async fn send(&self, payload: String) -> Result<(), TransportError> {
        ChannelTransport::send(self, payload).await
    }
}
