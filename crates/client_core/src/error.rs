use shared::protocol::UserOperation;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("channel is not connected")]
    NotConnected,
    #[error("retry budget exhausted after {attempts} attempts")]
    Exhausted { attempts: u32 },
    #[error("websocket handshake failed: {0}")]
    Handshake(String),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("payload carries no operation tag")]
    MissingTag,
    #[error("malformed {op:?} payload: {source}")]
    Payload {
        op: UserOperation,
        source: serde_json::Error,
    },
}
