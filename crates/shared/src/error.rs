use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level failure the server reports inside an otherwise healthy
/// envelope. Distinct from transport or decoding failures: it is surfaced to
/// the user and never folded into view state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
