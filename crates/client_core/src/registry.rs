//! Operation registry: the single place that knows the wire envelope.
//!
//! Requests serialize to `{"op": ..., "data": ...}`; replies echo the tag.
//! A reply whose envelope carries an `error` field is a server-reported
//! application failure, which is a distinct outcome from a decoder failure.

use serde_json::Value;
use shared::error::ApiError;
use shared::protocol::{ClientRequest, ServerReply, UserOperation};

use crate::error::DecodeError;

/// Everything a decoded frame can be. Closed over the known catalogue, with
/// an explicit variant for tags outside it so receivers can log and drop
/// them instead of failing.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Reply(ServerReply),
    AppError {
        op: Option<UserOperation>,
        error: ApiError,
    },
    Unknown {
        op: String,
    },
}

/// Identical requests always produce identical payloads; the outbound side
/// of a view is a pure function of its query state.
pub fn encode_request(request: &ClientRequest) -> Result<String, DecodeError> {
    serde_json::to_string(request).map_err(DecodeError::Malformed)
}

pub fn decode_reply(raw: &str) -> Result<Inbound, DecodeError> {
    let value: Value = serde_json::from_str(raw)?;

    let op_tag = value
        .get("op")
        .and_then(Value::as_str)
        .map(str::to_owned);

    if let Some(message) = value.get("error").and_then(Value::as_str) {
        let op = op_tag.as_deref().and_then(UserOperation::parse);
        return Ok(Inbound::AppError {
            op,
            error: ApiError::new(message),
        });
    }

    let Some(op_tag) = op_tag else {
        return Err(DecodeError::MissingTag);
    };
    let Some(op) = UserOperation::parse(&op_tag) else {
        return Ok(Inbound::Unknown { op: op_tag });
    };

    match serde_json::from_value::<ServerReply>(value) {
        Ok(reply) => Ok(Inbound::Reply(reply)),
        Err(source) => Err(DecodeError::Payload { op, source }),
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
