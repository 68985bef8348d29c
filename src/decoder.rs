//! Decoding of inbound server frames.
//!
//! Failures are classified so callers can log them at the right level, but
//! every failure means the same thing to the session: drop this frame and
//! carry on.

use serde_json::Value;
use thiserror::Error;

use crate::event::ChatEvent;
use crate::protocol::ServerMessage;

/// Why an inbound frame could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeFailure {
    /// Not JSON, or a known `type` with missing or ill-typed fields.
    #[error("malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The frame is JSON but carries no string `type` field.
    #[error("frame has no type discriminator")]
    MissingType,

    /// The `type` tag is not one this client understands.
    #[error("unknown frame type {0:?}")]
    UnknownType(String),
}

impl DecodeFailure {
    /// Unknown tags are expected from newer servers and are not worth a warning.
    pub fn is_forward_compatible(&self) -> bool {
        matches!(self, Self::UnknownType(_))
    }
}

/// Decode one raw text frame into a [`ChatEvent`].
pub fn decode(raw: &str) -> Result<ChatEvent, DecodeFailure> {
    let value: Value = serde_json::from_str(raw).map_err(DecodeFailure::Malformed)?;

    let tag = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(DecodeFailure::MissingType)?;

    if !ServerMessage::KNOWN_TYPES.contains(&tag) {
        return Err(DecodeFailure::UnknownType(tag.to_owned()));
    }

    // Re-read the text: a `Value` keeps the last of duplicate keys, while the
    // typed parse rejects them.
    serde_json::from_str::<ServerMessage>(raw)
        .map(ChatEvent::from)
        .map_err(DecodeFailure::Malformed)
}
