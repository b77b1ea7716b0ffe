//! Frame codec.
//!
//! Pure functions between wire frames and [`Message`] values.
//!
//! Outbound frames use protocol version 1: the full [`WireEnvelope`] of the
//! message, including its sender. There is no acknowledgement.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{from_str, json};

use crate::error::DecodeError;

use super::envelope::WireEnvelope;
use super::message::Message;

// ============================================================================
// Constants
// ============================================================================

/// Outbound protocol version spoken by this crate.
pub const PROTOCOL_VERSION: u32 = 1;

// ============================================================================
// Decode
// ============================================================================

/// Decodes one inbound frame.
///
/// # Errors
///
/// - [`DecodeError::Syntax`] if the frame is not JSON
/// - [`DecodeError::Shape`] if `content.text` or `content.role` is missing
///   or has the wrong type
/// - [`DecodeError::EmptyText`] if `content.text` is empty
pub fn decode(frame: &str) -> Result<Message, DecodeError> {
    let envelope: WireEnvelope = from_str(frame).map_err(DecodeError::from_json)?;

    if envelope.content.text.is_empty() {
        return Err(DecodeError::EmptyText);
    }

    Ok(Message::from_parts(
        envelope.content.role,
        envelope.content.text,
        envelope.sender.as_deref(),
    ))
}

// ============================================================================
// Encode
// ============================================================================

/// Encodes a message into one outbound frame.
#[must_use]
pub fn encode(message: &Message) -> String {
    json!({
        "sender": message.sender(),
        "content": {
            "text": message.text(),
            "role": message.role().as_str(),
        },
    })
    .to_string()
}

// ============================================================================
// Tests
// ============================================================================
