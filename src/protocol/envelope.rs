//! Wire envelope.
//!
//! The structured JSON representation of a message on the socket.
//!
//! # Format
//!
//! ```json
//! {
//!   "sender": "P1",
//!   "content": { "text": "Hello from P1", "role": "USER" }
//! }
//! ```
//!
//! `sender` may be absent or `null`; relay-generated notices omit it.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use super::message::Role;

// ============================================================================
// WireEnvelope
// ============================================================================

/// A message as it travels over the socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEnvelope {
    /// Display name of the sender, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,

    /// Payload and classification.
    pub content: WireContent,
}

/// The `content` object of a [`WireEnvelope`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireContent {
    /// Message text.
    pub text: String,

    /// Origin classification.
    pub role: Role,
}

// ============================================================================
// Tests
// ============================================================================
