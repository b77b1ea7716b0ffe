//! Chat protocol types.
//!
//! This module defines the internal message model, its wire envelope, and
//! the codec between them.
//!
//! # Protocol Overview
//!
//! | Direction | Frame | Notes |
//! |-----------|-------|-------|
//! | Relay → Client | [`WireEnvelope`] JSON | `sender` optional |
//! | Client → Relay | [`WireEnvelope`] JSON | protocol version 1, no ack |
//!
//! One text frame carries exactly one message in each direction.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `codec` | Frame encode/decode |
//! | `envelope` | Wire representation |
//! | `message` | Consumer-facing [`Message`] and [`Role`] |

// ============================================================================
// Submodules
// ============================================================================

/// Frame encode/decode.
pub mod codec;

/// Wire envelope types.
pub mod envelope;

/// Consumer-facing message model.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use codec::{PROTOCOL_VERSION, decode, encode};
pub use envelope::{WireContent, WireEnvelope};
pub use message::{Message, Role, SYSTEM_SENDER, normalize_sender};
