//! Internal message model.
//!
//! [`Message`] is what consumers read from the log and pass to `send`.
//! Its fields are private so the invariants hold for every value:
//!
//! - `text` is non-empty
//! - `sender` is trimmed and non-empty, `"System"` when none was given

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, Error, Result};

use super::codec;

// ============================================================================
// Constants
// ============================================================================

/// Sender substituted when a message has no usable sender.
pub const SYSTEM_SENDER: &str = "System";

// ============================================================================
// Role
// ============================================================================

/// Origin classification of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Written by a chat participant.
    User,
    /// Emitted by the relay itself (joins, leaves, notices).
    System,
}

impl Role {
    /// Returns the wire name of the role.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::System => "SYSTEM",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Message
// ============================================================================

/// A chat message as seen by consumers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message {
    role: Role,
    text: String,
    sender: String,
}

impl Message {
    /// Creates a message, normalizing the sender.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `text` is empty.
    pub fn new(role: Role, text: impl Into<String>, sender: Option<&str>) -> Result<Self> {
        let text = text.into();
        if text.is_empty() {
            return Err(Error::invalid_argument("message text must not be empty"));
        }

        Ok(Self::from_parts(role, text, sender))
    }

    /// Creates a [`Role::User`] message from `sender`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `text` is empty.
    pub fn user(sender: &str, text: impl Into<String>) -> Result<Self> {
        Self::new(Role::User, text, Some(sender))
    }

    /// Creates a [`Role::System`] message attributed to `"System"`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `text` is empty.
    pub fn system(text: impl Into<String>) -> Result<Self> {
        Self::new(Role::System, text, None)
    }

    /// Builds a message from already-validated text.
    pub(crate) fn from_parts(role: Role, text: String, sender: Option<&str>) -> Self {
        Self {
            role,
            text,
            sender: normalize_sender(sender),
        }
    }

    /// Origin classification.
    #[inline]
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Message payload.
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Display name of the sender.
    #[inline]
    #[must_use]
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Returns `true` for relay-generated messages.
    #[inline]
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.role == Role::System
    }
}

impl FromStr for Message {
    type Err = DecodeError;

    fn from_str(frame: &str) -> std::result::Result<Self, Self::Err> {
        codec::decode(frame)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.sender, self.text)
    }
}

/// Trims the sender, falling back to [`SYSTEM_SENDER`] when blank.
#[must_use]
pub fn normalize_sender(sender: Option<&str>) -> String {
    match sender.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_owned(),
        _ => SYSTEM_SENDER.to_owned(),
    }
}

// ============================================================================
// Tests
// ============================================================================
