//! Error types for the relay chat client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! Fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use relay_chat_client::{ConnectionManager, Message, Result};
//!
//! fn example() -> Result<()> {
//!     let manager = ConnectionManager::builder()
//!         .endpoint("ws://localhost:12345/ws")
//!         .build()?;
//!     manager.start();
//!     manager.send(&Message::user("P1", "hello")?);
//!     Ok(())
//! }
//! ```
//!
//! Transport failures are never returned from these operations. They are
//! reported through the status register instead.
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidUrl`] |
//! | Usage | [`Error::InvalidArgument`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionClosed`] |
//! | External | [`Error::WebSocket`], [`Error::Io`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use serde_json::error::Category;
use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned by [`ClientBuilder::build`](crate::ClientBuilder::build)
    /// when an option is out of range.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Endpoint is not a usable WebSocket URL.
    #[error("Invalid WebSocket URL '{url}': {reason}")]
    InvalidUrl {
        /// The rejected URL as given.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    // ========================================================================
    // Usage Errors
    // ========================================================================
    /// Invalid argument.
    ///
    /// Returned when a [`Message`](crate::Message) would violate its
    /// invariants, e.g. empty text.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// WebSocket connection closed.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),
}

// ============================================================================
// DecodeError
// ============================================================================

/// Reason an inbound frame was rejected by the codec.
///
/// Decode failures are per-frame: the frame is dropped and the stream
/// continues. They are returned by [`decode`](crate::protocol::decode) and
/// never wrapped in [`enum@Error`].
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Frame is not well-formed JSON.
    #[error("frame is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    /// Frame is JSON but not an envelope (missing or mistyped fields).
    #[error("frame is not a message envelope: {0}")]
    Shape(#[source] serde_json::Error),

    /// `content.text` is present but empty.
    #[error("message text is empty")]
    EmptyText,
}

impl DecodeError {
    /// Classifies a serde error as a syntax or shape failure.
    #[must_use]
    pub fn from_json(err: serde_json::Error) -> Self {
        match err.classify() {
            Category::Syntax | Category::Eof | Category::Io => Self::Syntax(err),
            Category::Data => Self::Shape(err),
        }
    }
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid URL error.
    #[inline]
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::ConnectionClosed | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error came from caller-supplied configuration.
    #[inline]
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::InvalidUrl { .. } | Self::InvalidArgument { .. }
        )
    }

    /// Returns `true` if this error may go away by connecting again.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::ConnectionClosed | Self::WebSocket(_) | Self::Io(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
