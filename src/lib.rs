//! Relay chat client - WebSocket client for a broadcast chat relay.
//!
//! This library keeps one WebSocket connection to a chat relay, tracks
//! whether it is usable, and records every message the relay broadcasts.
//!
//! # Architecture
//!
//! The relay is a fan-out hub:
//!
//! - **Client (Rust)**: Sends one JSON envelope per message, logs every
//!   envelope received
//! - **Relay (remote)**: Broadcasts each envelope to all connected clients,
//!   including the sender, and announces joins and leaves as system messages
//!
//! Key design principles:
//!
//! - One [`ConnectionManager`] owns at most one transport
//! - All operations return immediately; outcomes land in [`Status`]
//! - The message log is append-only, in arrival order
//! - Undecodable frames are dropped without ending the stream
//!
//! # Quick Start
//!
//! ```no_run
//! use relay_chat_client::{ConnectionManager, Message, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let manager = ConnectionManager::builder()
//!         .endpoint("ws://localhost:12345/ws")
//!         .build()?;
//!
//!     let mut messages = manager.subscribe();
//!     manager.start();
//!     manager.watch_status().wait_for(|s| s.ready).await.ok();
//!
//!     manager.send(&Message::user("P1", "Hello from P1")?);
//!
//!     if let Ok(echo) = messages.recv().await {
//!         println!("{echo}");
//!     }
//!
//!     manager.stop();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`ConnectionManager`], configuration, reconnection |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Message model and wire codec |
//! | [`transport`] | WebSocket transport layer |

// ============================================================================
// Modules
// ============================================================================

/// Connection manager and configuration.
///
/// Use [`ConnectionManager::builder()`] to create a configured manager.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Chat message model and JSON wire codec.
pub mod protocol;

/// WebSocket transport layer.
///
/// Exposes the [`Connector`](transport::Connector) seam for hosts that
/// bring their own I/O.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{
    ClientBuilder, ClientOptions, ConnectionManager, ConnectionState, ReconnectPolicy,
    Reconnector, Status,
};

// Error types
pub use error::{DecodeError, Error, Result};

// Identifier types
pub use identifiers::{ClientId, Generation};

// Protocol types
pub use protocol::{Message, Role};
