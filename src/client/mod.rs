//! Relay chat client.
//!
//! This module provides the connection manager consumed by a chat UI.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ConnectionManager`] | Owns the connection, status and message log |
//! | [`ClientBuilder`] | Fluent configuration builder |
//! | [`ClientOptions`] | Validated configuration |
//! | [`Status`] | `ready` / `has_error` flags |
//! | [`ConnectionState`] | Connection lifecycle |
//! | [`Reconnector`] | Optional automatic reconnection |
//!
//! # Example
//!
//! ```no_run
//! use relay_chat_client::{ConnectionManager, Message, Result};
//!
//! # async fn example() -> Result<()> {
//! let manager = ConnectionManager::builder()
//!     .endpoint("ws://localhost:12345/ws")
//!     .build()?;
//!
//! let mut messages = manager.subscribe();
//! manager.start();
//!
//! while let Ok(message) = messages.recv().await {
//!     println!("{message}");
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for client configuration.
pub mod builder;

/// Connection manager implementation.
pub mod core;

/// Client options and endpoint validation.
pub mod options;

/// Automatic reconnection with backoff.
pub mod reconnect;

/// Status register and connection state.
pub mod status;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ClientBuilder;
pub use core::{ConnectionManager, TEARDOWN_CLOSE_CODE, TEARDOWN_REASON};
pub use options::{ClientOptions, DEFAULT_ENDPOINT, DEFAULT_MESSAGE_BUFFER};
pub use reconnect::{ReconnectPolicy, Reconnector};
pub use status::{ConnectionState, Status};
