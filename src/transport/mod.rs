//! Transport layer.
//!
//! This module owns the duplex connection to the relay. The manager talks to
//! a [`Transport`] handle; a [`Connector`] decides what sits behind it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐                          ┌─────────────────┐
//! │  ConnectionManager   │                          │  Chat relay     │
//! │                      │        WebSocket         │                 │
//! │  Transport ◄─► task  │◄────────────────────────►│  /ws            │
//! │                      │   one text frame/message │                 │
//! └──────────────────────┘                          └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Connector::open` - Returns a [`Transport`] in `Connecting`
//! 2. Socket task completes the handshake, raises `Open`
//! 3. Text frames raise `Message`; writes go through `Transport::write`
//! 4. Failures raise `Error` followed by `Close`
//! 5. `Transport::close` or dropping the handle ends the task
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `channel` | In-process connector |
//! | `handle` | Transport handle, events, commands |
//! | `websocket` | WebSocket connector and event loop |

// ============================================================================
// Submodules
// ============================================================================

/// In-process connector.
pub mod channel;

/// Transport handle and peer.
pub mod handle;

/// WebSocket connector and event loop.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use channel::ChannelConnector;
pub use handle::{
    CLOSE_ABNORMAL, CLOSE_NO_STATUS, CLOSE_NORMAL, Connector, ReadyState, SharedReadyState,
    Transport, TransportCommand, TransportEvent, TransportPeer,
};
pub use websocket::WebSocketConnector;
