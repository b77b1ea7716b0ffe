//! Transport handle and its I/O peer.
//!
//! A transport is a pair of channels plus a shared ready state:
//!
//! ```text
//! ┌────────────────────┐   TransportCommand    ┌────────────────────┐
//! │  Transport         │ ────────────────────► │  TransportPeer     │
//! │  (manager side)    │                       │  (socket task)     │
//! │                    │ ◄──────────────────── │                    │
//! └────────────────────┘    TransportEvent     └────────────────────┘
//!            └──────────── SharedReadyState ───────────┘
//! ```
//!
//! The manager owns the [`Transport`]. A [`Connector`] owns the peer and
//! drives it from a socket (see [`WebSocketConnector`](super::WebSocketConnector)).

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::mpsc;
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Close code for a normal, requested closure.
pub const CLOSE_NORMAL: u16 = 1000;

/// Close code for a close frame that carried no status.
pub const CLOSE_NO_STATUS: u16 = 1005;

/// Close code for a connection that dropped without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;

// ============================================================================
// ReadyState
// ============================================================================

/// Lifecycle state of one transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReadyState {
    /// Handshake in progress.
    Connecting = 0,
    /// Frames may be written.
    Open = 1,
    /// Close requested, not yet finished.
    Closing = 2,
    /// No further frames in either direction.
    Closed = 3,
}

impl ReadyState {
    #[inline]
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Open,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// Ready state shared between a [`Transport`] and its peer.
#[derive(Debug, Clone)]
pub struct SharedReadyState(Arc<AtomicU8>);

impl SharedReadyState {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(ReadyState::Connecting as u8)))
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn get(&self) -> ReadyState {
        ReadyState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Sets the current state.
    #[inline]
    pub fn set(&self, state: ReadyState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

// ============================================================================
// TransportEvent / TransportCommand
// ============================================================================

/// Lifecycle event raised by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake completed.
    Open,
    /// A text frame arrived.
    Message(String),
    /// A transport-level failure occurred.
    Error(String),
    /// The connection is closed.
    Close {
        /// WebSocket close code.
        code: u16,
        /// Human-readable close reason.
        reason: String,
    },
}

/// Instruction from the manager to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCommand {
    /// Write one text frame.
    Send(String),
    /// Close the connection.
    Close {
        /// WebSocket close code.
        code: u16,
        /// Human-readable close reason.
        reason: String,
    },
}

// ============================================================================
// Transport
// ============================================================================

/// Manager-side handle to one connection.
///
/// Dropping the handle closes the command channel, which the peer treats as
/// an abandoned connection.
pub struct Transport {
    command_tx: mpsc::UnboundedSender<TransportCommand>,
    events: Option<mpsc::UnboundedReceiver<TransportEvent>>,
    ready_state: SharedReadyState,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("ready_state", &self.ready_state.get())
            .field("events_taken", &self.events.is_none())
            .finish_non_exhaustive()
    }
}

impl Transport {
    /// Returns the current ready state.
    #[inline]
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        self.ready_state.get()
    }

    /// Takes the event receiver. Returns `None` after the first call.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<TransportEvent>> {
        self.events.take()
    }

    /// Queues one text frame for writing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the peer has gone away.
    pub fn write(&self, frame: String) -> Result<()> {
        self.command_tx
            .send(TransportCommand::Send(frame))
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Requests a close with the given code and reason.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the peer has gone away.
    pub fn close(&self, code: u16, reason: impl Into<String>) -> Result<()> {
        self.command_tx
            .send(TransportCommand::Close {
                code,
                reason: reason.into(),
            })
            .map_err(|_| Error::ConnectionClosed)
    }
}

// ============================================================================
// TransportPeer
// ============================================================================

/// I/O side of a transport, driven by a socket task or a test.
pub struct TransportPeer {
    /// Commands from the manager.
    pub commands: mpsc::UnboundedReceiver<TransportCommand>,
    event_tx: mpsc::UnboundedSender<TransportEvent>,
    ready_state: SharedReadyState,
}

impl fmt::Debug for TransportPeer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportPeer")
            .field("ready_state", &self.ready_state.get())
            .finish_non_exhaustive()
    }
}

impl TransportPeer {
    /// Raises an event to the manager.
    ///
    /// Returns `false` if the manager side has been dropped.
    pub fn emit(&self, event: TransportEvent) -> bool {
        self.event_tx.send(event).is_ok()
    }

    /// Returns the shared ready state.
    #[inline]
    #[must_use]
    pub fn ready_state(&self) -> &SharedReadyState {
        &self.ready_state
    }

    /// Marks the transport open and raises [`TransportEvent::Open`].
    pub fn open(&self) {
        self.ready_state.set(ReadyState::Open);
        self.emit(TransportEvent::Open);
    }

    /// Raises a text frame.
    pub fn message(&self, frame: impl Into<String>) {
        self.emit(TransportEvent::Message(frame.into()));
    }

    /// Raises a transport failure. The ready state is left to the caller.
    pub fn error(&self, description: impl Into<String>) {
        self.emit(TransportEvent::Error(description.into()));
    }

    /// Marks the transport closed and raises [`TransportEvent::Close`].
    pub fn closed(&self, code: u16, reason: impl Into<String>) {
        self.ready_state.set(ReadyState::Closed);
        self.emit(TransportEvent::Close {
            code,
            reason: reason.into(),
        });
    }
}

/// Creates a connected [`Transport`] / [`TransportPeer`] pair in the
/// [`ReadyState::Connecting`] state.
#[must_use]
pub fn channel() -> (Transport, TransportPeer) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let ready_state = SharedReadyState::new();

    let transport = Transport {
        command_tx,
        events: Some(event_rx),
        ready_state: ready_state.clone(),
    };

    let peer = TransportPeer {
        commands: command_rx,
        event_tx,
        ready_state,
    };

    (transport, peer)
}

// ============================================================================
// Connector
// ============================================================================

/// Opens transports.
///
/// `open` must return immediately; the handshake runs in the background and
/// its outcome arrives as [`TransportEvent`]s.
pub trait Connector: Send + Sync + 'static {
    /// Starts opening a connection to `url`.
    fn open(&self, url: &Url) -> Transport;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pair_is_connecting() {
        let (transport, peer) = channel();
        assert_eq!(transport.ready_state(), ReadyState::Connecting);
        assert_eq!(peer.ready_state().get(), ReadyState::Connecting);
    }

    #[test]
    fn test_ready_state_is_shared() {
        let (transport, peer) = channel();
        peer.open();
        assert_eq!(transport.ready_state(), ReadyState::Open);
        peer.closed(CLOSE_NORMAL, "bye");
        assert_eq!(transport.ready_state(), ReadyState::Closed);
    }

    #[test]
    fn test_events_delivered_in_order() {
        let (mut transport, peer) = channel();
        let mut events = transport.take_events().expect("first take");
        assert!(transport.take_events().is_none());

        peer.open();
        peer.message("a");
        peer.error("reset");
        peer.closed(CLOSE_ABNORMAL, "");

        assert_eq!(events.try_recv(), Ok(TransportEvent::Open));
        assert_eq!(events.try_recv(), Ok(TransportEvent::Message("a".into())));
        assert_eq!(events.try_recv(), Ok(TransportEvent::Error("reset".into())));
        assert_eq!(
            events.try_recv(),
            Ok(TransportEvent::Close {
                code: CLOSE_ABNORMAL,
                reason: String::new(),
            })
        );
    }

    #[test]
    fn test_commands_reach_peer() {
        let (transport, mut peer) = channel();
        transport.write("frame".into()).expect("write");
        transport.close(CLOSE_NORMAL, "done").expect("close");

        assert_eq!(
            peer.commands.try_recv(),
            Ok(TransportCommand::Send("frame".into()))
        );
        assert_eq!(
            peer.commands.try_recv(),
            Ok(TransportCommand::Close {
                code: CLOSE_NORMAL,
                reason: "done".into(),
            })
        );
    }

    #[test]
    fn test_write_after_peer_dropped() {
        let (transport, peer) = channel();
        drop(peer);
        assert!(matches!(
            transport.write("x".into()),
            Err(Error::ConnectionClosed)
        ));
    }

    #[test]
    fn test_emit_after_transport_dropped() {
        let (transport, peer) = channel();
        drop(transport);
        assert!(!peer.emit(TransportEvent::Open));
    }
}
