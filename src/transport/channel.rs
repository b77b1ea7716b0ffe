//! In-process connector.
//!
//! Hands the peer side of every opened transport to the caller instead of a
//! socket. Useful for hosts that bring their own I/O, and for tests that
//! script lifecycle events by hand.

// ============================================================================
// Imports
// ============================================================================

use tokio::sync::mpsc;
use tracing::warn;
use url::Url;

use super::handle::{CLOSE_ABNORMAL, Connector, Transport, TransportPeer, channel};

// ============================================================================
// ChannelConnector
// ============================================================================

/// Connector that delivers each [`TransportPeer`] over a channel.
#[derive(Debug, Clone)]
pub struct ChannelConnector {
    peers: mpsc::UnboundedSender<(Url, TransportPeer)>,
}

impl ChannelConnector {
    /// Creates a connector and the receiver of its peers.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(Url, TransportPeer)>) {
        let (peers, rx) = mpsc::unbounded_channel();
        (Self { peers }, rx)
    }
}

impl Connector for ChannelConnector {
    fn open(&self, url: &Url) -> Transport {
        let (transport, peer) = channel();

        if let Err(mpsc::error::SendError((url, peer))) = self.peers.send((url.clone(), peer)) {
            // Nobody will ever drive this peer
            warn!(%url, "No receiver for opened transport");
            peer.closed(CLOSE_ABNORMAL, "no peer receiver");
        }

        transport
    }
}

// ============================================================================
// Tests
// ============================================================================
