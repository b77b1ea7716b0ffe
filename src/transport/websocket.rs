//! WebSocket connector and socket event loop.
//!
//! # Event Loop
//!
//! Each transport spawns one tokio task that:
//!
//! - Performs the client handshake (abandoned if a close arrives first)
//! - Forwards inbound text frames as [`TransportEvent::Message`]
//! - Writes outbound frames queued by the manager
//! - Reports errors and closure, as the WebSocket API does
//!   (an error is always followed by a close)

// ============================================================================
// Imports
// ============================================================================

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::Error;

use super::handle::{
    CLOSE_ABNORMAL, CLOSE_NO_STATUS, Connector, ReadyState, Transport, TransportCommand,
    TransportPeer, channel,
};

// ============================================================================
// WebSocketConnector
// ============================================================================

/// Opens transports over real WebSocket connections.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketConnector;

impl Connector for WebSocketConnector {
    fn open(&self, url: &Url) -> Transport {
        let (transport, peer) = channel();
        tokio::spawn(run_socket(url.to_string(), peer));
        transport
    }
}

// ============================================================================
// Event Loop
// ============================================================================

/// Drives one WebSocket connection until it closes.
async fn run_socket(url: String, mut peer: TransportPeer) {
    debug!(%url, "Opening WebSocket");

    let handshake = connect_async(url.as_str());
    tokio::pin!(handshake);

    let ws_stream = loop {
        tokio::select! {
            result = &mut handshake => {
                match result {
                    Ok((stream, _response)) => break stream,
                    Err(e) => {
                        let err = Error::from(e);
                        warn!(%url, error = %err, "WebSocket handshake failed");
                        peer.error(err.to_string());
                        peer.closed(CLOSE_ABNORMAL, "");
                        return;
                    }
                }
            }

            command = peer.commands.recv() => {
                match command {
                    Some(TransportCommand::Send(_)) => {
                        trace!("Dropping write issued before open");
                    }

                    Some(TransportCommand::Close { code, reason }) => {
                        debug!(%url, "Handshake abandoned by close request");
                        peer.closed(code, reason);
                        return;
                    }

                    None => {
                        peer.ready_state().set(ReadyState::Closed);
                        debug!(%url, "Transport dropped during handshake");
                        return;
                    }
                }
            }
        }
    };

    debug!(%url, "WebSocket open");
    peer.open();

    let (mut ws_write, mut ws_read) = ws_stream.split();

    loop {
        tokio::select! {
            // Incoming frames from the relay
            message = ws_read.next() => {
                match message {
                    Some(Ok(WsMessage::Text(text))) => {
                        peer.message(text.as_str());
                    }

                    Some(Ok(WsMessage::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (u16::from(f.code), f.reason.as_str().to_owned()))
                            .unwrap_or((CLOSE_NO_STATUS, String::new()));
                        debug!(code, %reason, "WebSocket closed by remote");
                        peer.closed(code, reason);
                        break;
                    }

                    Some(Err(e)) => {
                        let err = Error::from(e);
                        warn!(error = %err, "WebSocket error");
                        peer.error(err.to_string());
                        peer.closed(CLOSE_ABNORMAL, "");
                        break;
                    }

                    None => {
                        let err = Error::connection("stream ended without a close frame");
                        debug!(error = %err, "WebSocket stream ended");
                        peer.error(err.to_string());
                        peer.closed(CLOSE_ABNORMAL, "");
                        break;
                    }

                    // Binary, ping and pong frames carry no chat messages
                    Some(Ok(_)) => {}
                }
            }

            // Commands from the manager
            command = peer.commands.recv() => {
                match command {
                    Some(TransportCommand::Send(frame)) => {
                        if let Err(e) = ws_write.send(WsMessage::Text(frame.into())).await {
                            let err = Error::from(e);
                            warn!(error = %err, "Failed to write frame");
                            peer.error(err.to_string());
                            peer.closed(CLOSE_ABNORMAL, "");
                            break;
                        }
                    }

                    Some(TransportCommand::Close { code, reason }) => {
                        peer.ready_state().set(ReadyState::Closing);
                        let frame = CloseFrame {
                            code: code.into(),
                            reason: reason.clone().into(),
                        };
                        if let Err(e) = ws_write.send(WsMessage::Close(Some(frame))).await {
                            debug!(error = %e, "Close frame not delivered");
                        }
                        let _ = ws_write.close().await;
                        debug!(code, %reason, "WebSocket closed by client");
                        peer.closed(code, reason);
                        break;
                    }

                    None => {
                        let _ = ws_write.close().await;
                        peer.ready_state().set(ReadyState::Closed);
                        debug!("Transport dropped, socket released");
                        break;
                    }
                }
            }
        }
    }

    debug!(%url, "Socket task terminated");
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use tokio::net::TcpListener;
    use tokio::time::timeout;

    use crate::transport::{CLOSE_NORMAL, TransportEvent};

    const WAIT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_refused_connection_reports_error_then_close() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let url = Url::parse(&format!("ws://127.0.0.1:{port}/ws")).expect("url");
        let mut transport = WebSocketConnector.open(&url);
        let mut events = transport.take_events().expect("events");

        let first = timeout(WAIT, events.recv()).await.expect("no timeout");
        assert!(matches!(first, Some(TransportEvent::Error(_))));

        let second = timeout(WAIT, events.recv()).await.expect("no timeout");
        assert!(matches!(
            second,
            Some(TransportEvent::Close {
                code: CLOSE_ABNORMAL,
                ..
            })
        ));
        assert_eq!(transport.ready_state(), ReadyState::Closed);
    }

    #[tokio::test]
    async fn test_echo_and_client_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = tokio_tungstenite::accept_async(stream)
                .await
                .expect("upgrade");
            while let Some(Ok(msg)) = ws.next().await {
                if msg.is_text() && ws.send(msg).await.is_err() {
                    break;
                }
            }
        });

        let url = Url::parse(&format!("ws://127.0.0.1:{port}/ws")).expect("url");
        let mut transport = WebSocketConnector.open(&url);
        let mut events = transport.take_events().expect("events");

        let opened = timeout(WAIT, events.recv()).await.expect("no timeout");
        assert_eq!(opened, Some(TransportEvent::Open));
        assert_eq!(transport.ready_state(), ReadyState::Open);

        transport.write("ping".into()).expect("write");
        let echoed = timeout(WAIT, events.recv()).await.expect("no timeout");
        assert_eq!(echoed, Some(TransportEvent::Message("ping".into())));

        transport.close(CLOSE_NORMAL, "done").expect("close");
        let closed = timeout(WAIT, events.recv()).await.expect("no timeout");
        assert_eq!(
            closed,
            Some(TransportEvent::Close {
                code: CLOSE_NORMAL,
                reason: "done".into(),
            })
        );
        assert_eq!(transport.ready_state(), ReadyState::Closed);
    }
}
