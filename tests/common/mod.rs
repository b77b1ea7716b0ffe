//! In-process chat relay for integration tests.
//!
//! Mirrors the production relay: every text frame a client sends is
//! rebroadcast verbatim to every connected client, sender included.
//! Optionally announces joins to the other clients as system messages.

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use relay_chat_client::{ConnectionManager, Status};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

/// Upper bound for any wait in a test.
pub const WAIT: Duration = Duration::from_secs(5);

/// Join announcement sent to the other clients.
pub const JOIN_FRAME: &str =
    r#"{"content":{"text":"A new client has connected.","role":"SYSTEM"}}"#;

// ============================================================================
// Relay
// ============================================================================

type Clients = Arc<Mutex<Vec<(u64, mpsc::UnboundedSender<String>)>>>;

/// Broadcast relay bound to an ephemeral local port.
pub struct Relay {
    addr: SocketAddr,
    clients: Clients,
    accept: JoinHandle<()>,
}

impl Relay {
    /// Starts a relay without join announcements.
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(false).await
    }

    /// Starts a relay; `announce_joins` sends [`JOIN_FRAME`] to existing
    /// clients whenever a new one connects.
    pub async fn start_with(announce_joins: bool) -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let clients: Clients = Arc::default();

        let accept = tokio::spawn(accept_loop(listener, Arc::clone(&clients), announce_joins));

        Ok(Self {
            addr,
            clients,
            accept,
        })
    }

    /// Returns the `ws://` URL of the relay endpoint.
    pub fn url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Sends a raw frame to every client.
    pub fn inject(&self, frame: &str) {
        broadcast(&self.clients, frame, None);
    }

    /// Returns the number of registered clients.
    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        self.accept.abort();
    }
}

fn broadcast(clients: &Clients, frame: &str, skip: Option<u64>) {
    clients.lock().retain(|(id, tx)| {
        if Some(*id) == skip {
            return true;
        }
        tx.send(frame.to_owned()).is_ok()
    });
}

async fn accept_loop(listener: TcpListener, clients: Clients, announce_joins: bool) {
    let mut next_id = 0u64;

    while let Ok((stream, _)) = listener.accept().await {
        next_id += 1;
        let id = next_id;

        // Registered before the handshake so no broadcast is missed once
        // the client sees its connection open
        let (tx, rx) = mpsc::unbounded_channel();
        clients.lock().push((id, tx));
        if announce_joins {
            broadcast(&clients, JOIN_FRAME, Some(id));
        }

        tokio::spawn(serve(stream, id, rx, Arc::clone(&clients)));
    }
}

async fn serve(
    stream: TcpStream,
    id: u64,
    mut outbound: mpsc::UnboundedReceiver<String>,
    clients: Clients,
) {
    let Ok(ws) = accept_async(stream).await else {
        clients.lock().retain(|(client, _)| *client != id);
        return;
    };
    let (mut sink, mut source) = ws.split();

    loop {
        tokio::select! {
            frame = source.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => broadcast(&clients, text.as_str(), None),
                Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            frame = outbound.recv() => match frame {
                Some(frame) => {
                    if sink.send(WsMessage::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    clients.lock().retain(|(client, _)| *client != id);
    let _ = sink.close().await;
}

// ============================================================================
// Helpers
// ============================================================================

/// Installs a test subscriber honoring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Builds a manager pointed at `url`.
pub fn manager(url: &str) -> anyhow::Result<ConnectionManager> {
    Ok(ConnectionManager::builder().endpoint(url).build()?)
}

/// Waits until the manager's status satisfies `pred`.
pub async fn wait_status(
    manager: &ConnectionManager,
    pred: impl FnMut(&Status) -> bool,
) -> anyhow::Result<()> {
    let mut rx = manager.watch_status();
    timeout(WAIT, rx.wait_for(pred)).await??;
    Ok(())
}

/// Waits until the manager has logged at least `count` messages.
pub async fn wait_messages(manager: &ConnectionManager, count: usize) -> anyhow::Result<()> {
    timeout(WAIT, async {
        while manager.message_count() < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await?;
    Ok(())
}
