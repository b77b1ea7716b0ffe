//! Connection manager.
//!
//! The [`ConnectionManager`] owns the relay connection, the status register
//! and the message log.
//!
//! # Event Dispatch
//!
//! Every `connect()` bumps a [`Generation`] and spawns one driver task that
//! applies the transport's lifecycle events in delivery order:
//!
//! | Event | Effect |
//! |-------|--------|
//! | open | `ready = true` |
//! | message | decode, append to log (undecodable frames are dropped) |
//! | error | `has_error = true` |
//! | close | `ready = false` |
//!
//! Each event is applied under one lock and published to observers before
//! the driver takes the next one. Events from a replaced transport are
//! ignored.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::Result;
use crate::identifiers::{ClientId, Generation};
use crate::protocol::{Message, decode, encode};
use crate::transport::{CLOSE_NORMAL, Connector, ReadyState, Transport, TransportEvent};

use super::builder::ClientBuilder;
use super::options::{ClientOptions, parse_endpoint};
use super::status::{ConnectionState, Status};

// ============================================================================
// Constants
// ============================================================================

/// Close code sent by [`ConnectionManager::teardown`].
pub const TEARDOWN_CLOSE_CODE: u16 = CLOSE_NORMAL;

/// Close reason sent by [`ConnectionManager::teardown`].
pub const TEARDOWN_REASON: &str = "client teardown";

// ============================================================================
// State
// ============================================================================

/// Mutable manager state. Only touched under [`Shared::state`].
#[derive(Default)]
struct State {
    /// Generation of the most recent `connect()`.
    generation: Generation,
    /// Current transport. `None` before the first connect and after teardown.
    transport: Option<Transport>,
    /// Driver task of the current transport.
    driver: Option<JoinHandle<()>>,
    /// URL of the most recent `connect()`.
    url: Option<Url>,
    connection: ConnectionState,
    status: Status,
    log: Vec<Message>,
}

/// State shared between the manager and its driver tasks.
struct Shared {
    client_id: ClientId,
    state: Mutex<State>,
    status_tx: watch::Sender<Status>,
    connection_tx: watch::Sender<ConnectionState>,
    message_tx: broadcast::Sender<Message>,
}

impl Shared {
    /// Publishes status and connection state to watchers.
    fn publish(&self, state: &State) {
        let status = state.status;
        self.status_tx.send_if_modified(|current| {
            let changed = *current != status;
            *current = status;
            changed
        });

        let connection = state.connection;
        self.connection_tx.send_if_modified(|current| {
            let changed = *current != connection;
            *current = connection;
            changed
        });
    }

    /// Applies one lifecycle event of transport `generation`.
    fn apply(&self, generation: Generation, event: TransportEvent) {
        let mut state = self.state.lock();

        if state.generation != generation {
            trace!(
                client_id = %self.client_id,
                %generation,
                current = %state.generation,
                "Ignoring event from replaced transport"
            );
            return;
        }

        match event {
            TransportEvent::Open => self.on_open(&mut state),
            TransportEvent::Message(frame) => self.on_message(&mut state, &frame),
            TransportEvent::Error(description) => self.on_error(&mut state, &description),
            TransportEvent::Close { code, reason } => self.on_close(&mut state, code, &reason),
        }
    }

    fn on_open(&self, state: &mut State) {
        // Torn down before the handshake finished
        if state.transport.is_none() {
            trace!(client_id = %self.client_id, "Ignoring open after teardown");
            return;
        }

        state.status.ready = true;
        state.connection = ConnectionState::Open;
        self.publish(state);

        info!(client_id = %self.client_id, generation = %state.generation, "Connection open");
    }

    fn on_message(&self, state: &mut State, frame: &str) {
        match decode(frame) {
            Ok(message) => {
                trace!(client_id = %self.client_id, sender = message.sender(), "Message received");
                state.log.push(message.clone());
                // No subscribers is fine
                let _ = self.message_tx.send(message);
            }
            Err(e) => {
                warn!(
                    client_id = %self.client_id,
                    error = %e,
                    frame = %frame,
                    "Dropping undecodable frame"
                );
            }
        }
    }

    fn on_error(&self, state: &mut State, description: &str) {
        state.status.has_error = true;
        self.publish(state);

        warn!(client_id = %self.client_id, error = %description, "Transport error");
    }

    fn on_close(&self, state: &mut State, code: u16, reason: &str) {
        state.status.ready = false;
        state.connection = ConnectionState::Closed;
        self.publish(state);

        debug!(client_id = %self.client_id, code, %reason, "Connection closed");
    }
}

/// Applies events of one transport until it stops raising them.
async fn drive(
    shared: Arc<Shared>,
    generation: Generation,
    mut events: mpsc::UnboundedReceiver<TransportEvent>,
) {
    while let Some(event) = events.recv().await {
        shared.apply(generation, event);
    }

    trace!(client_id = %shared.client_id, %generation, "Driver finished");
}

// ============================================================================
// ConnectionManager
// ============================================================================

/// Client-side connection to a chat relay.
///
/// Holds at most one transport at a time. All operations return
/// immediately; outcomes are observed through [`status`](Self::status),
/// [`watch_status`](Self::watch_status) and the message log.
///
/// `connect`, `start` and `send` must be called from within a tokio
/// runtime. Dropping the manager tears the connection down.
///
/// # Example
///
/// ```no_run
/// use relay_chat_client::{ConnectionManager, Message};
///
/// # async fn example() -> relay_chat_client::Result<()> {
/// let manager = ConnectionManager::builder().build()?;
/// manager.start();
///
/// let mut status = manager.watch_status();
/// status.wait_for(|s| s.ready).await.ok();
///
/// manager.send(&Message::user("P1", "Hello from P1")?);
/// manager.stop();
/// # Ok(())
/// # }
/// ```
pub struct ConnectionManager {
    shared: Arc<Shared>,
    connector: Box<dyn Connector>,
    options: ClientOptions,
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("ConnectionManager")
            .field("client_id", &self.shared.client_id)
            .field("generation", &state.generation)
            .field("connection", &state.connection)
            .field("status", &state.status)
            .field("messages", &state.log.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ConnectionManager - Constructor
// ============================================================================

impl ConnectionManager {
    /// Creates a builder for configuring a manager.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates a manager from validated options.
    pub(crate) fn new(options: ClientOptions, connector: Box<dyn Connector>) -> Self {
        let (status_tx, _) = watch::channel(Status::default());
        let (connection_tx, _) = watch::channel(ConnectionState::default());
        let (message_tx, _) = broadcast::channel(options.message_buffer);

        let client_id = ClientId::generate();
        debug!(%client_id, endpoint = %options.endpoint, "Connection manager created");

        Self {
            shared: Arc::new(Shared {
                client_id,
                state: Mutex::new(State::default()),
                status_tx,
                connection_tx,
                message_tx,
            }),
            connector,
            options,
        }
    }
}

// ============================================================================
// ConnectionManager - Lifecycle
// ============================================================================

impl ConnectionManager {
    /// Connects to the configured endpoint. Host "mount" hook.
    pub fn start(&self) {
        self.open(self.options.endpoint.clone());
    }

    /// Tears the connection down. Host "unmount" hook.
    pub fn stop(&self) {
        self.teardown();
    }

    /// Opens a new transport to `url`, discarding the current one.
    ///
    /// Resets `ready` and `has_error`. Success or failure is reported through
    /// the status register, not the return value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`](crate::Error::InvalidUrl) if `url` is not
    /// a `ws`/`wss` URL. Nothing changes in that case.
    pub fn connect(&self, url: &str) -> Result<()> {
        let url = parse_endpoint(url)?;
        self.open(url);
        Ok(())
    }

    /// Connects again to the URL of the most recent `connect()`.
    ///
    /// Returns `false` if there has been no `connect()` yet.
    pub fn reconnect(&self) -> bool {
        let Some(url) = self.current_url() else {
            return false;
        };
        self.open(url);
        true
    }

    fn open(&self, url: Url) {
        let mut state = self.shared.state.lock();

        // No drain: the old socket task sees its handle dropped and exits
        if state.transport.take().is_some() {
            debug!(client_id = %self.shared.client_id, "Discarding previous transport");
        }
        if let Some(driver) = state.driver.take() {
            driver.abort();
        }

        let generation = state.generation.next();
        state.generation = generation;
        state.status = Status::RESET;
        state.connection = ConnectionState::Connecting;

        let mut transport = self.connector.open(&url);
        if let Some(events) = transport.take_events() {
            state.driver = Some(tokio::spawn(drive(
                Arc::clone(&self.shared),
                generation,
                events,
            )));
        }

        debug!(client_id = %self.shared.client_id, %generation, %url, "Connecting");

        state.transport = Some(transport);
        state.url = Some(url);
        self.shared.publish(&state);
    }

    /// Writes `message` to the relay if the connection is open.
    ///
    /// Best effort: when there is no transport, or it has not opened, or it
    /// has closed, the message is dropped. Nothing is queued.
    pub fn send(&self, message: &Message) {
        let state = self.shared.state.lock();

        let Some(transport) = state.transport.as_ref() else {
            trace!(client_id = %self.shared.client_id, "Send ignored: no transport");
            return;
        };

        if !state.status.ready || transport.ready_state() != ReadyState::Open {
            trace!(
                client_id = %self.shared.client_id,
                ready_state = ?transport.ready_state(),
                "Send ignored: transport not open"
            );
            return;
        }

        let frame = encode(message);
        trace!(client_id = %self.shared.client_id, payload = %frame, "Sending frame");

        if let Err(e) = transport.write(frame) {
            debug!(client_id = %self.shared.client_id, error = %e, "Send dropped");
        }
    }

    /// Closes and releases the current transport.
    ///
    /// Sends close code 1000 with reason [`TEARDOWN_REASON`]. Safe to call
    /// repeatedly; only the first call after a `connect()` closes anything.
    pub fn teardown(&self) {
        let mut state = self.shared.state.lock();

        let Some(transport) = state.transport.take() else {
            return;
        };

        if let Err(e) = transport.close(TEARDOWN_CLOSE_CODE, TEARDOWN_REASON) {
            debug!(client_id = %self.shared.client_id, error = %e, "Transport already gone");
        }
        drop(transport);

        state.connection = ConnectionState::Closed;
        self.shared.publish(&state);

        info!(
            client_id = %self.shared.client_id,
            generation = %state.generation,
            "Connection torn down"
        );
    }
}

// ============================================================================
// ConnectionManager - Accessors
// ============================================================================

impl ConnectionManager {
    /// Returns this manager's id.
    #[inline]
    #[must_use]
    pub fn client_id(&self) -> ClientId {
        self.shared.client_id
    }

    /// Returns the validated configuration.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Returns the URL of the most recent `connect()`.
    #[must_use]
    pub fn current_url(&self) -> Option<Url> {
        self.shared.state.lock().url.clone()
    }

    /// Returns `true` while a transport is held (not torn down).
    #[must_use]
    pub fn has_transport(&self) -> bool {
        self.shared.state.lock().transport.is_some()
    }

    /// Returns a snapshot of the status register.
    #[must_use]
    pub fn status(&self) -> Status {
        self.shared.state.lock().status
    }

    /// Returns `true` while the connection is open.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.status().ready
    }

    /// Returns `true` if the current connection reported an error.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.status().has_error
    }

    /// Returns the connection lifecycle state.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.shared.state.lock().connection
    }

    /// Subscribes to status changes.
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<Status> {
        self.shared.status_tx.subscribe()
    }

    /// Subscribes to connection state changes.
    #[must_use]
    pub fn watch_connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.connection_tx.subscribe()
    }

    /// Subscribes to messages appended from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.shared.message_tx.subscribe()
    }

    /// Returns a copy of the message log, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.shared.state.lock().log.clone()
    }

    /// Runs `f` over a snapshot of the message log.
    ///
    /// The lock is released before `f` runs, so `f` may call back into the
    /// manager.
    pub fn with_messages<R>(&self, f: impl FnOnce(&[Message]) -> R) -> R {
        let log = self.messages();
        f(&log)
    }

    /// Returns the number of logged messages.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.shared.state.lock().log.len()
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.teardown();
        if let Some(driver) = self.shared.state.lock().driver.take() {
            driver.abort();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
