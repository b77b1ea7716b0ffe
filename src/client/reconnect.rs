//! Automatic reconnection.
//!
//! The manager never reconnects on its own. A [`Reconnector`] watches a
//! manager's connection state and calls [`ConnectionManager::reconnect`]
//! after the relay closes the connection, backing off exponentially.
//!
//! Teardown is not a reason to reconnect: once the manager has released its
//! transport the reconnector stays idle until the host connects again.

// ============================================================================
// Imports
// ============================================================================

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::core::ConnectionManager;
use super::status::ConnectionState;

// ============================================================================
// ReconnectPolicy
// ============================================================================

/// Backoff schedule for a [`Reconnector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before the first attempt.
    pub initial_delay: Duration,
    /// Upper bound for any delay.
    pub max_delay: Duration,
    /// Consecutive attempts allowed without an open in between.
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Sets the initial delay.
    #[inline]
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    #[inline]
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Limits the number of consecutive attempts.
    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Returns the delay before attempt number `attempt` (zero-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }

    /// Returns `true` if attempt number `attempt` (zero-based) may run.
    #[inline]
    #[must_use]
    pub fn allows(&self, attempt: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempt < max)
    }
}

// ============================================================================
// Reconnector
// ============================================================================

/// Background task that reconnects a manager after remote closes.
///
/// Holds the manager weakly; the task ends when the manager is dropped, when
/// the attempt budget runs out, or on [`stop`](Self::stop). Dropping the
/// reconnector stops it.
#[derive(Debug)]
pub struct Reconnector {
    handle: JoinHandle<()>,
}

impl Reconnector {
    /// Starts supervising `manager`. Must be called within a tokio runtime.
    #[must_use]
    pub fn spawn(manager: &Arc<ConnectionManager>, policy: ReconnectPolicy) -> Self {
        let state_rx = manager.watch_connection_state();
        let handle = tokio::spawn(supervise(Arc::downgrade(manager), state_rx, policy));
        Self { handle }
    }

    /// Stops supervising.
    pub fn stop(&self) {
        self.handle.abort();
    }

    /// Returns `true` once the task has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Reconnector {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn supervise(
    manager: Weak<ConnectionManager>,
    mut state_rx: watch::Receiver<ConnectionState>,
    policy: ReconnectPolicy,
) {
    let mut attempt: u32 = 0;

    loop {
        let state = *state_rx.borrow_and_update();

        match state {
            ConnectionState::Open => attempt = 0,
            ConnectionState::Closed => {
                let Some(current) = manager.upgrade() else {
                    return;
                };
                // Torn down: wait for the host to connect again
                if current.has_transport() {
                    if !policy.allows(attempt) {
                        warn!(
                            client_id = %current.client_id(),
                            attempts = attempt,
                            "Giving up reconnecting"
                        );
                        return;
                    }

                    let delay = policy.delay(attempt);
                    info!(
                        client_id = %current.client_id(),
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Connection lost, reconnecting"
                    );
                    drop(current);

                    tokio::time::sleep(delay).await;

                    let Some(current) = manager.upgrade() else {
                        return;
                    };
                    // Host may have reconnected or torn down meanwhile
                    if current.has_transport() && current.connection_state().is_closed() {
                        attempt += 1;
                        current.reconnect();
                    } else {
                        debug!(client_id = %current.client_id(), "Reconnect no longer needed");
                    }
                    continue;
                }
            }
            ConnectionState::Idle | ConnectionState::Connecting => {}
        }

        if state_rx.changed().await.is_err() {
            return;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
