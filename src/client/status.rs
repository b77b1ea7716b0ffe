//! Status register and connection state.

// ============================================================================
// Status
// ============================================================================

/// Observable connection flags.
///
/// `ready` and `has_error` are independent: an errored connection stays
/// flagged after it closes, until the next `connect()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Status {
    /// The transport is open.
    pub ready: bool,
    /// The current transport reported a failure.
    pub has_error: bool,
}

impl Status {
    /// Status right after `connect()`.
    pub const RESET: Self = Self {
        ready: false,
        has_error: false,
    };
}

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle of the manager's current connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No `connect()` yet.
    #[default]
    Idle,
    /// Handshake in progress.
    Connecting,
    /// Transport open.
    Open,
    /// Transport closed or torn down. Terminal until the next `connect()`.
    Closed,
}

impl ConnectionState {
    /// Returns `true` once the connection can no longer carry frames.
    #[inline]
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}
