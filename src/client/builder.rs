//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and creating [`ConnectionManager`]
//! instances.
//!
//! # Example
//!
//! ```no_run
//! use relay_chat_client::ConnectionManager;
//!
//! # fn example() -> relay_chat_client::Result<()> {
//! let manager = ConnectionManager::builder()
//!     .endpoint("ws://localhost:12345/ws")
//!     .message_buffer(64)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::error::{Error, Result};
use crate::transport::{Connector, WebSocketConnector};

use super::core::ConnectionManager;
use super::options::{ClientOptions, DEFAULT_MESSAGE_BUFFER, parse_endpoint};

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`ConnectionManager`].
///
/// Use [`ConnectionManager::builder()`] to create a new builder.
pub struct ClientBuilder {
    /// Endpoint used by `start()`, unvalidated.
    endpoint: Option<String>,
    /// Broadcast capacity for message subscribers.
    message_buffer: usize,
    /// Transport factory.
    connector: Option<Box<dyn Connector>>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            endpoint: None,
            message_buffer: DEFAULT_MESSAGE_BUFFER,
            connector: None,
        }
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("endpoint", &self.endpoint)
            .field("message_buffer", &self.message_buffer)
            .field("custom_connector", &self.connector.is_some())
            .finish()
    }
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a new builder with default configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the relay endpoint used by [`ConnectionManager::start`].
    ///
    /// # Arguments
    ///
    /// * `url` - `ws://` or `wss://` URL (default `ws://localhost:12345/ws`)
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Sets the capacity of the channel behind
    /// [`ConnectionManager::subscribe`].
    #[inline]
    #[must_use]
    pub fn message_buffer(mut self, capacity: usize) -> Self {
        self.message_buffer = capacity;
        self
    }

    /// Replaces the transport factory.
    ///
    /// Defaults to [`WebSocketConnector`].
    #[inline]
    #[must_use]
    pub fn connector(mut self, connector: impl Connector) -> Self {
        self.connector = Some(Box::new(connector));
        self
    }

    /// Builds the manager with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] if the endpoint is not a `ws`/`wss` URL
    /// - [`Error::Config`] if the message buffer is zero
    pub fn build(self) -> Result<ConnectionManager> {
        let options = self.validate()?;
        let connector = self
            .connector
            .unwrap_or_else(|| Box::new(WebSocketConnector));

        Ok(ConnectionManager::new(options, connector))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientBuilder {
    /// Validates the collected settings.
    fn validate(&self) -> Result<ClientOptions> {
        let mut options = ClientOptions::default();

        if let Some(ref endpoint) = self.endpoint {
            options.endpoint = parse_endpoint(endpoint)?;
        }

        if self.message_buffer == 0 {
            return Err(Error::config(
                "message_buffer must be greater than zero. Use .message_buffer(n) with n > 0.",
            ));
        }
        options.message_buffer = self.message_buffer;

        Ok(options)
    }
}

// ============================================================================
// Tests
// ============================================================================
