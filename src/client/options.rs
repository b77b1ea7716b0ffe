//! Client options and endpoint validation.

// ============================================================================
// Imports
// ============================================================================

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Relay endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:12345/ws";

/// Default capacity of the message broadcast channel.
pub const DEFAULT_MESSAGE_BUFFER: usize = 256;

// ============================================================================
// ClientOptions
// ============================================================================

/// Validated client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Endpoint used by `start()`.
    pub endpoint: Url,

    /// Capacity of the channel behind `subscribe()`. Subscribers that fall
    /// further behind than this skip messages; the log itself keeps all.
    pub message_buffer: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            message_buffer: DEFAULT_MESSAGE_BUFFER,
        }
    }
}

fn default_endpoint() -> Url {
    match Url::parse(DEFAULT_ENDPOINT) {
        Ok(url) => url,
        Err(e) => unreachable!("DEFAULT_ENDPOINT is a valid URL: {e}"),
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Parses `url` and checks it uses the `ws` or `wss` scheme.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] if the URL does not parse, has another
/// scheme, or has no host.
pub fn parse_endpoint(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| Error::invalid_url(url, e.to_string()))?;

    match parsed.scheme() {
        "ws" | "wss" => {}
        other => {
            return Err(Error::invalid_url(
                url,
                format!("scheme must be ws or wss, got {other}"),
            ));
        }
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(Error::invalid_url(url, "missing host"));
    }

    Ok(parsed)
}

// ============================================================================
// Tests
// ============================================================================
