//! The `error` module defines the error type returned by the fallible parts of
//! the bridge: configuration loading, broker address parsing and binding the
//! WebSocket listener.
//!
//! Per-client send failures and broker connection drops are not represented
//! here. They are logged where they happen and never reach a caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid broker url '{url}': {reason}")]
    BrokerUrl { url: String, reason: String },

    #[error("failed to bind WebSocket listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("listener has no local address: {0}")]
    LocalAddr(std::io::Error),
}

impl BridgeError {
    pub(crate) fn broker_url(url: &str, reason: impl Into<String>) -> Self {
        Self::BrokerUrl {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn bind(addr: &str, source: std::io::Error) -> Self {
        Self::Bind {
            addr: addr.to_string(),
            source,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BridgeError>;
