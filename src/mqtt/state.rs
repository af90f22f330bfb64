use std::fmt;

/// Lifecycle of the broker connection.
///
/// ```text
/// Disconnected -> Connecting -> Connected -> Subscribing -> Streaming
/// ```
///
/// A lost connection sends any live state back to `Connecting`. `Closed` is
/// terminal and only reached through an explicit shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Subscribing,
    Streaming,
    Closed,
}

/// What happened to the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Start,
    ConnAck,
    SubscribeSent,
    SubscriptionsSettled,
    ConnectionLost,
    Shutdown,
}

impl ConnectionState {
    pub fn next(self, transition: Transition) -> Self {
        use ConnectionState::*;

        match (self, transition) {
            (Closed, _) => Closed,
            (_, Transition::Shutdown) => Closed,
            (_, Transition::ConnectionLost) => Connecting,
            (Disconnected, Transition::Start) => Connecting,
            (Disconnected | Connecting, Transition::ConnAck) => Connected,
            (Connected, Transition::SubscribeSent) => Subscribing,
            (Connected | Subscribing, Transition::SubscriptionsSettled) => Streaming,
            (state, _) => state,
        }
    }

    /// Whether the broker has accepted the connection.
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            ConnectionState::Connected | ConnectionState::Subscribing | ConnectionState::Streaming
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Subscribing => "subscribing",
            ConnectionState::Streaming => "streaming",
            ConnectionState::Closed => "closed",
        };
        f.write_str(name)
    }
}
