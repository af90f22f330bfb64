//! The `transport` module is responsible for the WebSocket side of the bridge.
//!
//! It defines the envelope sent to streaming clients and implements the
//! listener that upgrades inbound connections and hands them to the hub.

pub mod message;
pub mod websocket;

pub use message::Envelope;
pub use websocket::WebSocketServer;
