//! The `client` module defines the bridge's handle on one connected
//! WebSocket client: its identifier and the channel feeding its writer task.

pub mod streaming_client;
pub use streaming_client::{Client, ClientId};
