//! The `hub` module owns the set of connected WebSocket clients and fans
//! every forwarded message out to them.

pub mod registry;

pub use registry::Hub;

/// Sends one already-serialized text message to every current recipient.
///
/// Delivery is best effort. Implementations never report per-recipient failures.
pub trait Broadcast {
    fn broadcast(&self, message: &str);
}
