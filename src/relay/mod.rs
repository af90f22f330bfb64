//! The relay moves broker events to streaming clients: every
//! [`InboundEvent`] becomes one [`Envelope`] broadcast through the hub.
//! There is no filtering and nothing is kept.

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info};

use crate::hub::Broadcast;
use crate::mqtt::InboundEvent;
use crate::transport::Envelope;

/// Serializes `event` and broadcasts it once.
pub fn forward<B: Broadcast + ?Sized>(hub: &B, event: InboundEvent) {
    let envelope = Envelope::new(event.topic, &event.payload);
    let text = match serde_json::to_string(&envelope) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize message on {}: {e}", envelope.topic);
            return;
        }
    };
    debug!("Forwarding message on {}", envelope.topic);
    hub.broadcast(&text);
}

/// Forwards events until the broker client closes the channel.
///
/// Returns how many events were forwarded.
pub async fn run<B: Broadcast>(mut events: UnboundedReceiver<InboundEvent>, hub: B) -> u64 {
    let mut forwarded = 0u64;
    while let Some(event) = events.recv().await {
        forward(&hub, event);
        forwarded += 1;
    }
    info!("Relay stopped after {forwarded} message(s)");
    forwarded
}
