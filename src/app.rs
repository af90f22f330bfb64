//! Wires the bridge together: listener, hub, broker client and relay.

use std::future::Future;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::Settings;
use crate::hub::Hub;
use crate::mqtt::BrokerClient;
use crate::relay;
use crate::transport::WebSocketServer;
use crate::utils::error::Result;

/// Runs the bridge until `shutdown_signal` completes.
///
/// The listener is bound before anything else starts. If the port cannot be
/// bound this returns the error without ever contacting the broker.
pub async fn run<F>(settings: Settings, shutdown_signal: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let server = WebSocketServer::bind(&settings.server.addr()).await?;
    let (broker, events) = BrokerClient::connect(&settings.mqtt)?;
    info!("Forwarding {} to WebSocket clients", settings.mqtt.topics.join(", "));

    let hub = Hub::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let server_task = tokio::spawn(server.serve(hub.clone(), shutdown_rx.clone()));
    let broker_task = tokio::spawn(broker.run(shutdown_rx));
    let relay_task = tokio::spawn(relay::run(events, hub.clone()));

    shutdown_signal.await;
    info!("Shutting down...");
    let _ = shutdown_tx.send(true);

    if let Err(e) = broker_task.await {
        warn!("Broker client task failed: {e}");
    }
    if let Err(e) = server_task.await {
        warn!("WebSocket server task failed: {e}");
    }
    hub.shutdown();
    if let Err(e) = relay_task.await {
        warn!("Relay task failed: {e}");
    }

    info!("Bridge stopped");
    Ok(())
}
