//! Broker client
//!
//! Wraps a `rumqttc` client and event loop. The event loop is driven from
//! [`BrokerClient::run`], which:
//! - subscribes to every configured filter after each `CONNACK`
//! - maps `SUBACK`s back to their filter so failures name the filter
//! - forwards every `PUBLISH` as an [`InboundEvent`]
//! - waits out a jittered exponential backoff after any connection error
//!
//! Polling the `rumqttc` event loop again after an error is what reconnects,
//! so the backoff here is the whole retry policy.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use rumqttc::{
    AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS, SubAck, SubscribeReasonCode,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::MqttSettings;
use crate::mqtt::backoff::Backoff;
use crate::mqtt::event::InboundEvent;
use crate::mqtt::state::{ConnectionState, Transition};
use crate::utils::error::{BridgeError, Result};

const DEFAULT_PORT: u16 = 1883;
const DISCONNECT_GRACE: Duration = Duration::from_millis(500);

/// Host and port of the broker, parsed from an `mqtt://` or `tcp://` url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddress {
    pub host: String,
    pub port: u16,
}

impl BrokerAddress {
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).map_err(|e| BridgeError::broker_url(raw, e.to_string()))?;

        match url.scheme() {
            "mqtt" | "tcp" => {}
            other => {
                return Err(BridgeError::broker_url(
                    raw,
                    format!("unsupported scheme '{other}'"),
                ));
            }
        }

        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| BridgeError::broker_url(raw, "missing host"))?;

        Ok(Self {
            host: host.to_string(),
            port: url.port().unwrap_or(DEFAULT_PORT),
        })
    }
}

impl std::fmt::Display for BrokerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mqtt://{}:{}", self.host, self.port)
    }
}

/// `<prefix>-<8 hex chars>`, so two bridges never evict each other from the broker.
pub(crate) fn unique_client_id(prefix: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &suffix[..8])
}

pub struct BrokerClient {
    address: BrokerAddress,
    client: AsyncClient,
    eventloop: EventLoop,
    filters: Vec<String>,
    backoff: Backoff,
    state: watch::Sender<ConnectionState>,
    events: mpsc::UnboundedSender<InboundEvent>,
    // filters handed to rumqttc, waiting for their packet id
    queued_subscriptions: VecDeque<String>,
    // packet id -> filter, waiting for SUBACK
    inflight_subscriptions: HashMap<u16, String>,
}

impl BrokerClient {
    /// Builds the client for `settings.url`. Nothing touches the network until [`run`](Self::run).
    ///
    /// Returns the client and the receiving end of its event stream. The
    /// stream ends when the client is shut down.
    pub fn connect(
        settings: &MqttSettings,
    ) -> Result<(Self, mpsc::UnboundedReceiver<InboundEvent>)> {
        let address = BrokerAddress::parse(&settings.url)?;
        let client_id = unique_client_id(&settings.client_id);

        let mut options = MqttOptions::new(client_id.clone(), address.host.clone(), address.port);
        options
            .set_keep_alive(Duration::from_secs(settings.keep_alive_secs.max(5)))
            .set_clean_session(true)
            .set_max_packet_size(settings.max_packet_bytes, settings.max_packet_bytes);

        let capacity = (settings.topics.len() * 2).max(10);
        let (client, eventloop) = AsyncClient::new(options, capacity);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(ConnectionState::Disconnected);

        debug!("MQTT client {client_id} created for {address}");

        Ok((
            Self {
                address,
                client,
                eventloop,
                filters: settings.topics.clone(),
                backoff: Backoff::new(
                    Duration::from_millis(settings.reconnect_base_ms),
                    Duration::from_millis(settings.reconnect_max_ms),
                ),
                state,
                events: events_tx,
                queued_subscriptions: VecDeque::new(),
                inflight_subscriptions: HashMap::new(),
            },
            events_rx,
        ))
    }

    #[cfg(test)]
    pub(crate) fn address(&self) -> &BrokerAddress {
        &self.address
    }

    #[cfg(test)]
    pub(crate) fn filters(&self) -> &[String] {
        &self.filters
    }

    /// Watches the connection state.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    fn transition(&self, transition: Transition) {
        self.state.send_modify(|state| *state = state.next(transition));
    }

    /// Asks the broker for messages matching `filter`.
    ///
    /// Failures are logged with the filter and otherwise ignored. The filter
    /// is tried again on the next reconnect.
    pub fn subscribe(&mut self, filter: &str) {
        match self.client.try_subscribe(filter, QoS::AtMostOnce) {
            Ok(()) => self.queued_subscriptions.push_back(filter.to_string()),
            Err(e) => error!("Error subscribing to {filter}: {e}"),
        }
    }

    fn subscribe_all(&mut self) {
        // requests left over from the lost connection would take the packet ids
        // the fresh subscriptions are waiting for
        self.eventloop.pending.clear();
        self.queued_subscriptions.clear();
        self.inflight_subscriptions.clear();

        for filter in self.filters.clone() {
            self.subscribe(&filter);
        }

        if self.queued_subscriptions.is_empty() {
            self.transition(Transition::SubscriptionsSettled);
        } else {
            self.transition(Transition::SubscribeSent);
        }
    }

    fn handle_suback(&mut self, ack: SubAck) {
        let filter = self
            .inflight_subscriptions
            .remove(&ack.pkid)
            .unwrap_or_else(|| format!("<packet {}>", ack.pkid));

        for code in ack.return_codes {
            match code {
                SubscribeReasonCode::Success(qos) => {
                    info!("Subscribed to MQTT topic: {filter} ({qos:?})")
                }
                SubscribeReasonCode::Failure => {
                    error!("Error subscribing to {filter}: rejected by broker")
                }
            }
        }

        if self.queued_subscriptions.is_empty() && self.inflight_subscriptions.is_empty() {
            self.transition(Transition::SubscriptionsSettled);
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Incoming(Packet::ConnAck(_)) => {
                self.transition(Transition::ConnAck);
                self.backoff.reset();
                info!("Connected to MQTT broker: {}", self.address);
                self.subscribe_all();
            }
            Event::Outgoing(Outgoing::Subscribe(pkid)) => {
                if let Some(filter) = self.queued_subscriptions.pop_front() {
                    self.inflight_subscriptions.insert(pkid, filter);
                }
            }
            Event::Incoming(Packet::SubAck(ack)) => self.handle_suback(ack),
            Event::Incoming(Packet::Publish(publish)) => {
                let event = InboundEvent::new(publish.topic, publish.payload.to_vec());
                if self.events.send(event).is_err() {
                    debug!("Relay is gone, dropping message");
                }
            }
            Event::Incoming(Packet::Disconnect) => {
                info!("Broker sent DISCONNECT");
            }
            _ => {}
        }
    }

    /// Drives the connection until `shutdown` flips to `true` (or its sender is dropped).
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        self.transition(Transition::Start);
        info!("Connecting to MQTT broker: {}", self.address);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                polled = self.eventloop.poll() => match polled {
                    Ok(event) => self.handle_event(event),
                    Err(e) => {
                        let was_connected = self.state.borrow().is_connected();
                        self.transition(Transition::ConnectionLost);
                        if was_connected {
                            warn!("Disconnected from MQTT broker: {e}");
                        } else {
                            warn!("MQTT error: {e}");
                        }

                        let delay = self.backoff.next_delay();
                        info!(
                            "Reconnecting to {} in {}ms (attempt {})",
                            self.address,
                            delay.as_millis(),
                            self.backoff.attempt()
                        );
                        tokio::select! {
                            _ = tokio::time::sleep(delay) => {}
                            _ = shutdown.changed() => {}
                        }
                    }
                },
            }
        }

        self.close().await;
    }

    async fn close(mut self) {
        let was_connected = self.state.borrow().is_connected();
        self.transition(Transition::Shutdown);

        if was_connected {
            if let Err(e) = self.client.try_disconnect() {
                debug!("Could not queue DISCONNECT: {e}");
            } else {
                // the request only reaches the broker while the loop is polled
                let flushed = tokio::time::timeout(DISCONNECT_GRACE, async {
                    loop {
                        match self.eventloop.poll().await {
                            Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                            Ok(_) => {}
                        }
                    }
                })
                .await;
                if flushed.is_err() {
                    debug!("DISCONNECT not flushed within {DISCONNECT_GRACE:?}");
                }
            }
        }

        info!("MQTT connection to {} closed", self.address);
    }
}
