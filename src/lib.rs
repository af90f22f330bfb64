//! # mqttbridge
//!
//! `mqttbridge` subscribes to topic filters on an MQTT broker and republishes
//! every message it receives to all connected WebSocket clients, wrapped as
//! `{"topic": "...", "payload": "..."}`.
//!
//! ## Core Modules
//!
//! - `mqtt`: the broker client, its connection state machine and reconnect backoff.
//! - `hub`: the set of connected WebSocket clients and the broadcast operation.
//! - `client`: the hub's handle on a single WebSocket connection.
//! - `transport`: the WebSocket listener and the outbound envelope.
//! - `relay`: turns broker events into envelopes and broadcasts them.
//! - `app`: starts everything and tears it down on shutdown.
//! - `config`: loads settings from defaults, files and the environment.
//! - `utils`: error type and logging setup.

pub mod app;
pub mod client;
pub mod config;
pub mod hub;
pub mod mqtt;
pub mod relay;
pub mod transport;
pub mod utils;
