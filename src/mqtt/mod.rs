//! The `mqtt` module is the broker side of the bridge.
//!
//! [`BrokerClient`] keeps one connection to the MQTT broker alive, subscribes
//! to the configured filters after every (re)connect and turns each incoming
//! `PUBLISH` into an [`InboundEvent`] on an unbounded channel.

pub mod backoff;
pub mod client;
pub mod event;
pub mod state;

pub use backoff::Backoff;
pub use client::{BrokerAddress, BrokerClient};
pub use event::InboundEvent;
pub use state::{ConnectionState, Transition};
