//! Connection registry
//!
//! The hub is the only shared mutable state in the bridge. It is cheap to
//! clone: every clone points at the same connection set. The lock is held only
//! while the set is read or modified, never across an `.await`, and pushing a
//! frame into a client's channel does not wait on the socket, so one slow
//! client cannot hold up a broadcast.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};
use tungstenite::protocol::Message as WsMessage;

use crate::client::{Client, ClientId};
use crate::hub::Broadcast;

#[derive(Debug, Clone, Default)]
pub struct Hub {
    clients: Arc<Mutex<HashMap<ClientId, Client>>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    fn clients(&self) -> MutexGuard<'_, HashMap<ClientId, Client>> {
        // The map stays consistent even if a holder panicked.
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a freshly upgraded connection to the set.
    pub fn register_client(&self, client: Client) {
        let id = client.id.clone();
        let total = {
            let mut clients = self.clients();
            clients.insert(id.clone(), client);
            clients.len()
        };
        info!("{id} connected ({total} open)");
    }

    /// Removes a connection after its close or error event.
    ///
    /// Returns `false` when the connection was already gone, which happens
    /// when a broadcast pruned it first or the hub was shut down.
    pub fn remove_client(&self, client_id: &ClientId) -> bool {
        let (removed, total) = {
            let mut clients = self.clients();
            let removed = clients.remove(client_id).is_some();
            (removed, clients.len())
        };
        if removed {
            info!("{client_id} disconnected ({total} open)");
        }
        removed
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, client_id: &ClientId) -> bool {
        self.clients().contains_key(client_id)
    }

    pub fn len(&self) -> usize {
        self.clients().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients().is_empty()
    }

    /// Drops every connection. Their writer tasks see a closed channel and
    /// end, which closes the sockets.
    pub fn shutdown(&self) {
        let dropped = {
            let mut clients = self.clients();
            let dropped = clients.len();
            clients.clear();
            dropped
        };
        info!("Hub shut down, dropped {dropped} connection(s)");
    }
}

impl Broadcast for Hub {
    /// Queues `message` as a text frame for every open connection.
    ///
    /// Connections whose writer task has already ended are skipped and pruned.
    fn broadcast(&self, message: &str) {
        let frame = WsMessage::text(message.to_string());
        let mut clients = self.clients();

        let mut closed = Vec::new();
        for (id, client) in clients.iter() {
            if !client.is_open() {
                closed.push(id.clone());
                continue;
            }
            if let Err(e) = client.send(frame.clone()) {
                debug!("Skipping {id}: {e}");
                closed.push(id.clone());
            }
        }

        for id in closed {
            clients.remove(&id);
            debug!("Pruned closed connection {id}");
        }
    }
}
