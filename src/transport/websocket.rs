//! WebSocket transport
//!
//! Accepts TCP connections, performs the WebSocket upgrade and registers each
//! connection with the [`Hub`]. Every connection gets two halves:
//! - a writer task draining the client's channel into the socket
//! - the reader loop, which only watches for close frames and errors
//!
//! Whichever side ends first, the connection leaves the hub.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::accept_async;
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::client::Client;
use crate::hub::Hub;
use crate::utils::error::{BridgeError, Result};

/// A bound, not yet serving, WebSocket listener.
#[derive(Debug)]
pub struct WebSocketServer {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl WebSocketServer {
    /// Binds the listening socket. Failing here means the bridge cannot serve anyone.
    pub async fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| BridgeError::bind(addr, e))?;
        let local_addr = listener.local_addr().map_err(BridgeError::LocalAddr)?;

        info!("WebSocket server listening on {}", ws_url(&local_addr));
        Ok(Self {
            listener,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts connections until `shutdown` flips to `true` (or its sender is dropped).
    ///
    /// The listening socket is closed when this returns. Open connections are
    /// left to the hub.
    pub async fn serve(self, hub: Hub, mut shutdown: watch::Receiver<bool>) {
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
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tokio::spawn(handle_connection(stream, peer, hub.clone()));
                    }
                    Err(e) => warn!("Failed to accept connection: {e}"),
                },
            }
        }

        info!("WebSocket server on {} closed", ws_url(&self.local_addr));
    }
}

fn ws_url(addr: &SocketAddr) -> String {
    format!("ws://{addr}")
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr, hub: Hub) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake with {peer} failed: {e}");
            return;
        }
    };

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();
    let client = Client::new(tx);
    let client_id = client.id.clone();
    debug!("{client_id} upgraded from {peer}");
    hub.register_client(client);

    {
        let client_id = client_id.clone();
        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                if let Err(e) = ws_sender.send(msg).await {
                    debug!("Failed to send to {client_id}: {e}");
                    break;
                }
            }
            let _ = ws_sender.close().await;
            debug!("Send loop closed for {client_id}");
        });
    }

    while let Some(frame) = ws_receiver.next().await {
        match frame {
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket error on {client_id}: {e}");
                break;
            }
        }
    }

    hub.remove_client(&client_id);
}
