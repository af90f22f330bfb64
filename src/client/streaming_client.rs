use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::error::SendError;
use tungstenite::protocol::Message as WsMessage;

pub type ClientId = String;

/// A connected WebSocket client as seen by the hub.
///
/// Frames pushed into `sender` are written to the socket by the connection's
/// writer task. Once that task ends the channel is closed and the client is
/// no longer writable.
#[derive(Debug, Clone)]
pub struct Client {
    /// Unique identifier, `client-<uuid>`.
    pub id: ClientId,

    /// Channel to the connection's writer task.
    pub sender: UnboundedSender<WsMessage>,
}

impl Client {
    pub fn new(sender: UnboundedSender<WsMessage>) -> Self {
        Self {
            id: format!("client-{}", uuid::Uuid::new_v4()),
            sender,
        }
    }

    /// Whether the writer task is still draining this client's channel.
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Queues a frame for the writer task. Never waits on the socket.
    pub fn send(&self, msg: WsMessage) -> Result<(), SendError<WsMessage>> {
        self.sender.send(msg)
    }
}
