//! A just-enough MQTT 3.1.1 broker for driving the bridge in tests.
//!
//! It accepts one connection at a time, answers CONNECT, SUBSCRIBE and
//! PINGREQ, and publishes QoS 0 messages on request.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerEvent {
    Connected,
    Subscribed(Vec<String>),
    Disconnected,
}

enum Outbound {
    Frame(Vec<u8>),
    Hangup,
}

type Current = Arc<Mutex<Option<mpsc::UnboundedSender<Outbound>>>>;

pub struct FakeBroker {
    pub addr: SocketAddr,
    pub events: mpsc::UnboundedReceiver<BrokerEvent>,
    current: Current,
}

impl FakeBroker {
    /// Starts the broker. SUBSCRIBE requests for filters listed in `reject` get a failure return code.
    pub async fn start(reject: &[&str]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind fake broker");
        let addr = listener.local_addr().unwrap();
        let (events_tx, events) = mpsc::unbounded_channel();
        let current: Current = Arc::new(Mutex::new(None));
        let reject: Vec<String> = reject.iter().map(|s| s.to_string()).collect();

        let shared = current.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let (reader, mut writer) = stream.into_split();
                let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Outbound>();
                *shared.lock().unwrap() = Some(out_tx.clone());

                tokio::spawn(read_packets(
                    reader,
                    out_tx,
                    events_tx.clone(),
                    reject.clone(),
                ));
                tokio::spawn(async move {
                    while let Some(out) = out_rx.recv().await {
                        match out {
                            Outbound::Frame(frame) => {
                                if writer.write_all(&frame).await.is_err() {
                                    break;
                                }
                            }
                            Outbound::Hangup => break,
                        }
                    }
                    let _ = writer.shutdown().await;
                });
            }
        });

        Self {
            addr,
            events,
            current,
        }
    }

    pub fn url(&self) -> String {
        format!("mqtt://{}", self.addr)
    }

    pub fn publish(&self, topic: &str, payload: &[u8]) {
        self.send(Outbound::Frame(encode_publish(topic, payload)));
    }

    /// Closes the current connection from the broker side.
    pub fn hang_up(&self) {
        self.send(Outbound::Hangup);
    }

    fn send(&self, out: Outbound) {
        let current = self.current.lock().unwrap();
        let tx = current.as_ref().expect("no client connected");
        if tx.send(out).is_err() {
            panic!("connection writer gone");
        }
    }

    pub async fn next_event(&mut self) -> BrokerEvent {
        tokio::time::timeout(std::time::Duration::from_secs(5), self.events.recv())
            .await
            .expect("timed out waiting for broker event")
            .expect("broker stopped")
    }

    /// Waits until SUBSCRIBE requests covering `count` filters have arrived.
    pub async fn wait_subscribed(&mut self, count: usize) -> Vec<String> {
        let mut filters = Vec::new();
        while filters.len() < count {
            if let BrokerEvent::Subscribed(mut more) = self.next_event().await {
                filters.append(&mut more);
            }
        }
        filters.sort();
        filters
    }
}

async fn read_packets(
    mut reader: OwnedReadHalf,
    out: mpsc::UnboundedSender<Outbound>,
    events: mpsc::UnboundedSender<BrokerEvent>,
    reject: Vec<String>,
) {
    loop {
        let Ok(header) = reader.read_u8().await else {
            break;
        };
        let Some(len) = read_remaining_length(&mut reader).await else {
            break;
        };
        let mut body = vec![0u8; len];
        if reader.read_exact(&mut body).await.is_err() {
            break;
        }

        match header >> 4 {
            // CONNECT
            1 => {
                let _ = out.send(Outbound::Frame(vec![0x20, 0x02, 0x00, 0x00]));
                let _ = events.send(BrokerEvent::Connected);
            }
            // SUBSCRIBE
            8 => {
                let (pkid, filters) = parse_subscribe(&body);
                let mut suback = vec![0x90, (2 + filters.len()) as u8];
                suback.extend_from_slice(&pkid.to_be_bytes());
                for filter in &filters {
                    suback.push(if reject.contains(filter) { 0x80 } else { 0x00 });
                }
                let _ = out.send(Outbound::Frame(suback));
                let _ = events.send(BrokerEvent::Subscribed(filters));
            }
            // PINGREQ
            12 => {
                let _ = out.send(Outbound::Frame(vec![0xD0, 0x00]));
            }
            // DISCONNECT
            14 => {
                let _ = events.send(BrokerEvent::Disconnected);
                break;
            }
            _ => {}
        }
    }
    let _ = out.send(Outbound::Hangup);
}

async fn read_remaining_length(reader: &mut OwnedReadHalf) -> Option<usize> {
    let mut value = 0usize;
    let mut shift = 0;
    loop {
        let byte = reader.read_u8().await.ok()?;
        value |= ((byte & 0x7f) as usize) << shift;
        if byte & 0x80 == 0 {
            return Some(value);
        }
        shift += 7;
        if shift > 21 {
            return None;
        }
    }
}

fn parse_subscribe(body: &[u8]) -> (u16, Vec<String>) {
    let pkid = u16::from_be_bytes([body[0], body[1]]);
    let mut filters = Vec::new();
    let mut pos = 2;
    while pos + 2 <= body.len() {
        let len = u16::from_be_bytes([body[pos], body[pos + 1]]) as usize;
        pos += 2;
        filters.push(String::from_utf8_lossy(&body[pos..pos + len]).into_owned());
        // skip the requested QoS byte
        pos += len + 1;
    }
    (pkid, filters)
}

fn encode_publish(topic: &str, payload: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(2 + topic.len() + payload.len());
    body.extend_from_slice(&(topic.len() as u16).to_be_bytes());
    body.extend_from_slice(topic.as_bytes());
    body.extend_from_slice(payload);

    let mut frame = vec![0x30];
    let mut len = body.len();
    loop {
        let mut byte = (len % 128) as u8;
        len /= 128;
        if len > 0 {
            byte |= 0x80;
        }
        frame.push(byte);
        if len == 0 {
            break;
        }
    }
    frame.extend_from_slice(&body);
    frame
}
