use serde::{Deserialize, Serialize};

/// A broker message as delivered to streaming clients.
///
/// Serialized as `{"topic":"…","payload":"…"}`, with the keys in that order.
///
/// # Example
///
/// ```rust
/// use mqttbridge::transport::Envelope;
///
/// let envelope = Envelope::new("classroom/5/telemetry", br#"{"temp":21}"#);
/// assert_eq!(envelope.payload, r#"{"temp":21}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub topic: String,
    pub payload: String,
}

impl Envelope {
    /// Wraps a raw broker payload. Invalid UTF-8 sequences become U+FFFD.
    pub fn new(topic: impl Into<String>, payload: &[u8]) -> Self {
        Self {
            topic: topic.into(),
            payload: String::from_utf8_lossy(payload).into_owned(),
        }
    }
}
