/// One message received from the broker.
///
/// `topic` is the concrete topic the message was published on, not the filter
/// that matched it. `payload` is passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl InboundEvent {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}
