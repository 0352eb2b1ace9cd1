use bytes::Bytes;

use crate::identity::Identity;

/// Three-character message type: plain message.
pub const MESSAGE_TYPE: &str = "MSG";
/// Three-character message type: request.
pub const REQUEST_TYPE: &str = "RQS";
/// Three-character message type: response.
pub const RESPONSE_TYPE: &str = "RSP";

/// Width of every message type token on the wire.
pub const TYPE_LENGTH: usize = 3;

pub(crate) fn is_known_type(message_type: &str) -> bool {
    matches!(message_type, MESSAGE_TYPE | REQUEST_TYPE | RESPONSE_TYPE)
}

/// A message decoded by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The channel this message belongs to.
    pub channel: i32,
    /// Message type token (`MSG`, `RQS`, `RSP`).
    pub message_type: String,
    /// The message payload.
    pub payload: Bytes,
}

impl Message {
    pub fn new(channel: i32, message_type: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            channel,
            message_type: message_type.into(),
            payload: payload.into(),
        }
    }

    /// Payload rendered as text, replacing invalid UTF-8.
    pub fn payload_as_string(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// A message decoded by the gateway layer: a [`Message`] plus its routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayMessage {
    pub message: Message,
    pub origin: Identity,
    pub destination: Identity,
}

impl GatewayMessage {
    pub fn channel(&self) -> i32 {
        self.message.channel
    }

    pub fn message_type(&self) -> &str {
        &self.message.message_type
    }

    pub fn payload(&self) -> &Bytes {
        &self.message.payload
    }

    pub fn payload_as_string(&self) -> String {
        self.message.payload_as_string()
    }
}
