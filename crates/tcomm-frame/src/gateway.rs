//! Gateway layer: routes a payload between two endpoint identities.
//!
//! Wire format:
//! ```text
//! "GWM" D type D channel D origin_len D origin_urn D dest_len D dest_urn D payload
//! ```
//!
//! The gateway layer carries no checksum; it always rides inside a transport
//! frame that does.

use bytes::Bytes;

use crate::codec::HexCodec;
use crate::cursor::{CursorBuffer, Delimiter};
use crate::error::{FrameError, Result};
use crate::handler::Decoder;
use crate::identity::Identity;
use crate::message::{
    is_known_type, GatewayMessage, Message, MESSAGE_TYPE, REQUEST_TYPE, TYPE_LENGTH,
};

/// Marker opening every gateway frame.
pub const GATEWAY_MARKER: &str = "GWM";

/// Encoder/decoder for gateway frames. Stateless.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayHandler;

impl GatewayHandler {
    pub fn new() -> Self {
        Self
    }

    /// Exact wire length of a gateway frame.
    pub fn frame_len(
        origin_urn_len: usize,
        destination_urn_len: usize,
        payload_len: usize,
    ) -> usize {
        let delimiter = HexCodec::DELIMITER.len();
        GATEWAY_MARKER.len()
            + delimiter
            + TYPE_LENGTH
            + delimiter
            + 3 * (HexCodec::INT_LENGTH + delimiter)
            + origin_urn_len
            + delimiter
            + destination_urn_len
            + delimiter
            + payload_len
    }

    pub fn encode(
        &self,
        payload: &[u8],
        message_type: &str,
        channel: i32,
        origin: &Identity,
        destination: &Identity,
    ) -> Result<Bytes> {
        if message_type.len() != TYPE_LENGTH {
            return Err(FrameError::framing(format!(
                "message type {message_type:?} must be {TYPE_LENGTH} characters"
            )));
        }
        let origin = origin.to_urn();
        let destination = destination.to_urn();
        let origin_len = urn_len(&origin)?;
        let destination_len = urn_len(&destination)?;

        let total = Self::frame_len(origin.len(), destination.len(), payload.len());
        let mut buf = CursorBuffer::with_capacity(total);
        buf.append_ascii(GATEWAY_MARKER, Delimiter::Follows)?;
        buf.append_ascii(message_type, Delimiter::Follows)?;
        buf.append_int(channel, Delimiter::Follows);
        buf.append_int(origin_len, Delimiter::Follows);
        buf.append_ascii(&origin, Delimiter::Follows)?;
        buf.append_int(destination_len, Delimiter::Follows);
        buf.append_ascii(&destination, Delimiter::Follows)?;
        buf.append_bytes(payload, Delimiter::Omitted);
        Ok(buf.into_bytes())
    }

    pub fn encode_message(
        &self,
        payload: &[u8],
        channel: i32,
        origin: &Identity,
        destination: &Identity,
    ) -> Result<Bytes> {
        self.encode(payload, MESSAGE_TYPE, channel, origin, destination)
    }

    pub fn encode_request(
        &self,
        payload: &[u8],
        channel: i32,
        origin: &Identity,
        destination: &Identity,
    ) -> Result<Bytes> {
        self.encode(payload, REQUEST_TYPE, channel, origin, destination)
    }

    pub fn decode_message(&self, data: &[u8]) -> Result<GatewayMessage> {
        let mut buf = CursorBuffer::new(data);
        let marker = buf.read_ascii(GATEWAY_MARKER.len(), Delimiter::Follows)?;
        if marker != GATEWAY_MARKER {
            return Err(FrameError::framing(format!(
                "unexpected gateway message type {marker:?}"
            )));
        }
        let message_type = buf.read_ascii(TYPE_LENGTH, Delimiter::Follows)?;
        if !is_known_type(&message_type) {
            return Err(FrameError::framing(format!(
                "unknown gateway payload type {message_type:?}"
            )));
        }
        let channel = buf.read_int(Delimiter::Follows)?;
        let origin = read_identity(&mut buf)?;
        let destination = read_identity(&mut buf)?;
        let payload = buf.read_bytes(buf.remaining(), Delimiter::Omitted)?;

        Ok(GatewayMessage {
            message: Message {
                channel,
                message_type,
                payload,
            },
            origin,
            destination,
        })
    }
}

fn urn_len(urn: &str) -> Result<i32> {
    i32::try_from(urn.len()).map_err(|_| FrameError::framing("endpoint urn too long"))
}

fn read_identity(buf: &mut CursorBuffer<&[u8]>) -> Result<Identity> {
    let len = buf.read_int(Delimiter::Follows)?;
    let len = usize::try_from(len)
        .map_err(|_| FrameError::format(format!("negative urn length {len}")))?;
    let urn = buf.read_ascii(len, Delimiter::Follows)?;
    Ok(Identity::parse_urn(&urn)?)
}

impl Decoder for GatewayHandler {
    type Output = GatewayMessage;

    fn decode(&self, data: &[u8]) -> Result<GatewayMessage> {
        self.decode_message(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::DEE_WEBSITE_MESSAGING;
    use crate::identity::{DeviceIdentity, ServiceIdentity};
    use crate::message::RESPONSE_TYPE;

    fn endpoints() -> (Identity, Identity) {
        (
            DeviceIdentity::new("0", "0").unwrap().into(),
            ServiceIdentity::new("DeeWebsiteMessagingService")
                .unwrap()
                .into(),
        )
    }

    #[test]
    fn register_command_round_trips() {
        let (origin, destination) = endpoints();
        let payload = br#"{"command":"REGISTER_CONNECTION"}"#;
        let frame = GatewayHandler::new()
            .encode_message(payload, DEE_WEBSITE_MESSAGING, &origin, &destination)
            .unwrap();

        let decoded = GatewayHandler::new().decode_message(&frame).unwrap();
        assert_eq!(decoded.channel(), DEE_WEBSITE_MESSAGING);
        assert_eq!(decoded.message_type(), MESSAGE_TYPE);
        assert_eq!(decoded.origin, origin);
        assert_eq!(decoded.destination, destination);
        assert_eq!(decoded.payload().as_ref(), payload);
    }

    #[test]
    fn wire_layout() {
        let (origin, destination) = endpoints();
        let frame = GatewayHandler::new()
            .encode_request(b"{}", 46201, &origin, &destination)
            .unwrap();
        let origin_urn = "urn:tcomm-endpoint:device:deviceType:0:deviceSerialNumber:0";
        let expected_head = format!(
            "GWM RQS 0x0000b479 {} {origin_urn} ",
            HexCodec::encode_int(origin_urn.len() as i32)
        );
        assert!(frame.starts_with(expected_head.as_bytes()));
        assert!(frame.ends_with(b"DeeWebsiteMessagingService {}"));
        assert_eq!(
            frame.len(),
            GatewayHandler::frame_len(origin_urn.len(), destination.to_urn().len(), 2)
        );
    }

    #[test]
    fn response_type_decodes() {
        let (origin, destination) = endpoints();
        let frame = GatewayHandler::new()
            .encode(b"ok", RESPONSE_TYPE, 1, &destination, &origin)
            .unwrap();
        let decoded = GatewayHandler::new().decode_message(&frame).unwrap();
        assert_eq!(decoded.message_type(), RESPONSE_TYPE);
        assert!(decoded.destination.is_device());
    }

    #[test]
    fn wrong_marker_is_a_framing_error() {
        let (origin, destination) = endpoints();
        let mut frame = GatewayHandler::new()
            .encode_message(b"x", 1, &origin, &destination)
            .unwrap()
            .to_vec();
        frame[..3].copy_from_slice(b"GWX");
        assert!(matches!(
            GatewayHandler::new().decode_message(&frame),
            Err(FrameError::Framing(_))
        ));
    }

    #[test]
    fn unknown_payload_type_is_a_framing_error() {
        let (origin, destination) = endpoints();
        let frame = GatewayHandler::new()
            .encode(b"x", "XYZ", 1, &origin, &destination)
            .unwrap();
        assert!(matches!(
            GatewayHandler::new().decode_message(&frame),
            Err(FrameError::Framing(_))
        ));
    }

    #[test]
    fn bad_urn_is_an_identity_error() {
        let text = "GWM MSG 0x00000001 0x00000007 urn:foo 0x00000007 urn:bar payload";
        assert!(matches!(
            GatewayHandler::new().decode_message(text.as_bytes()),
            Err(FrameError::Identity(_))
        ));
    }

    #[test]
    fn empty_payload_is_allowed() {
        let (origin, destination) = endpoints();
        let frame = GatewayHandler::new()
            .encode_message(b"", 1, &origin, &destination)
            .unwrap();
        let decoded = GatewayHandler::new().decode_message(&frame).unwrap();
        assert!(decoded.payload().is_empty());
    }
}
