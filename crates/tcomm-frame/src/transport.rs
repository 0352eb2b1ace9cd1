//! Transport ("Alpha") layer: sequenced, checksummed message envelope.
//!
//! Wire format (every header field is followed by a delimiter):
//! ```text
//! ┌──────┬─────────┬────────────┬──────┬─────┬──────────┬──────────────┬─────────┬────────┐
//! │ type │ channel │ message id │ more │ seq │ checksum │ total length │ payload │ "FABE" │
//! │ 3B   │ int     │ int        │ bool │ int │ int      │ int          │ raw     │        │
//! └──────┴─────────┴────────────┴──────┴─────┴──────────┴──────────────┴─────────┴────────┘
//! ```
//!
//! The checksum covers the whole frame except the checksum field. Payloads are
//! never inspected.

use bytes::Bytes;
use rand::Rng;
use serde_json::{Map, Value};

use crate::checksum;
use crate::codec::HexCodec;
use crate::cursor::{CursorBuffer, Delimiter};
use crate::error::{FrameError, Result};
use crate::handler::Decoder;
use crate::message::{Message, MESSAGE_TYPE, REQUEST_TYPE, TYPE_LENGTH};

/// Footer token closing every transport frame.
pub const TRANSPORT_FOOTER: &str = "FABE";

/// Default maximum fragment size when the gateway does not negotiate one.
pub const DEFAULT_MAX_FRAGMENT_SIZE: usize = 16_000;

/// Default receive window when the gateway does not negotiate one.
pub const DEFAULT_RECEIVE_WINDOW_SIZE: usize = 16;

const INITIAL_SEQUENCE: i32 = 1;
const MESSAGE_ID_SEED_RANGE: std::ops::Range<u32> = 0..1_000_000_000;

/// Parameters negotiated during tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportParams {
    pub max_fragment_size: usize,
    pub receive_window_size: usize,
    pub chosen_encoding: Option<String>,
}

impl Default for TransportParams {
    fn default() -> Self {
        Self {
            max_fragment_size: DEFAULT_MAX_FRAGMENT_SIZE,
            receive_window_size: DEFAULT_RECEIVE_WINDOW_SIZE,
            chosen_encoding: None,
        }
    }
}

impl TransportParams {
    /// Build parameters from a prefix-stripped tuning parameter map.
    ///
    /// Numeric values may arrive as JSON strings or numbers. Missing values
    /// fall back to the defaults.
    pub fn from_parameters(parameters: &Map<String, Value>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            max_fragment_size: size_param(parameters, "maxFragmentSize")?
                .unwrap_or(defaults.max_fragment_size),
            receive_window_size: size_param(parameters, "receiveWindowSize")?
                .unwrap_or(defaults.receive_window_size),
            chosen_encoding: parameters
                .get("chosenEncoding")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

fn size_param(parameters: &Map<String, Value>, name: &str) -> Result<Option<usize>> {
    let parsed = match parameters.get(name) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(text)) => text.trim().parse::<usize>().ok(),
        Some(Value::Number(number)) => number.as_u64().and_then(|n| usize::try_from(n).ok()),
        Some(_) => None,
    };
    parsed
        .filter(|value| *value > 0)
        .map(Some)
        .ok_or_else(|| FrameError::framing(format!("invalid transport parameter {name}")))
}

/// Every header field of a decoded transport frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFrame {
    pub message: Message,
    pub message_id: i32,
    pub more_fragments: bool,
    pub sequence: i32,
}

/// Stateless transport frame decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportDecoder;

impl TransportDecoder {
    pub fn decode_frame(&self, data: &[u8]) -> Result<TransportFrame> {
        let mut buf = CursorBuffer::new(data);
        let message_type = buf.read_ascii(TYPE_LENGTH, Delimiter::Follows)?;
        let channel = buf.read_int(Delimiter::Follows)?;
        let message_id = buf.read_int(Delimiter::Follows)?;
        let more_fragments = buf.read_bool(Delimiter::Follows)?;
        let sequence = buf.read_int(Delimiter::Follows)?;

        let checksum_at = buf.offset();
        let expected = buf.read_int(Delimiter::Follows)? as u32;
        checksum::validate(expected, data, checksum_at..buf.offset())?;

        let total = buf.read_int(Delimiter::Follows)?;
        if usize::try_from(total).ok() != Some(data.len()) {
            return Err(FrameError::framing(format!(
                "transport length field {total} does not match frame length {}",
                data.len()
            )));
        }
        let payload_len = data
            .len()
            .checked_sub(TRANSPORT_FOOTER.len() + buf.offset())
            .ok_or_else(|| FrameError::framing("transport frame too short for its footer"))?;
        let payload = buf.read_bytes(payload_len, Delimiter::Omitted)?;

        let footer = buf.read_ascii(TRANSPORT_FOOTER.len(), Delimiter::Omitted)?;
        if footer != TRANSPORT_FOOTER {
            return Err(FrameError::framing(format!(
                "transport footer {footer:?} != {TRANSPORT_FOOTER:?}"
            )));
        }

        Ok(TransportFrame {
            message: Message {
                channel,
                message_type,
                payload,
            },
            message_id,
            more_fragments,
            sequence,
        })
    }

    pub fn decode_message(&self, data: &[u8]) -> Result<Message> {
        self.decode_frame(data).map(|frame| frame.message)
    }
}

impl Decoder for TransportDecoder {
    type Output = Message;

    fn decode(&self, data: &[u8]) -> Result<Message> {
        self.decode_message(data)
    }
}

/// Transport encoder owning the per-session message id counter.
///
/// Every payload is sent as a single fragment: the more-fragments flag is
/// always false and the sequence number stays at its initial value.
#[derive(Debug)]
pub struct TransportHandler {
    params: TransportParams,
    next_message_id: u32,
    more_fragments: bool,
    sequence: i32,
}

impl TransportHandler {
    /// Create a handler with a randomly seeded message id counter.
    pub fn new(params: TransportParams) -> Self {
        let seed = rand::thread_rng().gen_range(MESSAGE_ID_SEED_RANGE);
        Self::with_message_id(params, seed)
    }

    /// Create a handler whose first message id is `first_message_id`.
    pub fn with_message_id(params: TransportParams, first_message_id: u32) -> Self {
        Self {
            params,
            next_message_id: first_message_id,
            more_fragments: false,
            sequence: INITIAL_SEQUENCE,
        }
    }

    pub fn params(&self) -> &TransportParams {
        &self.params
    }

    /// The message id the next encoded frame will carry.
    pub fn next_message_id(&self) -> u32 {
        self.next_message_id
    }

    pub fn decoder(&self) -> TransportDecoder {
        TransportDecoder
    }

    /// Exact wire length of a transport frame carrying `payload_len` bytes.
    pub fn frame_len(payload_len: usize) -> usize {
        let delimiter = HexCodec::DELIMITER.len();
        TYPE_LENGTH
            + delimiter
            + 5 * (HexCodec::INT_LENGTH + delimiter)
            + HexCodec::BOOL_LENGTH
            + delimiter
            + payload_len
            + TRANSPORT_FOOTER.len()
    }

    pub fn encode(&mut self, payload: &[u8], message_type: &str, channel: i32) -> Result<Bytes> {
        if message_type.len() != TYPE_LENGTH {
            return Err(FrameError::framing(format!(
                "message type {message_type:?} must be {TYPE_LENGTH} characters"
            )));
        }
        if payload.len() > self.params.max_fragment_size {
            tracing::warn!(
                size = payload.len(),
                max = self.params.max_fragment_size,
                "payload exceeds negotiated fragment size; sending unfragmented"
            );
        }

        let total = Self::frame_len(payload.len());
        let total_field = i32::try_from(total).map_err(|_| {
            FrameError::framing(format!("transport frame too large: {total} bytes"))
        })?;

        let message_id = self.next_message_id;
        self.next_message_id = self.next_message_id.wrapping_add(1);

        let mut buf = CursorBuffer::with_capacity(total);
        buf.append_ascii(message_type, Delimiter::Follows)?;
        buf.append_int(channel, Delimiter::Follows);
        buf.append_int(message_id as i32, Delimiter::Follows);
        buf.append_bool(self.more_fragments, Delimiter::Follows);
        buf.append_int(self.sequence, Delimiter::Follows);
        let checksum_at = buf.offset();
        buf.append_int(0, Delimiter::Follows);
        let checksum_end = buf.offset();
        buf.append_int(total_field, Delimiter::Follows);
        buf.append_bytes(payload, Delimiter::Omitted);
        buf.append_ascii(TRANSPORT_FOOTER, Delimiter::Omitted)?;

        let sum = checksum::compute(buf.as_slice(), checksum_at..checksum_end)?;
        buf.seek(checksum_at);
        buf.append_int(sum as i32, Delimiter::Follows);
        Ok(buf.into_bytes())
    }

    pub fn encode_message(&mut self, payload: &[u8], channel: i32) -> Result<Bytes> {
        self.encode(payload, MESSAGE_TYPE, channel)
    }

    pub fn encode_request(&mut self, payload: &[u8], channel: i32) -> Result<Bytes> {
        self.encode(payload, REQUEST_TYPE, channel)
    }

    pub fn decode_message(&self, data: &[u8]) -> Result<Message> {
        self.decoder().decode_message(data)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::channel::GW_CHANNEL;

    fn handler() -> TransportHandler {
        TransportHandler::with_message_id(TransportParams::default(), 0x10)
    }

    #[test]
    fn payload_round_trips_byte_for_byte() {
        let mut handler = handler();
        let payload: Vec<u8> = (0u8..=255).collect();
        let frame = handler.encode_message(&payload, GW_CHANNEL).unwrap();

        let message = handler.decode_message(&frame).unwrap();
        assert_eq!(message.channel, GW_CHANNEL);
        assert_eq!(message.message_type, MESSAGE_TYPE);
        assert_eq!(message.payload.as_ref(), payload.as_slice());
    }

    #[test]
    fn header_fields_are_written_in_order() {
        let mut handler = handler();
        let frame = handler.encode_request(b"hi", 866).unwrap();
        assert!(frame.starts_with(b"RQS 0x00000362 0x00000010 f 0x00000001 "));
        assert!(frame.ends_with(b"hiFABE"));
        assert_eq!(frame.len(), TransportHandler::frame_len(2));
    }

    #[test]
    fn message_id_increments_per_frame() {
        let mut handler = handler();
        let first = handler.encode_message(b"a", 1).unwrap();
        let second = handler.encode_message(b"b", 1).unwrap();

        let decoder = handler.decoder();
        assert_eq!(decoder.decode_frame(&first).unwrap().message_id, 0x10);
        assert_eq!(decoder.decode_frame(&second).unwrap().message_id, 0x11);
        assert_eq!(handler.next_message_id(), 0x12);
    }

    #[test]
    fn single_fragment_flags() {
        let mut handler = handler();
        let frame = handler.encode_message(b"x", 1).unwrap();
        let decoded = TransportDecoder.decode_frame(&frame).unwrap();
        assert!(!decoded.more_fragments);
        assert_eq!(decoded.sequence, 1);
    }

    #[test]
    fn independent_handlers_have_independent_counters() {
        let mut a = TransportHandler::with_message_id(TransportParams::default(), 5);
        let b = TransportHandler::with_message_id(TransportParams::default(), 500);
        a.encode_message(b"x", 1).unwrap();
        assert_eq!(a.next_message_id(), 6);
        assert_eq!(b.next_message_id(), 500);
    }

    #[test]
    fn corrupted_payload_fails_checksum() {
        let mut handler = handler();
        let mut frame = handler.encode_message(b"payload", 1).unwrap().to_vec();
        let at = frame.len() - TRANSPORT_FOOTER.len() - 1;
        frame[at] ^= 0x20;
        assert!(matches!(
            handler.decode_message(&frame),
            Err(FrameError::Checksum { .. })
        ));
    }

    #[test]
    fn corrupted_header_fails_checksum() {
        let field = HexCodec::INT_LENGTH + HexCodec::DELIMITER.len();
        let message_id_at = TYPE_LENGTH + HexCodec::DELIMITER.len() + field;
        let checksum_at =
            message_id_at + field + HexCodec::BOOL_LENGTH + HexCodec::DELIMITER.len() + field;

        let mut handler = handler();
        let frame = handler.encode_message(b"payload", 1).unwrap().to_vec();
        // Last digit of the message id, last digit of the sequence number,
        // and first digit of the total length: either side of the checksum.
        for at in [message_id_at + 9, checksum_at - 2, checksum_at + field] {
            let mut tampered = frame.clone();
            tampered[at] = if tampered[at] == b'0' { b'1' } else { b'0' };
            assert!(
                matches!(
                    handler.decode_message(&tampered),
                    Err(FrameError::Checksum { .. })
                ),
                "flip at byte {at} went unnoticed"
            );
        }
    }

    #[test]
    fn truncated_frame_is_rejected() {
        let mut handler = handler();
        let frame = handler.encode_message(b"payload", 1).unwrap();
        let result = handler.decode_message(&frame[..frame.len() - 2]);
        assert!(result.is_err());
    }

    #[test]
    fn params_parse_string_values_and_fall_back_to_defaults() {
        let params = TransportParams::from_parameters(
            json!({ "maxFragmentSize": "8000" }).as_object().unwrap(),
        )
        .unwrap();
        assert_eq!(params.max_fragment_size, 8000);
        assert_eq!(params.receive_window_size, DEFAULT_RECEIVE_WINDOW_SIZE);
        assert!(params.chosen_encoding.is_none());

        let params = TransportParams::from_parameters(
            json!({ "receiveWindowSize": 32, "chosenEncoding": "hex" })
                .as_object()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(params.receive_window_size, 32);
        assert_eq!(params.chosen_encoding.as_deref(), Some("hex"));
    }

    #[test]
    fn params_reject_garbage() {
        let result = TransportParams::from_parameters(
            json!({ "maxFragmentSize": "lots" }).as_object().unwrap(),
        );
        assert!(matches!(result, Err(FrameError::Framing(_))));
    }

    #[test]
    fn wrong_type_width_is_rejected() {
        let mut handler = handler();
        assert!(matches!(
            handler.encode(b"x", "MESSAGE", 1),
            Err(FrameError::Framing(_))
        ));
    }
}
