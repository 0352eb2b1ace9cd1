//! Tuning layer: the once-per-session handshake frame.
//!
//! Wire format:
//! ```text
//! ┌──────────────┬──────────────┬──────────────────┬────────┐
//! │ checksum int │ total length │ payload (ASCII)  │ "TUNE" │
//! │ + delimiter  │ + delimiter  │ no delimiter     │        │
//! └──────────────┴──────────────┴──────────────────┴────────┘
//! ```
//!
//! The checksum covers everything except the checksum field itself.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::checksum;
use crate::codec::HexCodec;
use crate::cursor::{CursorBuffer, Delimiter};
use crate::error::{FrameError, Result};
use crate::handler::Decoder;

/// Footer token closing every tuning frame.
pub const TUNING_FOOTER: &str = "TUNE";

/// The only transport protocol variant this client speaks.
pub const PROTOCOL_ALPHA: &str = "A:H";

/// Parameter key prefix used by the gateway for transport parameters.
pub const ALPHA_PARAMETER_PREFIX: &str = "AlphaProtocolHandler";

/// A protocol variant with its parameters, as exchanged during tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TuningOffer {
    pub protocol_name: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl TuningOffer {
    /// Interpret a decoded tuning payload as an offer.
    pub fn from_value(value: &Value) -> Result<Self> {
        Self::deserialize(value).map_err(|err| {
            FrameError::framing(format!("tuning payload is not a protocol offer: {err}"))
        })
    }
}

/// Protocol variants offered to the gateway, in preference order.
pub fn supported_protocols() -> Vec<TuningOffer> {
    let mut parameters = Map::new();
    parameters.insert(
        format!("{ALPHA_PARAMETER_PREFIX}.receiveWindowSize"),
        Value::String("16".to_string()),
    );
    parameters.insert(
        format!("{ALPHA_PARAMETER_PREFIX}.maxFragmentSize"),
        Value::String("16000".to_string()),
    );
    vec![TuningOffer {
        protocol_name: PROTOCOL_ALPHA.to_string(),
        parameters,
    }]
}

/// Drop the `<Handler>.` prefix from every parameter key.
///
/// Keys without a dot are kept as they are; values are never touched.
pub fn strip_parameter_prefixes(parameters: &Map<String, Value>) -> Map<String, Value> {
    parameters
        .iter()
        .map(|(key, value)| {
            let name = key.split_once('.').map_or(key.as_str(), |(_, name)| name);
            (name.to_string(), value.clone())
        })
        .collect()
}

/// Encoder/decoder for tuning frames. Stateless.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TuningHandler;

impl TuningHandler {
    pub fn new() -> Self {
        Self
    }

    /// Exact wire length of a tuning frame carrying `payload_len` bytes.
    pub fn frame_len(payload_len: usize) -> usize {
        let delimiter = HexCodec::DELIMITER.len();
        HexCodec::INT_LENGTH
            + delimiter
            + HexCodec::INT_LENGTH
            + delimiter
            + payload_len
            + TUNING_FOOTER.len()
    }

    /// Wrap an ASCII string payload in a tuning frame.
    pub fn encode(&self, payload: &str) -> Result<Bytes> {
        let total = Self::frame_len(payload.len());
        let total_field = i32::try_from(total)
            .map_err(|_| FrameError::framing(format!("tuning frame too large: {total} bytes")))?;

        let mut buf = CursorBuffer::with_capacity(total);
        let checksum_at = buf.offset();
        buf.append_int(0, Delimiter::Follows);
        let checksum_end = buf.offset();
        buf.append_int(total_field, Delimiter::Follows);
        buf.append_ascii(payload, Delimiter::Omitted)?;
        buf.append_ascii(TUNING_FOOTER, Delimiter::Omitted)?;

        let sum = checksum::compute(buf.as_slice(), checksum_at..checksum_end)?;
        buf.seek(checksum_at);
        buf.append_int(sum as i32, Delimiter::Follows);
        Ok(buf.into_bytes())
    }

    /// Serialize `value` as JSON and wrap it in a tuning frame.
    pub fn encode_json(&self, value: &Value) -> Result<Bytes> {
        let payload = serde_json::to_string(value)?;
        self.encode(&payload)
    }

    /// Validate a tuning frame and parse its payload as JSON.
    pub fn decode_message(&self, data: &[u8]) -> Result<Value> {
        let mut buf = CursorBuffer::new(data);
        let checksum_at = buf.offset();
        let expected = buf.read_int(Delimiter::Follows)? as u32;
        checksum::validate(expected, data, checksum_at..buf.offset())?;

        let total = buf.read_int(Delimiter::Follows)?;
        if usize::try_from(total).ok() != Some(data.len()) {
            return Err(FrameError::framing(format!(
                "tuning length field {total} does not match frame length {}",
                data.len()
            )));
        }

        let payload_len = data
            .len()
            .checked_sub(TUNING_FOOTER.len() + buf.offset())
            .ok_or_else(|| FrameError::framing("tuning frame too short for its footer"))?;
        let payload = buf.read_bytes(payload_len, Delimiter::Omitted)?;

        let footer = buf.read_ascii(TUNING_FOOTER.len(), Delimiter::Omitted)?;
        if footer != TUNING_FOOTER {
            return Err(FrameError::framing(format!(
                "tuning footer {footer:?} != {TUNING_FOOTER:?}"
            )));
        }

        serde_json::from_slice(&payload).map_err(|err| {
            FrameError::framing(format!("tuning payload was not valid json: {err}"))
        })
    }
}

impl Decoder for TuningHandler {
    type Output = Value;

    fn decode(&self, data: &[u8]) -> Result<Value> {
        self.decode_message(data)
    }
}
