//! Fixed-width ASCII/hex field encoding shared by every protocol layer.
//!
//! ```text
//! int   "0x" + 8 lowercase hex digits   (10 chars, negatives wrapped to u32)
//! long  "0x" + 16 lowercase hex digits  (18 chars)
//! bool  "t" | "f"                       (1 char)
//! ```
//!
//! Independent fields are followed by [`HexCodec::DELIMITER`]; raw payload
//! regions are written back-to-back without one.

use crate::error::{FrameError, Result};

/// Field widths and delimiter of the hex wire codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexCodec;

impl HexCodec {
    /// Width of an encoded 32-bit integer field.
    pub const INT_LENGTH: usize = 10;
    /// Width of an encoded 64-bit long field.
    pub const LONG_LENGTH: usize = 18;
    /// Width of an encoded boolean field.
    pub const BOOL_LENGTH: usize = 1;
    /// Token written after independent fields.
    pub const DELIMITER: &'static str = " ";

    const HEX_PREFIX: &'static str = "0x";

    /// Encode a 32-bit integer. Negative values use their two's complement bits.
    pub fn encode_int(value: i32) -> String {
        format!("0x{:08x}", value as u32)
    }

    /// Decode a 32-bit integer field, reinterpreting the unsigned wire value.
    pub fn decode_int(field: &str) -> Result<i32> {
        let digits = strip_prefix(field, Self::INT_LENGTH)?;
        u32::from_str_radix(digits, 16)
            .map(|value| value as i32)
            .map_err(|err| FrameError::format(format!("invalid int field {field:?}: {err}")))
    }

    /// Encode a 64-bit long.
    pub fn encode_long(value: u64) -> String {
        format!("0x{value:016x}")
    }

    /// Decode a 64-bit long field.
    pub fn decode_long(field: &str) -> Result<u64> {
        let digits = strip_prefix(field, Self::LONG_LENGTH)?;
        u64::from_str_radix(digits, 16)
            .map_err(|err| FrameError::format(format!("invalid long field {field:?}: {err}")))
    }

    pub fn encode_bool(value: bool) -> &'static str {
        if value {
            "t"
        } else {
            "f"
        }
    }

    pub fn decode_bool(field: &str) -> Result<bool> {
        match field {
            "t" => Ok(true),
            "f" => Ok(false),
            other => Err(FrameError::format(format!(
                "could not decode {other:?} into boolean"
            ))),
        }
    }
}

fn strip_prefix(field: &str, width: usize) -> Result<&str> {
    if field.len() != width {
        return Err(FrameError::format(format!(
            "field {field:?} has width {} (expected {width})",
            field.len()
        )));
    }
    field.strip_prefix(HexCodec::HEX_PREFIX).ok_or_else(|| {
        FrameError::format(format!(
            "field {field:?} is missing the {} prefix",
            HexCodec::HEX_PREFIX
        ))
    })
}
