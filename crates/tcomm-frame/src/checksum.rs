//! One's-complement style running checksum used by the tuning and transport layers.
//!
//! Every byte is shifted into one of the four byte lanes of a 32-bit word
//! (big-endian lane order) and summed; carries out of bit 31 are folded back
//! into the low word once the loop finishes. The `[skip_start, skip_end)`
//! window is left out so a frame can carry its own checksum.

use std::ops::Range;

use crate::error::{FrameError, Result};

const LOW_WORD: u64 = 0xffff_ffff;

/// Compute the checksum of `data`, excluding the `skip` window.
///
/// An empty window excludes nothing. A window whose end precedes its start is
/// rejected.
pub fn compute(data: &[u8], skip: Range<usize>) -> Result<u32> {
    if skip.end < skip.start {
        return Err(FrameError::framing(format!(
            "invalid checksum exclusion window {}..{}",
            skip.start, skip.end
        )));
    }

    let mut sum: u64 = 0;
    let mut carry: u64 = 0;
    for (index, &byte) in data.iter().enumerate() {
        if skip.contains(&index) {
            continue;
        }
        let lane = ((index & 3) ^ 3) << 3;
        sum += u64::from(byte) << lane;
        carry += sum >> 32;
        sum &= LOW_WORD;
    }

    while carry != 0 {
        sum += carry;
        carry = sum >> 32;
        sum &= LOW_WORD;
    }

    Ok(sum as u32)
}

/// Recompute the checksum of `data` and compare it bit-for-bit with `expected`.
pub fn validate(expected: u32, data: &[u8], skip: Range<usize>) -> Result<()> {
    let actual = compute(data, skip)?;
    if actual != expected {
        return Err(FrameError::Checksum { expected, actual });
    }
    Ok(())
}
