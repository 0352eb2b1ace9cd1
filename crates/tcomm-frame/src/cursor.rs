use bytes::Bytes;

use crate::codec::HexCodec;
use crate::error::{FrameError, Result};

/// Whether a delimiter follows a field.
///
/// Raw payload regions (tuning payload, transport payload, footers) are
/// written back-to-back, so they use [`Delimiter::Omitted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Follows,
    Omitted,
}

/// Fixed-capacity byte buffer with a single advancing offset.
///
/// Encoders size the buffer exactly up front; writing past the capacity is a
/// bug in the caller and panics. Reads come from the network, so running off
/// the end is reported as [`FrameError::Format`].
#[derive(Debug, Clone)]
pub struct CursorBuffer<B> {
    buf: B,
    offset: usize,
}

impl CursorBuffer<Vec<u8>> {
    /// Allocate a zero-filled buffer of exactly `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity],
            offset: 0,
        }
    }

    /// Consume the buffer and return its contents.
    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.buf)
    }
}

impl<B: AsRef<[u8]>> CursorBuffer<B> {
    /// Wrap existing bytes for reading.
    pub fn new(buf: B) -> Self {
        Self { buf, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn capacity(&self) -> usize {
        self.buf.as_ref().len()
    }

    /// Bytes left between the offset and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.offset
    }

    pub fn as_slice(&self) -> &[u8] {
        self.buf.as_ref()
    }

    /// Move the offset to an absolute position.
    ///
    /// # Panics
    /// Panics if `offset` lies beyond the capacity.
    pub fn seek(&mut self, offset: usize) {
        assert!(
            offset <= self.capacity(),
            "seek to {offset} beyond capacity {}",
            self.capacity()
        );
        self.offset = offset;
    }

    fn take(&mut self, len: usize) -> Result<&[u8]> {
        if len > self.remaining() {
            return Err(FrameError::format(format!(
                "read of {len} bytes at offset {} exceeds frame length {}",
                self.offset,
                self.capacity()
            )));
        }
        let start = self.offset;
        self.offset += len;
        Ok(&self.buf.as_ref()[start..start + len])
    }

    pub fn read_delimiter(&mut self) -> Result<()> {
        let at = self.offset;
        let token = self.take(HexCodec::DELIMITER.len())?;
        if token != HexCodec::DELIMITER.as_bytes() {
            return Err(FrameError::format(format!("delimiter not found at {at}")));
        }
        Ok(())
    }

    fn finish_field(&mut self, delimiter: Delimiter) -> Result<()> {
        match delimiter {
            Delimiter::Follows => self.read_delimiter(),
            Delimiter::Omitted => Ok(()),
        }
    }

    pub fn read_ascii(&mut self, len: usize, delimiter: Delimiter) -> Result<String> {
        let at = self.offset;
        let raw = self.take(len)?;
        if !raw.is_ascii() {
            return Err(FrameError::format(format!(
                "non-ascii data in {len}-byte field at {at}"
            )));
        }
        // ASCII is valid UTF-8.
        let text = String::from_utf8_lossy(raw).into_owned();
        self.finish_field(delimiter)?;
        Ok(text)
    }

    pub fn read_bytes(&mut self, len: usize, delimiter: Delimiter) -> Result<Bytes> {
        let bytes = Bytes::copy_from_slice(self.take(len)?);
        self.finish_field(delimiter)?;
        Ok(bytes)
    }

    pub fn read_int(&mut self, delimiter: Delimiter) -> Result<i32> {
        let field = self.read_ascii(HexCodec::INT_LENGTH, delimiter)?;
        HexCodec::decode_int(&field)
    }

    pub fn read_long(&mut self, delimiter: Delimiter) -> Result<u64> {
        let field = self.read_ascii(HexCodec::LONG_LENGTH, delimiter)?;
        HexCodec::decode_long(&field)
    }

    pub fn read_bool(&mut self, delimiter: Delimiter) -> Result<bool> {
        let field = self.read_ascii(HexCodec::BOOL_LENGTH, delimiter)?;
        HexCodec::decode_bool(&field)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> CursorBuffer<B> {
    fn put(&mut self, data: &[u8]) {
        let end = self.offset + data.len();
        assert!(
            end <= self.capacity(),
            "write of {} bytes at offset {} exceeds capacity {}",
            data.len(),
            self.offset,
            self.capacity()
        );
        self.buf.as_mut()[self.offset..end].copy_from_slice(data);
        self.offset = end;
    }

    pub fn append_delimiter(&mut self) {
        self.put(HexCodec::DELIMITER.as_bytes());
    }

    fn close_field(&mut self, delimiter: Delimiter) {
        if delimiter == Delimiter::Follows {
            self.append_delimiter();
        }
    }

    /// Append an ASCII string. Characters above 127 are rejected before
    /// anything is written.
    pub fn append_ascii(&mut self, text: &str, delimiter: Delimiter) -> Result<()> {
        if !text.is_ascii() {
            return Err(FrameError::format(format!(
                "string does not appear to be ascii: {text:?}"
            )));
        }
        self.put(text.as_bytes());
        self.close_field(delimiter);
        Ok(())
    }

    pub fn append_bytes(&mut self, data: &[u8], delimiter: Delimiter) {
        self.put(data);
        self.close_field(delimiter);
    }

    pub fn append_int(&mut self, value: i32, delimiter: Delimiter) {
        self.put(HexCodec::encode_int(value).as_bytes());
        self.close_field(delimiter);
    }

    pub fn append_long(&mut self, value: u64, delimiter: Delimiter) {
        self.put(HexCodec::encode_long(value).as_bytes());
        self.close_field(delimiter);
    }

    pub fn append_bool(&mut self, value: bool, delimiter: Delimiter) {
        self.put(HexCodec::encode_bool(value).as_bytes());
        self.close_field(delimiter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_fields_with_delimiters() {
        let mut buf = CursorBuffer::with_capacity(HexCodec::INT_LENGTH + 1 + 2 + 3);
        buf.append_int(1, Delimiter::Follows);
        buf.append_bool(true, Delimiter::Follows);
        buf.append_ascii("abc", Delimiter::Omitted).unwrap();
        assert_eq!(buf.remaining(), 0);
        assert_eq!(buf.into_bytes().as_ref(), b"0x00000001 t abc");
    }

    #[test]
    fn reads_back_what_was_written() {
        let mut buf = CursorBuffer::new(b"0x0000002a t 0x00000000000000ffpayload".to_vec());
        assert_eq!(buf.read_int(Delimiter::Follows).unwrap(), 42);
        assert!(buf.read_bool(Delimiter::Follows).unwrap());
        assert_eq!(buf.read_long(Delimiter::Omitted).unwrap(), 255);
        let rest = buf.remaining();
        assert_eq!(
            buf.read_bytes(rest, Delimiter::Omitted).unwrap().as_ref(),
            b"payload"
        );
    }

    #[test]
    fn seek_back_overwrites_in_place() {
        let mut buf = CursorBuffer::with_capacity(2 * (HexCodec::INT_LENGTH + 1));
        buf.append_int(0, Delimiter::Follows);
        buf.append_int(7, Delimiter::Follows);
        buf.seek(0);
        buf.append_int(-1, Delimiter::Follows);
        assert_eq!(buf.offset(), HexCodec::INT_LENGTH + 1);
        assert_eq!(buf.into_bytes().as_ref(), b"0xffffffff 0x00000007 ");
    }

    #[test]
    fn missing_delimiter_is_a_format_error() {
        let mut buf = CursorBuffer::new(b"0x00000001x".as_slice());
        assert!(matches!(
            buf.read_int(Delimiter::Follows),
            Err(FrameError::Format(_))
        ));
    }

    #[test]
    fn read_past_end_is_a_format_error() {
        let mut buf = CursorBuffer::new(b"0x0000".as_slice());
        assert!(matches!(
            buf.read_int(Delimiter::Omitted),
            Err(FrameError::Format(_))
        ));
    }

    #[test]
    fn non_ascii_string_is_rejected() {
        let mut buf = CursorBuffer::with_capacity(8);
        let result = buf.append_ascii("héllo", Delimiter::Omitted);
        assert!(matches!(result, Err(FrameError::Format(_))));
        assert_eq!(buf.offset(), 0);
    }

    #[test]
    #[should_panic(expected = "exceeds capacity")]
    fn writing_past_capacity_panics() {
        let mut buf = CursorBuffer::with_capacity(4);
        buf.append_int(1, Delimiter::Omitted);
    }
}
