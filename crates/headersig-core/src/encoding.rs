//! Binary encoding primitives for ledger headers
//!
//! Little-endian fixed-width integers plus a variable-length integer prefix
//! for byte strings and lists:
//!
//! ```text
//! value < 0xFD        -> 1 byte
//! value <= 0xFFFF     -> 0xFD ‖ u16
//! value <= 0xFFFF_FFFF -> 0xFE ‖ u32
//! otherwise           -> 0xFF ‖ u64
//! ```
//!
//! Decoding rejects non-minimal var-ints so every value has exactly one
//! encoding, which keeps header hashes unambiguous.

use crate::error::{HeaderSigError, Result};

/// Append-only encoder
#[derive(Debug, Default)]
pub struct Sink {
    buf: Vec<u8>,
}

impl Sink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the sink and return the encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Write raw bytes without a length prefix
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a single byte
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Write a little-endian u16
    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a little-endian u32
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a little-endian u64
    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a variable-length integer
    pub fn write_var_uint(&mut self, value: u64) {
        if value < 0xFD {
            self.write_u8(value as u8);
        } else if value <= u64::from(u16::MAX) {
            self.write_u8(0xFD);
            self.write_u16(value as u16);
        } else if value <= u64::from(u32::MAX) {
            self.write_u8(0xFE);
            self.write_u32(value as u32);
        } else {
            self.write_u8(0xFF);
            self.write_u64(value);
        }
    }

    /// Write a length-prefixed byte string
    pub fn write_var_bytes(&mut self, bytes: &[u8]) {
        self.write_var_uint(bytes.len() as u64);
        self.write_bytes(bytes);
    }
}

/// Cursor-based decoder over a borrowed buffer
#[derive(Debug)]
pub struct Source<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Source<'a> {
    /// Start decoding at the beginning of `buf`
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Fail unless the whole buffer was consumed
    pub fn finish(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(decode_error(format!("{n} trailing bytes"))),
        }
    }

    /// Read exactly `len` raw bytes
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(decode_error(format!(
                "unexpected end of input at offset {}: need {len} bytes, have {}",
                self.pos,
                self.remaining()
            )));
        }
        let out = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    /// Read a fixed-size array
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Read a little-endian u16
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian u32
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian u64
    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read a variable-length integer, rejecting non-minimal forms
    pub fn read_var_uint(&mut self) -> Result<u64> {
        let (value, min) = match self.read_u8()? {
            0xFD => (u64::from(self.read_u16()?), 0xFD),
            0xFE => (u64::from(self.read_u32()?), 0x1_0000),
            0xFF => (self.read_u64()?, 0x1_0000_0000),
            small => return Ok(u64::from(small)),
        };
        if value < min {
            return Err(decode_error(format!("non-canonical var-int {value}")));
        }
        Ok(value)
    }

    /// Read a length-prefixed byte string
    pub fn read_var_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_var_uint()?;
        let len = usize::try_from(len)
            .map_err(|_| decode_error(format!("byte string length {len} too large")))?;
        self.read_bytes(len)
    }
}

fn decode_error(message: String) -> HeaderSigError {
    HeaderSigError::transport(format!("header decode failed: {message}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_uint_boundaries() {
        let cases: [(u64, usize); 6] = [
            (0, 1),
            (0xFC, 1),
            (0xFD, 3),
            (0xFFFF, 3),
            (0x1_0000, 5),
            (0x1_0000_0000, 9),
        ];
        for (value, len) in cases {
            let mut sink = Sink::new();
            sink.write_var_uint(value);
            let bytes = sink.into_bytes();
            assert_eq!(bytes.len(), len, "encoded length of {value:#x}");
            let mut source = Source::new(&bytes);
            assert_eq!(source.read_var_uint().unwrap(), value);
            source.finish().unwrap();
        }
    }

    #[test]
    fn test_non_canonical_var_uint_rejected() {
        // 5 encoded with a u16 prefix
        let bytes = [0xFD, 0x05, 0x00];
        assert!(Source::new(&bytes).read_var_uint().is_err());
    }

    #[test]
    fn test_truncated_var_bytes_rejected() {
        let bytes = [0x04, 0x01, 0x02];
        assert!(Source::new(&bytes).read_var_bytes().is_err());
    }

    #[test]
    fn test_trailing_bytes_detected() {
        let bytes = [0x01, 0x02];
        let mut source = Source::new(&bytes);
        source.read_u8().unwrap();
        assert!(source.finish().is_err());
    }
}
