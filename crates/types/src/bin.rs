//! Canonical binary codec.
//!
//! Row payloads and query wire bytes use a fixed little-endian layout
//! produced by the ingestion pipeline: scalars as LE bytes, variable-length
//! unsigned integers as LEB128, byte arrays and strings length-prefixed with
//! a varuint. This module is the single place that reads and writes that
//! layout; nothing here goes through serde.

use snafu::Snafu;

use crate::hash::Checksum256;
use crate::name::Name;

/// Errors produced while decoding canonical binary input.
#[derive(Debug, Snafu)]
pub enum CodecError {
    /// Input ended before the requested number of bytes.
    #[snafu(display("Truncated input: needed {needed} bytes, {available} available"))]
    Truncated {
        /// Bytes the caller asked for.
        needed: usize,
        /// Bytes remaining in the input.
        available: usize,
    },

    /// A varuint ran past its maximum width without terminating.
    #[snafu(display("Malformed varuint: continuation past 32 bits"))]
    VaruintOverflow,
}

type Result<T> = std::result::Result<T, CodecError>;

/// Cursor over canonical binary input.
///
/// All reads advance the cursor; a failed read leaves its position
/// unspecified, so callers abort on the first error.
#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a reader over `data`, positioned at the start.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// True when every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Consumes and returns the next `n` bytes.
    pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8]> {
        let available = self.data.len() - self.pos;
        if n > available {
            return Err(CodecError::Truncated { needed: n, available });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Reads one byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_exact(1)?[0])
    }

    /// Reads a little-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_exact(2)?;
        Ok(u16::from_le_bytes(bytes.try_into().expect("length checked")))
    }

    /// Reads a little-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_exact(4)?;
        Ok(u32::from_le_bytes(bytes.try_into().expect("length checked")))
    }

    /// Reads a little-endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64> {
        let bytes = self.read_exact(8)?;
        Ok(u64::from_le_bytes(bytes.try_into().expect("length checked")))
    }

    /// Reads a little-endian `u128`.
    pub fn read_u128(&mut self) -> Result<u128> {
        let bytes = self.read_exact(16)?;
        Ok(u128::from_le_bytes(bytes.try_into().expect("length checked")))
    }

    /// Reads a LEB128 varuint, at most 32 bits of payload.
    pub fn read_varuint32(&mut self) -> Result<u32> {
        let mut value: u64 = 0;
        let mut shift = 0u32;
        loop {
            if shift >= 35 {
                return Err(CodecError::VaruintOverflow);
            }
            let byte = self.read_u8()?;
            value |= u64::from(byte & 0x7f) << shift;
            shift += 7;
            if byte & 0x80 == 0 {
                break;
            }
        }
        if value > u64::from(u32::MAX) {
            return Err(CodecError::VaruintOverflow);
        }
        Ok(value as u32)
    }

    /// Reads a packed 64-bit name.
    pub fn read_name(&mut self) -> Result<Name> {
        Ok(Name::from_value(self.read_u64()?))
    }

    /// Reads a 32-byte digest.
    pub fn read_checksum256(&mut self) -> Result<Checksum256> {
        let bytes = self.read_exact(32)?;
        Ok(Checksum256::new(bytes.try_into().expect("length checked")))
    }

    /// Reads a varuint-length-prefixed byte array.
    pub fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_varuint32()? as usize;
        self.read_exact(len)
    }
}

/// Appends one byte.
pub fn write_u8(out: &mut Vec<u8>, v: u8) {
    out.push(v);
}

/// Appends a little-endian `u16`.
pub fn write_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Appends a little-endian `u32`.
pub fn write_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Appends a little-endian `u64`.
pub fn write_u64(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Appends a little-endian `u128`.
pub fn write_u128(out: &mut Vec<u8>, v: u128) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Appends a LEB128 varuint.
pub fn write_varuint32(out: &mut Vec<u8>, mut v: u32) {
    loop {
        let mut byte = (v & 0x7f) as u8;
        v >>= 7;
        if v != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if v == 0 {
            break;
        }
    }
}

/// Appends a packed 64-bit name.
pub fn write_name(out: &mut Vec<u8>, name: Name) {
    write_u64(out, name.value());
}

/// Appends a 32-byte digest.
pub fn write_checksum256(out: &mut Vec<u8>, digest: &Checksum256) {
    out.extend_from_slice(digest.as_bytes());
}

/// Appends a varuint-length-prefixed byte array.
pub fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    write_varuint32(out, bytes.len() as u32);
    out.extend_from_slice(bytes);
}

/// Appends a varuint-length-prefixed UTF-8 string.
pub fn write_string(out: &mut Vec<u8>, s: &str) {
    write_bytes(out, s.as_bytes());
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn scalar_roundtrip() {
        let mut buf = Vec::new();
        write_u8(&mut buf, 0xab);
        write_u16(&mut buf, 0x1234);
        write_u32(&mut buf, 0xdead_beef);
        write_u64(&mut buf, u64::MAX - 1);
        write_u128(&mut buf, 1u128 << 100);

        let mut reader = ByteReader::new(&buf);
        assert_eq!(reader.read_u8().expect("u8"), 0xab);
        assert_eq!(reader.read_u16().expect("u16"), 0x1234);
        assert_eq!(reader.read_u32().expect("u32"), 0xdead_beef);
        assert_eq!(reader.read_u64().expect("u64"), u64::MAX - 1);
        assert_eq!(reader.read_u128().expect("u128"), 1u128 << 100);
        assert!(reader.is_empty());
    }

    #[test]
    fn varuint_roundtrip() {
        for v in [0u32, 1, 127, 128, 300, 16_383, 16_384, u32::MAX] {
            let mut buf = Vec::new();
            write_varuint32(&mut buf, v);
            let mut reader = ByteReader::new(&buf);
            assert_eq!(reader.read_varuint32().expect("varuint"), v);
            assert!(reader.is_empty());
        }
    }

    #[test]
    fn varuint_single_byte_boundary() {
        let mut buf = Vec::new();
        write_varuint32(&mut buf, 127);
        assert_eq!(buf, vec![0x7f]);

        buf.clear();
        write_varuint32(&mut buf, 128);
        assert_eq!(buf, vec![0x80, 0x01]);
    }

    #[test]
    fn varuint_rejects_overlong() {
        // Six continuation bytes exceed 32 bits of payload.
        let mut reader = ByteReader::new(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x01]);
        assert!(matches!(reader.read_varuint32(), Err(CodecError::VaruintOverflow)));
    }

    #[test]
    fn varuint_rejects_value_past_u32() {
        // Five bytes whose payload is 2^34.
        let mut reader = ByteReader::new(&[0x80, 0x80, 0x80, 0x80, 0x10]);
        assert!(matches!(reader.read_varuint32(), Err(CodecError::VaruintOverflow)));
    }

    #[test]
    fn truncated_read_reports_sizes() {
        let mut reader = ByteReader::new(&[1, 2]);
        let err = reader.read_u32().expect_err("should be truncated");
        match err {
            CodecError::Truncated { needed, available } => {
                assert_eq!(needed, 4);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bytes_roundtrip() {
        let mut buf = Vec::new();
        write_bytes(&mut buf, b"payload");
        write_string(&mut buf, "row");
        let mut reader = ByteReader::new(&buf);
        assert_eq!(reader.read_bytes().expect("bytes"), b"payload");
        assert_eq!(reader.read_bytes().expect("string"), b"row");
    }

    #[test]
    fn empty_bytes_roundtrip() {
        let mut buf = Vec::new();
        write_bytes(&mut buf, b"");
        let mut reader = ByteReader::new(&buf);
        assert_eq!(reader.read_bytes().expect("bytes"), b"");
        assert!(reader.is_empty());
    }
}
