//! Order-preserving scalar key encodings.
//!
//! The store orders keys by raw byte comparison. Canonical scalar encodings
//! are little-endian, which compares in the wrong order, so key forms are
//! the byte reverse of the canonical form: big-endian for unsigned
//! integers, names and timestamps, reversed digest bytes for checksums.
//! Booleans are a single `0x00`/`0x01` byte either way.
//!
//! Signed integers and floats would need sign-bit manipulation no producer
//! performs, and strings/bytes/public keys have no fixed-width total order,
//! so none of them may appear in keys.

use chainview_types::{ByteReader, Checksum256, Name};

use crate::error::Result;

/// Treats `key` as one big-endian integer and adds one, carrying from the
/// last byte toward the first. An all-`0xFF` key silently wraps to zeros.
///
/// Used to form the exclusive upper bound of a prefix scan.
pub fn inc_key(key: &mut [u8]) {
    for byte in key.iter_mut().rev() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            return;
        }
    }
}

/// Appends the key form of a `u8`.
pub fn encode_key_u8(out: &mut Vec<u8>, v: u8) {
    out.push(v);
}

/// Appends the key form of a `u16`.
pub fn encode_key_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

/// Appends the key form of a `u32`.
pub fn encode_key_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}

/// Appends the key form of a `u64`.
pub fn encode_key_u64(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_be_bytes());
}

/// Appends the key form of a `u128`.
pub fn encode_key_u128(out: &mut Vec<u8>, v: u128) {
    out.extend_from_slice(&v.to_be_bytes());
}

/// Appends the key form of a packed name.
pub fn encode_key_name(out: &mut Vec<u8>, name: Name) {
    encode_key_u64(out, name.value());
}

/// Appends the key form of a bool: `0x00` absent, `0x01` present.
pub fn encode_key_bool(out: &mut Vec<u8>, v: bool) {
    out.push(u8::from(v));
}

/// Appends the key form of a 256-bit digest: its canonical bytes reversed.
pub fn encode_key_checksum256(out: &mut Vec<u8>, digest: &Checksum256) {
    out.extend(digest.as_bytes().iter().rev());
}

/// Reads the key form of a `u32`.
pub fn decode_key_u32(reader: &mut ByteReader<'_>) -> Result<u32> {
    let bytes = reader.read_exact(4)?;
    Ok(u32::from_be_bytes(bytes.try_into().expect("length checked")))
}

/// Reads the key form of a `u64`.
pub fn decode_key_u64(reader: &mut ByteReader<'_>) -> Result<u64> {
    let bytes = reader.read_exact(8)?;
    Ok(u64::from_be_bytes(bytes.try_into().expect("length checked")))
}

/// Reads the key form of a `u128`.
pub fn decode_key_u128(reader: &mut ByteReader<'_>) -> Result<u128> {
    let bytes = reader.read_exact(16)?;
    Ok(u128::from_be_bytes(bytes.try_into().expect("length checked")))
}

/// Reads the key form of a packed name.
pub fn decode_key_name(reader: &mut ByteReader<'_>) -> Result<Name> {
    Ok(Name::from_value(decode_key_u64(reader)?))
}

/// Reads the key form of a bool.
pub fn decode_key_bool(reader: &mut ByteReader<'_>) -> Result<bool> {
    Ok(reader.read_u8()? != 0)
}

/// Reads the key form of a 256-bit digest.
pub fn decode_key_checksum256(reader: &mut ByteReader<'_>) -> Result<Checksum256> {
    let bytes = reader.read_exact(32)?;
    let mut out = [0u8; 32];
    for (dst, src) in out.iter_mut().zip(bytes.iter().rev()) {
        *dst = *src;
    }
    Ok(Checksum256::new(out))
}

/// Appends `width` zero bytes: the smallest key of that width.
pub fn lower_bound_pad(out: &mut Vec<u8>, width: u32) {
    out.resize(out.len() + width as usize, 0x00);
}

/// Appends `width` `0xFF` bytes: the largest key of that width.
pub fn upper_bound_pad(out: &mut Vec<u8>, width: u32) {
    out.resize(out.len() + width as usize, 0xff);
}
