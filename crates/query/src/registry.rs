//! Schema type registry.
//!
//! Maps external schema type names to a capability bundle: copy a value in
//! canonical form, re-encode it as an order-preserving key, parse a query
//! argument into key form, pad a prefix to the type's lower/upper bound,
//! and report the fixed canonical width (0 when variable). The registry is
//! built once and lives for the process.

use std::collections::HashMap;
use std::sync::OnceLock;

use chainview_types::{ByteReader, write_bytes, write_varuint32};

use crate::error::{Error, Result};
use crate::key_codec::{encode_key_u32, lower_bound_pad, upper_bound_pad};

/// Encoder signature: consume one value from `src`, append to `dest`.
pub type EncodeFn = fn(&mut Vec<u8>, &mut ByteReader<'_>) -> Result<()>;

/// Pad signature: append a bound pattern to `dest`.
pub type PadFn = fn(&mut Vec<u8>) -> Result<()>;

/// Capability bundle for one schema type.
#[derive(Debug)]
pub struct TypeOps {
    /// Schema type name this bundle serves.
    pub name: &'static str,
    /// Copies one canonical value.
    pub encode_value: EncodeFn,
    /// Re-encodes one canonical value in key form.
    pub encode_key: EncodeFn,
    /// Parses one query argument and appends its key form.
    pub encode_query_arg: EncodeFn,
    /// Appends the smallest key pattern of this type's width.
    pub lower_bound_pad: PadFn,
    /// Appends the largest key pattern of this type's width.
    pub upper_bound_pad: PadFn,
    /// Fixed canonical width in bytes, or 0 when variable.
    pub fixed_size: u32,
}

fn copy_fixed<const N: usize>(dest: &mut Vec<u8>, src: &mut ByteReader<'_>) -> Result<()> {
    dest.extend_from_slice(src.read_exact(N)?);
    Ok(())
}

fn key_reverse_fixed<const N: usize>(dest: &mut Vec<u8>, src: &mut ByteReader<'_>) -> Result<()> {
    let bytes = src.read_exact(N)?;
    dest.extend(bytes.iter().rev());
    Ok(())
}

fn copy_var_bytes(dest: &mut Vec<u8>, src: &mut ByteReader<'_>) -> Result<()> {
    let bytes = src.read_bytes()?;
    write_bytes(dest, bytes);
    Ok(())
}

fn copy_varuint32(dest: &mut Vec<u8>, src: &mut ByteReader<'_>) -> Result<()> {
    write_varuint32(dest, src.read_varuint32()?);
    Ok(())
}

/// Widens a LEB128 varuint to its `u32` key form.
fn key_widen_varuint32(dest: &mut Vec<u8>, src: &mut ByteReader<'_>) -> Result<()> {
    encode_key_u32(dest, src.read_varuint32()?);
    Ok(())
}

fn key_unsupported(_dest: &mut Vec<u8>, _src: &mut ByteReader<'_>) -> Result<()> {
    Err(Error::UnsupportedKeyType)
}

fn pad_lower<const N: usize>(dest: &mut Vec<u8>) -> Result<()> {
    lower_bound_pad(dest, N as u32);
    Ok(())
}

fn pad_upper<const N: usize>(dest: &mut Vec<u8>) -> Result<()> {
    upper_bound_pad(dest, N as u32);
    Ok(())
}

fn pad_unsupported(_dest: &mut Vec<u8>) -> Result<()> {
    Err(Error::UnsupportedKeyType)
}

/// A type whose byte-reversed canonical form is its key form.
fn key_type<const N: usize>(name: &'static str) -> TypeOps {
    TypeOps {
        name,
        encode_value: copy_fixed::<N>,
        encode_key: key_reverse_fixed::<N>,
        encode_query_arg: key_reverse_fixed::<N>,
        lower_bound_pad: pad_lower::<N>,
        upper_bound_pad: pad_upper::<N>,
        fixed_size: N as u32,
    }
}

/// A fixed-width type that cannot appear in keys.
fn value_type<const N: usize>(name: &'static str, fixed_size: u32) -> TypeOps {
    TypeOps {
        name,
        encode_value: copy_fixed::<N>,
        encode_key: key_unsupported,
        encode_query_arg: key_unsupported,
        lower_bound_pad: pad_unsupported,
        upper_bound_pad: pad_unsupported,
        fixed_size,
    }
}

/// A variable-width type that cannot appear in keys.
fn var_value_type(name: &'static str) -> TypeOps {
    TypeOps {
        name,
        encode_value: copy_var_bytes,
        encode_key: key_unsupported,
        encode_query_arg: key_unsupported,
        lower_bound_pad: pad_unsupported,
        upper_bound_pad: pad_unsupported,
        fixed_size: 0,
    }
}

fn registry() -> &'static HashMap<&'static str, TypeOps> {
    static REGISTRY: OnceLock<HashMap<&'static str, TypeOps>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let entries = [
            key_type::<1>("bool"),
            TypeOps {
                name: "varuint32",
                encode_value: copy_varuint32,
                encode_key: key_widen_varuint32,
                // Query arguments carry the widened canonical u32.
                encode_query_arg: key_reverse_fixed::<4>,
                lower_bound_pad: pad_unsupported,
                upper_bound_pad: pad_unsupported,
                fixed_size: 0,
            },
            key_type::<1>("uint8"),
            key_type::<2>("uint16"),
            key_type::<4>("uint32"),
            key_type::<8>("uint64"),
            key_type::<16>("uint128"),
            value_type::<1>("int8", 1),
            value_type::<2>("int16", 2),
            value_type::<4>("int32", 4),
            value_type::<8>("int64", 8),
            value_type::<16>("int128", 0),
            value_type::<8>("float64", 0),
            value_type::<16>("float128", 0),
            key_type::<8>("name"),
            var_value_type("string"),
            key_type::<8>("time_point"),
            key_type::<4>("time_point_sec"),
            key_type::<4>("block_timestamp_type"),
            key_type::<32>("checksum256"),
            value_type::<34>("public_key", 0),
            var_value_type("bytes"),
            value_type::<1>("transaction_status", 0),
        ];
        entries.into_iter().map(|ops| (ops.name, ops)).collect()
    })
}

/// Resolves a schema type name to its capability bundle.
pub fn lookup(name: &str) -> Option<&'static TypeOps> {
    registry().get(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn every_declared_type_resolves() {
        for name in [
            "bool",
            "varuint32",
            "uint8",
            "uint16",
            "uint32",
            "uint64",
            "uint128",
            "int8",
            "int16",
            "int32",
            "int64",
            "int128",
            "float64",
            "float128",
            "name",
            "string",
            "time_point",
            "time_point_sec",
            "block_timestamp_type",
            "checksum256",
            "public_key",
            "bytes",
            "transaction_status",
        ] {
            assert!(lookup(name).is_some(), "missing type: {name}");
        }
        assert!(lookup("uint256").is_none());
    }

    #[test]
    fn uint64_key_form_is_big_endian() {
        let ops = lookup("uint64").expect("uint64");
        let canonical = 0x0102_0304_0506_0708u64.to_le_bytes();
        let mut key = Vec::new();
        (ops.encode_key)(&mut key, &mut ByteReader::new(&canonical)).expect("encode");
        assert_eq!(key, [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
    }

    #[test]
    fn varuint32_key_form_widens_to_u32() {
        let ops = lookup("varuint32").expect("varuint32");

        // Row payloads carry LEB128: 300 = [0xac, 0x02].
        let mut key = Vec::new();
        (ops.encode_key)(&mut key, &mut ByteReader::new(&[0xac, 0x02])).expect("encode");
        assert_eq!(key, [0x00, 0x00, 0x01, 0x2c]);

        // Query arguments carry the widened 4-byte form.
        let mut key = Vec::new();
        (ops.encode_query_arg)(&mut key, &mut ByteReader::new(&300u32.to_le_bytes()))
            .expect("encode");
        assert_eq!(key, [0x00, 0x00, 0x01, 0x2c]);
    }

    #[test]
    fn signed_and_float_types_refuse_key_encoding() {
        for name in ["int32", "int64", "float64", "string", "bytes", "public_key"] {
            let ops = lookup(name).expect(name);
            let input = [0u8; 40];
            let mut dest = Vec::new();
            let result = (ops.encode_key)(&mut dest, &mut ByteReader::new(&input));
            assert!(
                matches!(result, Err(Error::UnsupportedKeyType)),
                "{name} must refuse key encoding"
            );
            assert!(matches!((ops.lower_bound_pad)(&mut dest), Err(Error::UnsupportedKeyType)));
        }
    }

    #[test]
    fn fixed_sizes_match_canonical_widths() {
        let expect = [
            ("bool", 1),
            ("uint8", 1),
            ("uint16", 2),
            ("uint32", 4),
            ("uint64", 8),
            ("uint128", 16),
            ("int64", 8),
            ("name", 8),
            ("checksum256", 32),
            ("time_point", 8),
            ("time_point_sec", 4),
            ("block_timestamp_type", 4),
            ("varuint32", 0),
            ("string", 0),
            ("bytes", 0),
            ("transaction_status", 0),
            ("public_key", 0),
            ("float64", 0),
            ("int128", 0),
        ];
        for (name, size) in expect {
            assert_eq!(lookup(name).expect(name).fixed_size, size, "size of {name}");
        }
    }

    #[test]
    fn bound_pads_have_key_width() {
        let ops = lookup("checksum256").expect("checksum256");
        let mut lower = Vec::new();
        let mut upper = Vec::new();
        (ops.lower_bound_pad)(&mut lower).expect("lower");
        (ops.upper_bound_pad)(&mut upper).expect("upper");
        assert_eq!(lower, vec![0x00; 32]);
        assert_eq!(upper, vec![0xff; 32]);
    }

    #[test]
    fn string_value_copy_preserves_prefix() {
        let ops = lookup("string").expect("string");
        let mut src = Vec::new();
        chainview_types::write_string(&mut src, "abc");
        let mut dest = Vec::new();
        (ops.encode_value)(&mut dest, &mut ByteReader::new(&src)).expect("copy");
        assert_eq!(dest, src);
    }
}
