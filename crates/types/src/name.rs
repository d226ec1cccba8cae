//! 64-bit base-32 packed identifiers.
//!
//! A `Name` packs up to 13 characters from the alphabet `.12345a-z` into a
//! `u64`: five bits per character for the first twelve, four bits for the
//! thirteenth. The packing places earlier characters in higher bits, so the
//! numeric order of the packed value matches the alphabet order of the
//! string.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// Characters in packing order; index = symbol value.
const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

/// Errors from parsing a name string.
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum NameError {
    /// The string is longer than 13 characters.
    #[snafu(display("Name '{input}' is longer than 13 characters"))]
    TooLong {
        /// The offending input.
        input: String,
    },

    /// A character is outside the `.12345a-z` alphabet.
    #[snafu(display("Name '{input}' contains invalid character '{ch}'"))]
    InvalidChar {
        /// The offending input.
        input: String,
        /// The character that failed.
        ch: char,
    },

    /// The 13th character only has four bits; it must be one of `.12345a-j`.
    #[snafu(display("Name '{input}': 13th character '{ch}' does not fit in four bits"))]
    InvalidThirteenth {
        /// The offending input.
        input: String,
        /// The character that failed.
        ch: char,
    },
}

/// A 64-bit packed identifier used for table and index short names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name(u64);

impl Name {
    /// Creates a name from its raw packed value.
    #[inline]
    pub const fn from_value(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw packed value.
    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// The empty name (all dots).
    pub const EMPTY: Name = Name(0);
}

fn char_to_symbol(c: u8) -> Option<u8> {
    match c {
        b'a'..=b'z' => Some(c - b'a' + 6),
        b'1'..=b'5' => Some(c - b'1' + 1),
        b'.' => Some(0),
        _ => None,
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() > 13 {
            return Err(NameError::TooLong { input: s.to_string() });
        }
        let mut value: u64 = 0;
        for (i, &b) in bytes.iter().enumerate() {
            let sym = char_to_symbol(b).ok_or_else(|| NameError::InvalidChar {
                input: s.to_string(),
                ch: b as char,
            })? as u64;
            if i < 12 {
                value |= (sym & 0x1f) << (64 - 5 * (i as u64 + 1));
            } else {
                if sym > 0x0f {
                    return Err(NameError::InvalidThirteenth {
                        input: s.to_string(),
                        ch: b as char,
                    });
                }
                value |= sym;
            }
        }
        Ok(Name(value))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chars = [b'.'; 13];
        let mut tmp = self.0;
        for i in 0..13 {
            let mask = if i == 0 { 0x0f } else { 0x1f };
            chars[12 - i] = CHARMAP[(tmp & mask) as usize];
            tmp >>= if i == 0 { 4 } else { 5 };
        }
        let end = chars.iter().rposition(|&c| c != b'.').map_or(0, |p| p + 1);
        // CHARMAP is ASCII, so the slice is valid UTF-8.
        f.write_str(std::str::from_utf8(&chars[..end]).expect("ascii charmap"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_short_names() {
        for s in ["a", "z", "ttrace", "atrace", "block.info", "c.index128", "res.lim.stat"] {
            let name: Name = s.parse().expect("parse");
            assert_eq!(name.to_string(), s, "roundtrip of '{s}'");
        }
    }

    #[test]
    fn empty_name_is_zero() {
        let name: Name = "".parse().expect("parse empty");
        assert_eq!(name, Name::EMPTY);
        assert_eq!(name.to_string(), "");
    }

    #[test]
    fn packed_order_matches_string_order() {
        let a: Name = "a".parse().expect("a");
        let z: Name = "z".parse().expect("z");
        assert!(a.value() < z.value());

        let ab: Name = "ab".parse().expect("ab");
        let b: Name = "b".parse().expect("b");
        assert!(a.value() < ab.value());
        assert!(ab.value() < b.value());
    }

    #[test]
    fn single_char_packs_into_top_bits() {
        let a: Name = "a".parse().expect("a");
        // 'a' is symbol 6, placed in the top five bits.
        assert_eq!(a.value(), 6u64 << 59);
    }

    #[test]
    fn thirteen_char_name_roundtrip() {
        let name: Name = "aaaaaaaaaaaaj".parse().expect("13 chars");
        assert_eq!(name.to_string(), "aaaaaaaaaaaaj");
    }

    #[test]
    fn rejects_overlength() {
        assert!(matches!("aaaaaaaaaaaaaa".parse::<Name>(), Err(NameError::TooLong { .. })));
    }

    #[test]
    fn rejects_invalid_chars() {
        assert!(matches!("Upper".parse::<Name>(), Err(NameError::InvalidChar { .. })));
        assert!(matches!("has 0".parse::<Name>(), Err(NameError::InvalidChar { .. })));
    }

    #[test]
    fn rejects_wide_thirteenth_char() {
        // 'z' needs five bits and cannot be the 13th character.
        assert!(matches!(
            "aaaaaaaaaaaaz".parse::<Name>(),
            Err(NameError::InvalidThirteenth { .. })
        ));
    }

    mod proptest_name {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            /// Every packed value survives a display/parse cycle: trailing
            /// dots are the only characters the display trims, and they
            /// pack to zero bits.
            #[test]
            fn prop_value_roundtrip(value: u64) {
                let name = Name::from_value(value);
                let reparsed: Name = name.to_string().parse().expect("display output parses");
                prop_assert_eq!(reparsed, name);
            }
        }
    }
}
