//! Tagged keyspace layout.
//!
//! Several logical relations share one ordered namespace; the first byte of
//! every key is a tag selecting the family. Per-block families nest under
//! the `block` tag so one range erase discards everything at or above a
//! given height:
//!
//! ```text
//! fill_status      10
//! received_block   20 {block:4BE} 30
//! table row        20 {block:4BE} 50 {table:8BE} {pk fields...}
//! table delta      20 {block:4BE} 60 {table:8BE} {present:1} {pk fields...}
//! table index      70 {table:8BE} {index:8BE} {index fields...} [{~block:4BE} {!present:1}]
//! table index ref  80 {block:4BE} {row/delta key} {index key}
//! ```
//!
//! State-table index entries carry the bracketed suffix: the bitwise
//! inverted block number ranks versions newest-first under ascending byte
//! order, and the negated present flag ranks live entries before tombstones
//! at the same block.

use chainview_types::{ByteReader, Name};

use crate::error::Result;
use crate::key_codec::{
    decode_key_name, decode_key_u32, encode_key_bool, encode_key_name, encode_key_u32,
};

/// First byte of every stored key. Values are stable on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum KeyTag {
    /// The ingestion progress singleton.
    FillStatus = 0x10,
    /// Prefix of every per-block family.
    Block = 0x20,
    /// One record per observed block.
    ReceivedBlock = 0x30,
    /// Rows of non-state tables.
    TableRow = 0x50,
    /// Versioned rows (deltas) of state tables.
    TableDelta = 0x60,
    /// Secondary-index entries.
    TableIndex = 0x70,
    /// Back-references from block numbers to index entries.
    TableIndexRef = 0x80,
}

impl KeyTag {
    /// Converts a raw tag byte; `None` for bytes outside the declared set.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x10 => Some(Self::FillStatus),
            0x20 => Some(Self::Block),
            0x30 => Some(Self::ReceivedBlock),
            0x50 => Some(Self::TableRow),
            0x60 => Some(Self::TableDelta),
            0x70 => Some(Self::TableIndex),
            0x80 => Some(Self::TableIndexRef),
            _ => None,
        }
    }

    /// Human-readable tag name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FillStatus => "fill_status",
            Self::Block => "block",
            Self::ReceivedBlock => "received_block",
            Self::TableRow => "table_row",
            Self::TableDelta => "table_delta",
            Self::TableIndex => "table_index",
            Self::TableIndexRef => "table_index_ref",
        }
    }
}

/// Key of the fill-status singleton.
pub fn make_fill_status_key() -> Vec<u8> {
    vec![KeyTag::FillStatus as u8]
}

/// Prefix shared by every per-block family.
pub fn make_block_prefix() -> Vec<u8> {
    vec![KeyTag::Block as u8]
}

/// Prefix of all data for one block.
pub fn make_block_key(block: u32) -> Vec<u8> {
    let mut key = make_block_prefix();
    encode_key_u32(&mut key, block);
    key
}

/// Key of one block's received-block record.
pub fn make_received_block_key(block: u32) -> Vec<u8> {
    let mut key = make_block_key(block);
    key.push(KeyTag::ReceivedBlock as u8);
    key
}

/// Prefix of one table's rows within one block; primary-key fields follow.
pub fn make_row_key(block: u32, table: Name) -> Vec<u8> {
    let mut key = make_block_key(block);
    key.push(KeyTag::TableRow as u8);
    encode_key_name(&mut key, table);
    key
}

/// Prefix of one table's deltas within one block; primary-key fields follow.
pub fn make_delta_key(block: u32, table: Name, present: bool) -> Vec<u8> {
    let mut key = make_block_key(block);
    key.push(KeyTag::TableDelta as u8);
    encode_key_name(&mut key, table);
    encode_key_bool(&mut key, present);
    key
}

/// Prefix of the whole index family.
pub fn make_table_index_prefix() -> Vec<u8> {
    vec![KeyTag::TableIndex as u8]
}

/// Prefix of one index; index fields (and, for state tables, the version
/// suffix) follow.
pub fn make_table_index_key(table: Name, index: Name) -> Vec<u8> {
    let mut key = make_table_index_prefix();
    encode_key_name(&mut key, table);
    encode_key_name(&mut key, index);
    key
}

/// Appends the inverted block number that ranks index versions
/// newest-first.
pub fn append_index_state_suffix(dest: &mut Vec<u8>, block: u32) {
    encode_key_u32(dest, !block);
}

/// Appends the full state-version suffix: inverted block, negated present.
pub fn append_index_state_suffix_present(dest: &mut Vec<u8>, block: u32, present: bool) {
    append_index_state_suffix(dest, block);
    encode_key_bool(dest, !present);
}

/// Prefix of the whole index-reference family.
pub fn make_table_index_ref_prefix() -> Vec<u8> {
    vec![KeyTag::TableIndexRef as u8]
}

/// Prefix of all index references written at one block.
pub fn make_table_index_ref_block_key(block: u32) -> Vec<u8> {
    let mut key = make_table_index_ref_prefix();
    encode_key_u32(&mut key, block);
    key
}

/// Full index-reference key: block, the referenced row/delta key, the index
/// entry's key.
pub fn make_table_index_ref_key(block: u32, row_key: &[u8], index_key: &[u8]) -> Vec<u8> {
    let mut key = make_table_index_ref_block_key(block);
    key.extend_from_slice(row_key);
    key.extend_from_slice(index_key);
    key
}

/// Renders a key for diagnostics: tag names, block numbers and table names
/// where they can be recovered, hex for the rest.
pub fn describe_key(key: &[u8]) -> String {
    fn describe(key: &[u8]) -> Result<String> {
        let mut reader = ByteReader::new(key);
        let Some(tag) = KeyTag::from_u8(reader.read_u8()?) else {
            return Ok(format!("? {}", hex::encode(key)));
        };
        let mut out = tag.as_str().to_string();
        if tag == KeyTag::Block {
            out.push_str(&format!(" {}", decode_key_u32(&mut reader)?));
            if reader.is_empty() {
                return Ok(out);
            }
            let Some(inner) = KeyTag::from_u8(reader.read_u8()?) else {
                return Ok(out);
            };
            out.push_str(&format!(" {}", inner.as_str()));
            match inner {
                KeyTag::TableRow => {
                    let table = decode_key_name(&mut reader)?;
                    out.push_str(&format!(" '{table}' {}", hex::encode(reader.remaining())));
                }
                KeyTag::TableDelta => {
                    let table = decode_key_name(&mut reader)?;
                    let present = reader.read_u8()? != 0;
                    out.push_str(&format!(
                        " '{table}' present: {present} {}",
                        hex::encode(reader.remaining())
                    ));
                }
                _ => {}
            }
        } else if tag == KeyTag::TableIndex {
            let table = decode_key_name(&mut reader)?;
            let index = decode_key_name(&mut reader)?;
            out.push_str(&format!(" '{table}' '{index}' {}", hex::encode(reader.remaining())));
        } else if !reader.is_empty() {
            out.push_str(&format!(" {}", hex::encode(reader.remaining())));
        }
        Ok(out)
    }
    describe(key).unwrap_or_else(|_| format!("truncated {}", hex::encode(key)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::disallowed_methods)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        s.parse().expect("valid name")
    }

    #[test]
    fn tag_bytes_are_stable() {
        assert_eq!(KeyTag::FillStatus as u8, 0x10);
        assert_eq!(KeyTag::Block as u8, 0x20);
        assert_eq!(KeyTag::ReceivedBlock as u8, 0x30);
        assert_eq!(KeyTag::TableRow as u8, 0x50);
        assert_eq!(KeyTag::TableDelta as u8, 0x60);
        assert_eq!(KeyTag::TableIndex as u8, 0x70);
        assert_eq!(KeyTag::TableIndexRef as u8, 0x80);
    }

    #[test]
    fn tag_roundtrip_and_unknown_bytes() {
        for byte in [0x10u8, 0x20, 0x30, 0x50, 0x60, 0x70, 0x80] {
            let tag = KeyTag::from_u8(byte).expect("declared tag");
            assert_eq!(tag as u8, byte);
        }
        assert!(KeyTag::from_u8(0x00).is_none());
        assert!(KeyTag::from_u8(0x40).is_none());
        assert!(KeyTag::from_u8(0x90).is_none());
    }

    #[test]
    fn block_keys_share_family_prefix() {
        let k10 = make_block_key(10);
        let k11 = make_block_key(11);
        assert!(k10 < k11);
        assert!(k10.starts_with(&make_block_prefix()));
        assert!(make_received_block_key(10).starts_with(&k10));
        assert!(make_row_key(10, name("ttrace")).starts_with(&k10));
        assert!(make_delta_key(10, name("c.row"), true).starts_with(&k10));
    }

    #[test]
    fn state_suffix_ranks_newer_blocks_first() {
        let base = make_table_index_key(name("c.row"), name("by.scope"));
        let mut at_5 = base.clone();
        let mut at_8 = base.clone();
        append_index_state_suffix_present(&mut at_5, 5, true);
        append_index_state_suffix_present(&mut at_8, 8, true);
        assert!(at_8 < at_5, "block 8 entry must sort before block 5 entry");
    }

    #[test]
    fn state_suffix_ranks_live_before_tombstone() {
        let base = make_table_index_key(name("c.row"), name("by.scope"));
        let mut live = base.clone();
        let mut tombstone = base;
        append_index_state_suffix_present(&mut live, 8, true);
        append_index_state_suffix_present(&mut tombstone, 8, false);
        assert!(live < tombstone);
    }

    #[test]
    fn index_ref_key_embeds_both_keys() {
        let row = make_row_key(9, name("ttrace"));
        let index = make_table_index_key(name("ttrace"), name("by.id"));
        let reference = make_table_index_ref_key(9, &row, &index);
        assert!(reference.starts_with(&make_table_index_ref_block_key(9)));
        assert!(reference.ends_with(&index));
    }

    #[test]
    fn describe_delta_key() {
        let mut key = make_delta_key(12, name("c.row"), true);
        key.extend_from_slice(&[0xab, 0xcd]);
        let text = describe_key(&key);
        assert_eq!(text, "block 12 table_delta 'c.row' present: true abcd");
    }

    #[test]
    fn describe_unknown_tag() {
        let text = describe_key(&[0x42, 0x01]);
        assert!(text.starts_with("? "), "got: {text}");
    }
}
