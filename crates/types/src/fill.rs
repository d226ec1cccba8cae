//! Ingestion bookkeeping records.
//!
//! The ingestion pipeline maintains a single `FillStatus` row describing how
//! far it has filled the store, and one `ReceivedBlock` row per observed
//! block. Both use the canonical fixed layout; the query layer reads them
//! and never writes them outside of tests.

use crate::bin::{
    ByteReader, CodecError, write_checksum256, write_u32,
};
use crate::hash::Checksum256;

/// Ingestion progress: head and irreversible block of the filled range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FillStatus {
    /// Highest block written.
    pub head: u32,
    /// Id of the head block.
    pub head_id: Checksum256,
    /// Highest irreversible block written.
    pub irreversible: u32,
    /// Id of the irreversible block.
    pub irreversible_id: Checksum256,
    /// Lowest block retained.
    pub first: u32,
}

impl FillStatus {
    /// Canonical encoded width.
    pub const SIZE: usize = 76;

    /// Appends the canonical form.
    pub fn write(&self, out: &mut Vec<u8>) {
        write_u32(out, self.head);
        write_checksum256(out, &self.head_id);
        write_u32(out, self.irreversible);
        write_checksum256(out, &self.irreversible_id);
        write_u32(out, self.first);
    }

    /// Reads the canonical form.
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            head: reader.read_u32()?,
            head_id: reader.read_checksum256()?,
            irreversible: reader.read_u32()?,
            irreversible_id: reader.read_checksum256()?,
            first: reader.read_u32()?,
        })
    }
}

/// One observed block: height and id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceivedBlock {
    /// Block height.
    pub block_num: u32,
    /// Block id digest.
    pub block_id: Checksum256,
}

impl ReceivedBlock {
    /// Canonical encoded width.
    pub const SIZE: usize = 36;

    /// Appends the canonical form.
    pub fn write(&self, out: &mut Vec<u8>) {
        write_u32(out, self.block_num);
        write_checksum256(out, &self.block_id);
    }

    /// Reads the canonical form.
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            block_num: reader.read_u32()?,
            block_id: reader.read_checksum256()?,
        })
    }
}
