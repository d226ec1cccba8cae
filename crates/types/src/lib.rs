//! Core types for chainview: historical blockchain state serving.
//!
//! This crate provides the foundational scalar types shared by the store and
//! query layers:
//! - `Name`: 64-bit base-32 packed identifiers for tables and indexes
//! - `Checksum256`: 256-bit digests (block ids, transaction ids)
//! - Timestamp types with fixed tick encodings
//! - The canonical little-endian binary codec used for row payloads and
//!   query wire bytes
//! - Ingestion bookkeeping records (`FillStatus`, `ReceivedBlock`)

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bin;
mod fill;
mod hash;
mod name;
mod status;
mod time;

pub use bin::{
    ByteReader, CodecError, write_bytes, write_checksum256, write_name, write_string, write_u8,
    write_u16, write_u32, write_u64, write_u128, write_varuint32,
};
pub use fill::{FillStatus, ReceivedBlock};
pub use hash::Checksum256;
pub use name::{Name, NameError};
pub use status::{PublicKey, TransactionStatus};
pub use time::{BlockTimestamp, TimePoint, TimePointSec};

/// Result alias for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
