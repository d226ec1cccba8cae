//! Transaction status codes and public keys.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bin::{ByteReader, CodecError};

/// Outcome of a transaction, as recorded in trace rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TransactionStatus {
    /// Succeeded; no error handler ran.
    Executed = 0,
    /// Objectively failed, error handler ran.
    SoftFail = 1,
    /// The error handler also failed.
    HardFail = 2,
    /// Scheduled for a future time.
    Delayed = 3,
    /// Expired without execution, CPU/NET refunded.
    Expired = 4,
}

impl TransactionStatus {
    /// Converts a raw status byte; `None` for unknown codes.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Executed),
            1 => Some(Self::SoftFail),
            2 => Some(Self::HardFail),
            3 => Some(Self::Delayed),
            4 => Some(Self::Expired),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Executed => "executed",
            Self::SoftFail => "soft_fail",
            Self::HardFail => "hard_fail",
            Self::Delayed => "delayed",
            Self::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// A public key: one key-type byte followed by 33 key data bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    /// Key algorithm discriminant (0 = K1, 1 = R1).
    pub key_type: u8,
    /// Compressed key data.
    pub data: [u8; 33],
}

impl PublicKey {
    /// Canonical encoded width.
    pub const SIZE: usize = 34;

    /// Reads the canonical 34-byte form.
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        let key_type = reader.read_u8()?;
        let data = reader.read_exact(33)?.try_into().expect("length checked");
        Ok(Self { key_type, data })
    }

    /// Appends the canonical 34-byte form.
    pub fn write(&self, out: &mut Vec<u8>) {
        out.push(self.key_type);
        out.extend_from_slice(&self.data);
    }
}
