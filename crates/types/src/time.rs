//! Timestamp types.
//!
//! All three carry an unsigned tick count so they can participate in
//! order-preserving key encodings: `TimePoint` in microseconds,
//! `TimePointSec` in seconds, `BlockTimestamp` in half-second block slots
//! counted from 2000-01-01T00:00:00.000 UTC.

use std::fmt;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Milliseconds between the Unix epoch and the block timestamp epoch.
pub const BLOCK_TIMESTAMP_EPOCH_MS: u64 = 946_684_800_000;

/// Milliseconds per block timestamp slot.
pub const BLOCK_TIMESTAMP_INTERVAL_MS: u64 = 500;

/// Microsecond-resolution point in time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TimePoint {
    /// Microseconds since the Unix epoch.
    pub microseconds: u64,
}

impl TimePoint {
    /// Creates a time point from microseconds since the Unix epoch.
    #[inline]
    pub const fn from_micros(microseconds: u64) -> Self {
        Self { microseconds }
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match DateTime::from_timestamp_micros(self.microseconds as i64) {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.3f")),
            None => write!(f, "{}us", self.microseconds),
        }
    }
}

/// Second-resolution point in time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TimePointSec {
    /// Seconds since the Unix epoch.
    pub seconds: u32,
}

impl TimePointSec {
    /// Creates a time point from seconds since the Unix epoch.
    #[inline]
    pub const fn from_secs(seconds: u32) -> Self {
        Self { seconds }
    }
}

impl fmt::Display for TimePointSec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match DateTime::from_timestamp(i64::from(self.seconds), 0) {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            None => write!(f, "{}s", self.seconds),
        }
    }
}

/// Half-second block slot counter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BlockTimestamp {
    /// Slots since the block timestamp epoch.
    pub slot: u32,
}

impl BlockTimestamp {
    /// Creates a block timestamp from a raw slot count.
    #[inline]
    pub const fn from_slot(slot: u32) -> Self {
        Self { slot }
    }

    /// Converts to a microsecond time point.
    pub const fn to_time_point(self) -> TimePoint {
        let ms = BLOCK_TIMESTAMP_EPOCH_MS + self.slot as u64 * BLOCK_TIMESTAMP_INTERVAL_MS;
        TimePoint::from_micros(ms * 1000)
    }
}

impl fmt::Display for BlockTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_time_point().fmt(f)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn block_timestamp_epoch() {
        // Slot 0 is 2000-01-01T00:00:00.000 UTC.
        let tp = BlockTimestamp::from_slot(0).to_time_point();
        assert_eq!(tp.microseconds, BLOCK_TIMESTAMP_EPOCH_MS * 1000);
        assert_eq!(tp.to_string(), "2000-01-01T00:00:00.000");
    }

    #[test]
    fn block_timestamp_slot_is_half_second() {
        let a = BlockTimestamp::from_slot(10).to_time_point();
        let b = BlockTimestamp::from_slot(11).to_time_point();
        assert_eq!(b.microseconds - a.microseconds, 500_000);
    }

    #[test]
    fn ordering_follows_ticks() {
        assert!(TimePoint::from_micros(1) < TimePoint::from_micros(2));
        assert!(TimePointSec::from_secs(5) < TimePointSec::from_secs(6));
        assert!(BlockTimestamp::from_slot(7) < BlockTimestamp::from_slot(8));
    }
}
