//! Ordered embedded key-value store for chainview.
//!
//! Wraps redb behind the narrow contract the query layer consumes:
//! point gets, ascending and descending lexicographic range iteration over
//! byte keys, and the write path the ingestion layer and block truncation
//! need (`put`, `erase_range`). The entire tagged keyspace lives in one
//! `&[u8] -> &[u8]` table; key structure is the caller's concern.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod store;

pub use error::{Error, Result};
pub use store::{KvStore, RangeIter, Snapshot};
