//! Block truncation.
//!
//! Reverting a fork discards every block at or above a height: one range
//! erase removes the per-block families (rows, deltas, received-block
//! records), then the index back-references written at those heights locate
//! the index entries to erase. References carry the index entry's key as
//! their value, so no schema knowledge is needed to walk them.

use chainview_store::KvStore;

use crate::error::Result;
use crate::key_codec::inc_key;
use crate::keyspace::{
    make_block_key, make_block_prefix, make_table_index_ref_block_key,
    make_table_index_ref_prefix,
};

/// Discards all data for blocks `>= block`, returning the number of keys
/// removed.
pub fn truncate_from(store: &KvStore, block: u32) -> Result<u64> {
    // Per-block families share the block prefix, so one range erase covers
    // rows, deltas and received-block records for every height >= block.
    let lower = make_block_key(block);
    let mut upper = make_block_prefix();
    inc_key(&mut upper);
    let mut erased = store.erase_range(&lower, &upper)?;

    // Index entries live outside the block families; their back-references
    // are keyed by block and hold the entry key to erase.
    let ref_lower = make_table_index_ref_block_key(block);
    let mut ref_upper = make_table_index_ref_prefix();
    inc_key(&mut ref_upper);

    let mut doomed: Vec<Vec<u8>> = Vec::new();
    {
        let snap = store.snapshot()?;
        for entry in snap.range(&ref_lower, &ref_upper)? {
            let (ref_key, index_key) = entry?;
            doomed.push(index_key);
            doomed.push(ref_key);
        }
    }
    erased += store.delete_batch(doomed.iter().map(Vec::as_slice))?;

    tracing::debug!(block, erased, "truncated blocks");
    Ok(erased)
}
