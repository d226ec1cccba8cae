//! Ingestion-side key layout writer.
//!
//! The fill pipeline owns all writes; this writer reproduces its output
//! layout so tools and tests can populate a store the query engine
//! understands. Each row write also emits the table's index entries (value:
//! the row key) and one back-reference per entry (value: the index key),
//! keeping index maintenance and truncation in lockstep with the primary
//! data.

use chainview_store::KvStore;
use chainview_types::{Checksum256, FillStatus, ReceivedBlock};
use snafu::OptionExt;

use crate::catalog::{Catalog, Table};
use crate::error::{Result, UnknownTableSnafu};
use crate::keyspace::{
    append_index_state_suffix_present, make_delta_key, make_fill_status_key,
    make_received_block_key, make_row_key, make_table_index_key, make_table_index_ref_key,
};

/// Writes rows, deltas and their index entries in the fill layout.
pub struct BlockWriter<'a> {
    store: &'a KvStore,
    catalog: &'a Catalog,
}

impl<'a> BlockWriter<'a> {
    /// Creates a writer over `store` using `catalog`'s table definitions.
    pub fn new(store: &'a KvStore, catalog: &'a Catalog) -> Self {
        Self { store, catalog }
    }

    /// Replaces the fill-status singleton.
    pub fn write_fill_status(&self, status: &FillStatus) -> Result<()> {
        let mut value = Vec::with_capacity(FillStatus::SIZE);
        status.write(&mut value);
        self.store.put(&make_fill_status_key(), &value)?;
        Ok(())
    }

    /// Records one observed block.
    pub fn write_received_block(&self, block_num: u32, block_id: Checksum256) -> Result<()> {
        let record = ReceivedBlock { block_num, block_id };
        let mut value = Vec::with_capacity(ReceivedBlock::SIZE);
        record.write(&mut value);
        self.store.put(&make_received_block_key(block_num), &value)?;
        Ok(())
    }

    /// Writes one non-state row and its index entries.
    pub fn write_row(&self, block: u32, table_name: &str, payload: &[u8]) -> Result<()> {
        let table = self.lookup(table_name)?;
        let mut row_key = make_row_key(block, table.short_name);
        table.append_fields(&mut row_key, payload, &table.primary_key, true)?;
        self.write_with_indexes(block, table, row_key, payload, None)
    }

    /// Writes one state-table delta and its versioned index entries.
    ///
    /// `present = true` records an insert or update; `present = false`
    /// records a tombstone.
    pub fn write_delta(
        &self,
        block: u32,
        table_name: &str,
        present: bool,
        payload: &[u8],
    ) -> Result<()> {
        let table = self.lookup(table_name)?;
        let mut delta_key = make_delta_key(block, table.short_name, present);
        table.append_fields(&mut delta_key, payload, &table.primary_key, true)?;
        self.write_with_indexes(block, table, delta_key, payload, Some(present))
    }

    fn lookup(&self, table_name: &str) -> Result<&Table> {
        self.catalog
            .table_by_name(table_name)
            .context(UnknownTableSnafu { name: table_name.to_string() })
    }

    fn write_with_indexes(
        &self,
        block: u32,
        table: &Table,
        row_key: Vec<u8>,
        payload: &[u8],
        present: Option<bool>,
    ) -> Result<()> {
        let mut batch: Vec<(Vec<u8>, Vec<u8>)> = vec![(row_key.clone(), payload.to_vec())];
        for (index_name, keys) in &table.indexes {
            let mut index_key = make_table_index_key(table.short_name, *index_name);
            table.append_fields(&mut index_key, payload, keys, true)?;
            if let Some(present) = present {
                append_index_state_suffix_present(&mut index_key, block, present);
            }
            let ref_key = make_table_index_ref_key(block, &row_key, &index_key);
            batch.push((index_key.clone(), row_key.clone()));
            batch.push((ref_key, index_key));
        }
        self.store.put_batch(batch.iter().map(|(k, v)| (k.as_slice(), v.as_slice())))?;
        Ok(())
    }
}
