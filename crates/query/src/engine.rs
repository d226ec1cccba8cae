//! Named-query execution.
//!
//! A query names a secondary index and brackets its fields. Execution walks
//! the index in two phases: an outer scan enumerating distinct index-field
//! groups inside the bracket, then a per-group version selection that
//! resolves the newest entry at or before the as-of block and point-gets
//! the primary row it references. An optional join repeats the selection
//! against a second index using key fields lifted from the outer row.
//!
//! Sessions are read-only. Each query runs against one store snapshot; the
//! as-of ceiling is the only cross-version isolation applied.

use std::sync::Arc;

use chainview_store::{KvStore, Snapshot};
use chainview_types::{
    ByteReader, Checksum256, FillStatus, ReceivedBlock, write_bytes, write_varuint32,
};
use snafu::{OptionExt, ensure};

use crate::catalog::Catalog;
use crate::error::{
    IndexDanglingSnafu, NotImplementedSnafu, Result, ResultTooLargeSnafu, UnknownQuerySnafu,
};
use crate::key_codec::inc_key;
use crate::keyspace::{
    append_index_state_suffix, make_fill_status_key, make_received_block_key,
    make_table_index_key,
};

/// A read session over the filled store.
///
/// Holds the ingestion status captured at construction and shares the
/// immutable catalog. Sessions are cheap; hosts create one per client
/// connection.
pub struct QuerySession {
    store: KvStore,
    catalog: Arc<Catalog>,
    fill_status: Option<FillStatus>,
}

impl QuerySession {
    /// Opens a session, reading the current fill status once.
    pub fn new(store: KvStore, catalog: Arc<Catalog>) -> Result<Self> {
        let fill_status = match store.get(&make_fill_status_key())? {
            Some(bytes) => Some(FillStatus::read(&mut ByteReader::new(&bytes))?),
            None => None,
        };
        Ok(Self { store, catalog, fill_status })
    }

    /// Ingestion progress at session open; `None` before the first fill.
    pub fn fill_status(&self) -> Option<&FillStatus> {
        self.fill_status.as_ref()
    }

    /// Looks up the id of one observed block.
    pub fn block_id(&self, block_num: u32) -> Result<Option<Checksum256>> {
        match self.store.get(&make_received_block_key(block_num))? {
            Some(bytes) => {
                let record = ReceivedBlock::read(&mut ByteReader::new(&bytes))?;
                Ok(Some(record.block_id))
            }
            None => Ok(None),
        }
    }

    /// Executes a named query.
    ///
    /// `query_bin` carries the query name, the as-of ceiling when the query
    /// declares one, each range bound type twice (lower then upper), and
    /// the client's result cap. `head_block` is the ingestion head and
    /// bounds the as-of ceiling. The result is a length-prefixed array of
    /// row payloads in scan order.
    pub fn query(&self, query_bin: &[u8], head_block: u32) -> Result<Vec<u8>> {
        let mut reader = ByteReader::new(query_bin);
        let query_name = reader.read_name()?;
        let query = self
            .catalog
            .query(query_name)
            .context(UnknownQuerySnafu { name: query_name.to_string() })?;
        ensure!(
            query.arg_types.is_empty(),
            NotImplementedSnafu { name: query_name.to_string() }
        );

        let max_block = if query.limit_block_num {
            head_block.min(reader.read_u32()?)
        } else {
            0
        };

        let table = self.catalog.table(query.table);
        let mut first = make_table_index_key(table.short_name, query.name);
        let mut last = first.clone();
        for ops in &query.range_types {
            (ops.encode_query_arg)(&mut first, &mut reader)?;
            (ops.encode_query_arg)(&mut last, &mut reader)?;
        }

        let max_results = reader.read_u32()?.min(query.max_results);
        tracing::debug!(
            query = %query_name,
            table = %table.name,
            max_block,
            max_results,
            "executing query"
        );

        let snap = self.store.snapshot()?;
        let mut rows: Vec<Vec<u8>> = Vec::new();

        // The bounds bracket the index fields only; every index key in the
        // bracket extends them, so groups are fixed-length key prefixes.
        let group_len = first.len();
        let mut scan_upper = last;
        inc_key(&mut scan_upper);
        let mut cursor = first;
        let mut groups = 0u32;

        while groups < max_results {
            let group = {
                let mut iter = snap.range(&cursor, &scan_upper)?;
                match iter.next() {
                    Some(entry) => {
                        let (key, _) = entry?;
                        key[..group_len.min(key.len())].to_vec()
                    }
                    None => break,
                }
            };

            if let Some(delta_key) = select_version(&snap, &group, query.is_state, max_block)? {
                let delta_value = snap.get(&delta_key)?.context(IndexDanglingSnafu)?;
                if let Some(join) = &query.join {
                    let join_table = self.catalog.table(join.table);
                    let join_query = self
                        .catalog
                        .query(join.query)
                        .context(UnknownQuerySnafu { name: join.query.to_string() })?;

                    let mut join_group = make_table_index_key(join_table.short_name, join.query);
                    table.append_fields(&mut join_group, &delta_value, &join.key_values, true)?;

                    // A join miss drops the outer row entirely.
                    if let Some(join_delta_key) =
                        select_version(&snap, &join_group, join_query.is_state, max_block)?
                    {
                        let join_value = snap.get(&join_delta_key)?.context(IndexDanglingSnafu)?;
                        let mut row = delta_value;
                        join_table.append_fields(
                            &mut row,
                            &join_value,
                            &join.fields_from_join,
                            false,
                        )?;
                        rows.push(row);
                    }
                } else {
                    rows.push(delta_value);
                }
            }

            groups += 1;
            cursor = group;
            inc_key(&mut cursor);
        }

        let mut result = Vec::new();
        write_varuint32(&mut result, rows.len() as u32);
        for row in &rows {
            write_bytes(&mut result, row);
        }
        ensure!(
            u32::try_from(result.len()).is_ok(),
            ResultTooLargeSnafu { size: result.len() }
        );
        tracing::debug!(query = %query_name, groups, rows = rows.len(), "query complete");
        Ok(result)
    }
}

/// Resolves one index group to the key of the row version it selects.
///
/// State indexes order versions newest-first via the inverted-block suffix,
/// so the first entry at or past `group ∥ ~max_block` is the newest version
/// at or before the horizon. Non-state groups hold exactly one entry.
/// Returns `None` when no version qualifies.
fn select_version(
    snap: &Snapshot,
    group: &[u8],
    is_state: bool,
    max_block: u32,
) -> Result<Option<Vec<u8>>> {
    let mut seek = group.to_vec();
    if is_state {
        append_index_state_suffix(&mut seek, max_block);
    }
    let mut group_end = group.to_vec();
    inc_key(&mut group_end);

    let mut iter = snap.range(&seek, &group_end)?;
    match iter.next() {
        Some(entry) => {
            let (_, value) = entry?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}
