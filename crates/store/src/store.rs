//! redb-backed keyspace store.
//!
//! One table holds every key family; callers build tagged byte keys and the
//! store only promises lexicographic order. Readers take a [`Snapshot`]
//! (one redb read transaction) and iterate lazily; writers batch into a
//! single write transaction per call.

use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;

use redb::{
    Database, ReadOnlyTable, ReadTransaction, ReadableTable, TableDefinition,
};
use snafu::ResultExt;

use crate::error::{
    CommitSnafu, OpenSnafu, Result, StorageSnafu, TableSnafu, TransactionSnafu,
};

/// The single table multiplexing all key families.
const KEYSPACE: TableDefinition<'static, &'static [u8], &'static [u8]> =
    TableDefinition::new("keyspace");

/// Handle to the ordered keyspace.
///
/// Cheap to clone; all clones share one underlying database.
#[derive(Clone)]
pub struct KvStore {
    db: Arc<Database>,
}

impl KvStore {
    /// Opens or creates a database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::create(path).context(OpenSnafu)?;
        Self::from_db(db)
    }

    /// Creates an in-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let db = Database::builder()
            .create_with_backend(redb::backends::InMemoryBackend::new())
            .context(OpenSnafu)?;
        Self::from_db(db)
    }

    fn from_db(db: Database) -> Result<Self> {
        // Create the keyspace table up front so read transactions never see
        // a missing table.
        let txn = db.begin_write().context(TransactionSnafu)?;
        {
            let _ = txn.open_table(KEYSPACE).context(TableSnafu)?;
        }
        txn.commit().context(CommitSnafu)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Captures a consistent read view of the committed state.
    pub fn snapshot(&self) -> Result<Snapshot> {
        let txn = self.db.begin_read().context(TransactionSnafu)?;
        let table = txn.open_table(KEYSPACE).context(TableSnafu)?;
        Ok(Snapshot { _txn: txn, table })
    }

    /// Point lookup against a fresh snapshot.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.snapshot()?.get(key)
    }

    /// Writes one key-value pair.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.put_batch(std::iter::once((key, value)))
    }

    /// Writes several pairs in one transaction.
    pub fn put_batch<'a>(
        &self,
        pairs: impl IntoIterator<Item = (&'a [u8], &'a [u8])>,
    ) -> Result<()> {
        let txn = self.db.begin_write().context(TransactionSnafu)?;
        {
            let mut table = txn.open_table(KEYSPACE).context(TableSnafu)?;
            for (key, value) in pairs {
                table.insert(key, value).context(StorageSnafu)?;
            }
        }
        txn.commit().context(CommitSnafu)?;
        Ok(())
    }

    /// Removes the given keys in one transaction, returning how many were
    /// present. Missing keys are ignored.
    pub fn delete_batch<'a>(&self, keys: impl IntoIterator<Item = &'a [u8]>) -> Result<u64> {
        let txn = self.db.begin_write().context(TransactionSnafu)?;
        let mut deleted = 0u64;
        {
            let mut table = txn.open_table(KEYSPACE).context(TableSnafu)?;
            for key in keys {
                if table.remove(key).context(StorageSnafu)?.is_some() {
                    deleted += 1;
                }
            }
        }
        txn.commit().context(CommitSnafu)?;
        Ok(deleted)
    }

    /// Removes every key in `[lower, upper)`, returning how many were erased.
    pub fn erase_range(&self, lower: &[u8], upper: &[u8]) -> Result<u64> {
        let txn = self.db.begin_write().context(TransactionSnafu)?;
        let mut erased = 0u64;
        {
            let mut table = txn.open_table(KEYSPACE).context(TableSnafu)?;
            let mut doomed = Vec::new();
            {
                let range = table
                    .range::<&[u8]>((Bound::Included(lower), Bound::Excluded(upper)))
                    .context(StorageSnafu)?;
                for entry in range {
                    let (key, _) = entry.context(StorageSnafu)?;
                    doomed.push(key.value().to_vec());
                }
            }
            for key in doomed {
                table.remove(key.as_slice()).context(StorageSnafu)?;
                erased += 1;
            }
        }
        txn.commit().context(CommitSnafu)?;
        tracing::debug!(erased, "erased key range");
        Ok(erased)
    }
}

/// A consistent read view over the keyspace.
pub struct Snapshot {
    _txn: ReadTransaction,
    table: ReadOnlyTable<&'static [u8], &'static [u8]>,
}

impl Snapshot {
    /// Point lookup.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let guard = self.table.get(key).context(StorageSnafu)?;
        Ok(guard.map(|g| g.value().to_vec()))
    }

    /// Ascending iteration over `[lower, upper)`.
    pub fn range(&self, lower: &[u8], upper: &[u8]) -> Result<RangeIter> {
        let inner = self
            .table
            .range::<&[u8]>((Bound::Included(lower), Bound::Excluded(upper)))
            .context(StorageSnafu)?;
        Ok(RangeIter { inner, reverse: false })
    }

    /// Descending iteration over `[lower, upper)`.
    pub fn range_rev(&self, lower: &[u8], upper: &[u8]) -> Result<RangeIter> {
        let inner = self
            .table
            .range::<&[u8]>((Bound::Included(lower), Bound::Excluded(upper)))
            .context(StorageSnafu)?;
        Ok(RangeIter { inner, reverse: true })
    }
}

/// Lazy iterator over a key range; drop it to stop the scan early.
pub struct RangeIter {
    inner: redb::Range<'static, &'static [u8], &'static [u8]>,
    reverse: bool,
}

impl Iterator for RangeIter {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = if self.reverse { self.inner.next_back() } else { self.inner.next() }?;
        Some(
            entry
                .map(|(k, v)| (k.value().to_vec(), v.value().to_vec()))
                .context(StorageSnafu),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::disallowed_methods)]
mod tests {
    use super::*;

    fn filled_store() -> KvStore {
        let store = KvStore::open_in_memory().expect("should open");
        for i in 0u8..10 {
            store.put(&[0x20, i], &[i]).expect("put");
        }
        store
    }

    #[test]
    fn get_returns_written_value() {
        let store = filled_store();
        assert_eq!(store.get(&[0x20, 3]).expect("get"), Some(vec![3]));
        assert_eq!(store.get(&[0x21]).expect("get"), None);
    }

    #[test]
    fn range_is_lexicographic_and_half_open() {
        let store = filled_store();
        let snap = store.snapshot().expect("snapshot");
        let keys: Vec<Vec<u8>> = snap
            .range(&[0x20, 2], &[0x20, 5])
            .expect("range")
            .map(|e| e.expect("entry").0)
            .collect();
        assert_eq!(keys, vec![vec![0x20, 2], vec![0x20, 3], vec![0x20, 4]]);
    }

    #[test]
    fn range_rev_descends() {
        let store = filled_store();
        let snap = store.snapshot().expect("snapshot");
        let keys: Vec<Vec<u8>> = snap
            .range_rev(&[0x20, 2], &[0x20, 5])
            .expect("range")
            .map(|e| e.expect("entry").0)
            .collect();
        assert_eq!(keys, vec![vec![0x20, 4], vec![0x20, 3], vec![0x20, 2]]);
    }

    #[test]
    fn erase_range_removes_half_open_interval() {
        let store = filled_store();
        let erased = store.erase_range(&[0x20, 4], &[0x20, 8]).expect("erase");
        assert_eq!(erased, 4);
        assert_eq!(store.get(&[0x20, 3]).expect("get"), Some(vec![3]));
        assert_eq!(store.get(&[0x20, 4]).expect("get"), None);
        assert_eq!(store.get(&[0x20, 7]).expect("get"), None);
        assert_eq!(store.get(&[0x20, 8]).expect("get"), Some(vec![8]));
    }

    #[test]
    fn snapshot_is_isolated_from_later_writes() {
        let store = filled_store();
        let snap = store.snapshot().expect("snapshot");
        store.put(&[0x30], &[0xff]).expect("put");
        assert_eq!(snap.get(&[0x30]).expect("get"), None);
        assert_eq!(store.get(&[0x30]).expect("get"), Some(vec![0xff]));
    }

    #[test]
    fn file_backed_store_persists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("chainview.redb");
        {
            let store = KvStore::open(&path).expect("open");
            store.put(b"key", b"value").expect("put");
        }
        let store = KvStore::open(&path).expect("reopen");
        assert_eq!(store.get(b"key").expect("get"), Some(b"value".to_vec()));
    }
}
