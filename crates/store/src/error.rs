//! Error types for store operations.

use snafu::Snafu;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during store operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// Failed to open or create the database.
    #[snafu(display("Failed to open database: {source}"))]
    Open {
        /// The underlying redb error.
        source: redb::DatabaseError,
    },

    /// Failed to begin a transaction.
    #[snafu(display("Transaction error: {source}"))]
    Transaction {
        /// The underlying redb transaction error.
        source: redb::TransactionError,
    },

    /// Failed to open the keyspace table.
    #[snafu(display("Table error: {source}"))]
    Table {
        /// The underlying redb table error.
        source: redb::TableError,
    },

    /// A read or write against the keyspace failed.
    #[snafu(display("Storage error: {source}"))]
    Storage {
        /// The underlying redb storage error.
        source: redb::StorageError,
    },

    /// Failed to commit a write transaction.
    #[snafu(display("Commit error: {source}"))]
    Commit {
        /// The underlying redb commit error.
        source: redb::CommitError,
    },
}
