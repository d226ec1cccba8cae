//! Error types for the query layer.
//!
//! Every error aborts the current operation and surfaces to the caller
//! verbatim; nothing is retried and no partial results are returned.

use snafu::Snafu;

/// Result type alias for query-layer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing the catalog or executing queries.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The scalar type cannot participate in an order-preserving key
    /// encoding (signed integers, floats, strings, raw bytes, public keys).
    #[snafu(display("Unsupported key type"))]
    UnsupportedKeyType,

    /// A schema type name has no entry in the type registry.
    #[snafu(display("Unknown type: {name}"))]
    UnknownType {
        /// The unresolved type name.
        name: String,
    },

    /// A table name has no entry in the fixed short-name dictionary.
    #[snafu(display("Unknown table: {name}"))]
    UnknownTable {
        /// The unresolved table name.
        name: String,
    },

    /// No query with this name is declared in the catalog.
    #[snafu(display("Unknown query: {name}"))]
    UnknownQuery {
        /// The unresolved query name.
        name: String,
    },

    /// A key or join declaration references a field the table lacks.
    #[snafu(display("Unknown field '{field}' in table '{table}'"))]
    UnknownField {
        /// The table searched.
        table: String,
        /// The missing field name.
        field: String,
    },

    /// A declared name does not fit the base-32 packed alphabet.
    #[snafu(display("Invalid name '{input}': {source}"))]
    InvalidName {
        /// The offending string.
        input: String,
        /// The underlying parse failure.
        source: chainview_types::NameError,
    },

    /// The query declares scalar filters beyond its range bounds.
    #[snafu(display("Query {name} not implemented: scalar filter arguments"))]
    NotImplemented {
        /// The query name.
        name: String,
    },

    /// The field lies past the first variable-width field, so its byte
    /// offset inside the row payload is unknown.
    #[snafu(display("Field '{field}' has unknown position"))]
    FieldPositionUnknown {
        /// The field name.
        field: String,
    },

    /// A declared byte offset exceeds the row payload length.
    #[snafu(display("Key position {position} is out of range for a {len}-byte row"))]
    KeyPositionOutOfRange {
        /// The declared offset.
        position: u32,
        /// The payload length.
        len: usize,
    },

    /// Truncated or malformed binary input.
    #[snafu(display("Deserialization failed: {source}"))]
    Deserialize {
        /// The underlying codec error.
        source: chainview_types::CodecError,
    },

    /// An index entry references a primary key with no stored row.
    #[snafu(display("Index entry references missing row"))]
    IndexDangling,

    /// The serialized result exceeds the u32 size limit.
    #[snafu(display("Result is too big: {size} bytes"))]
    ResultTooLarge {
        /// The serialized size.
        size: usize,
    },

    /// Underlying store I/O failure.
    #[snafu(display("Store error: {source}"))]
    Store {
        /// The underlying store error.
        source: chainview_store::Error,
    },
}

impl From<chainview_types::CodecError> for Error {
    fn from(source: chainview_types::CodecError) -> Self {
        Error::Deserialize { source }
    }
}

impl From<chainview_store::Error> for Error {
    fn from(source: chainview_store::Error) -> Self {
        Error::Store { source }
    }
}
