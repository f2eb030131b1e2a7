use thiserror::Error;

use crate::schema::{ColumnId, ColumnKind};

/// Result alias used across the partition API.
pub type Result<T, E = PartitionError> = std::result::Result<T, E>;

/// Error returned by fallible partition operations.
#[derive(Debug, Error)]
pub enum PartitionError {
    /// A column lookup that requires presence found nothing.
    #[error("no {kind} column with id {id}")]
    NoSuchColumn {
        /// Kind of column that was looked up.
        kind: ColumnKind,
        /// Requested column id.
        id: ColumnId,
    },
    /// [`Row::cell_at`](crate::row::Row::cell_at) found no cell.
    #[error("row has no cell for column {id}")]
    NoSuchCell {
        /// Requested column id.
        id: ColumnId,
    },
    /// An atomic cell was given for a collection column or the other way round.
    #[error("value does not match the declared type of {kind} column {id}")]
    ColumnTypeMismatch {
        /// Kind of the target column.
        kind: ColumnKind,
        /// Target column id.
        id: ColumnId,
    },
    /// Schema construction or validation failed.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    /// A serialized partition or collection could not be decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Error raised while building or validating a schema.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// Two columns share a name.
    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),
    /// More columns of one kind than a column id can address.
    #[error("too many {kind} columns: {count}")]
    TooManyColumns {
        /// Column kind that overflowed.
        kind: ColumnKind,
        /// Number of columns declared.
        count: usize,
    },
    /// A clustering key does not have exactly the declared number of components.
    #[error("clustering key has {got} components, schema declares {expected}")]
    KeyArity {
        /// Clustering size declared by the schema.
        expected: usize,
        /// Components present in the key.
        got: usize,
    },
    /// A clustering prefix is longer than the clustering key.
    #[error("clustering prefix has {got} components, schema allows at most {max}")]
    PrefixTooLong {
        /// Clustering size declared by the schema.
        max: usize,
        /// Components present in the prefix.
        got: usize,
    },
}

/// Error raised while decoding a serialized partition view or collection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Input ended before a complete value was read.
    #[error("truncated input: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Bytes required by the next read.
        needed: usize,
        /// Bytes left in the input.
        remaining: usize,
    },
    /// An enum discriminant was not recognised.
    #[error("unknown {what} tag: {tag}")]
    UnknownTag {
        /// What was being decoded.
        what: &'static str,
        /// Offending tag byte.
        tag: u8,
    },
    /// Text component was not valid UTF-8.
    #[error("invalid utf-8 in clustering text component")]
    InvalidUtf8,
    /// Bytes were left over after the top-level value.
    #[error("{0} trailing bytes after partition view")]
    TrailingBytes(usize),
    /// Unsupported view format version.
    #[error("unsupported view version: {0}")]
    UnsupportedVersion(u8),
    /// Decoded data is inconsistent with the schema.
    #[error("view does not match schema: {0}")]
    Schema(#[from] SchemaError),
}
