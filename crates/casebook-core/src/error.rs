//! Error taxonomy for the fetch → normalize → persist pipeline.
//!
//! Only [`StoreError`] escapes a pipeline run. Fetch and input failures are
//! absorbed per record; normalization failures happen before a run starts.

use thiserror::Error;

/// Static schema or configuration defect, fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    #[error("labels {first:?} and {second:?} both normalize to column {key:?}")]
    Collision {
        first: String,
        second: String,
        key: String,
    },
    #[error("field {field} is labelled twice: {first:?} and {second:?}")]
    RepeatedField {
        field: String,
        first: String,
        second: String,
    },
    #[error("label {label:?} normalizes to an empty column name")]
    EmptyKey { label: String },
    #[error("schema has no label for field {label:?}")]
    MissingField { label: String },
    #[error("label {label:?} does not name a schema field")]
    UnknownLabel { label: String },
}

/// The durability point could not be reached.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("table {table:?} exists but has no {column:?} column")]
    SchemaMismatch { table: String, column: String },
    #[error("store connection lock poisoned")]
    Poisoned,
    #[error("cannot persist a record with a blank identifier")]
    BlankIdentifier,
}

/// A malformed input record. Skipped and reported, never fatal.
///
/// `position` is the 1-based ordinal of the record in the input sequence;
/// `line` is a line number in the source file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("record {position} has no identifier")]
    MissingIdentifier { position: usize },
    #[error("record {position} repeats identifier {cb_no:?}")]
    Duplicate { cb_no: String, position: usize },
    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}
