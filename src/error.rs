use crate::dataframe::DataType;
use std::collections::TryReserveError;
use std::path::PathBuf;
use std::str::Utf8Error;
use std::{fmt, io};
use thiserror::Error;

/// Which coordinate of a cell access was out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Row => write!(f, "row"),
            Axis::Column => write!(f, "column"),
        }
    }
}

/// Errors reported by the columnar store.
#[derive(Debug, Error)]
pub enum DataFrameError {
    #[error("failed to allocate {what}")]
    Allocation {
        what: &'static str,
        #[source]
        source: TryReserveError,
    },

    #[error("{axis} index {index} out of range (len {len})")]
    IndexOutOfRange { axis: Axis, index: usize, len: usize },

    #[error("invalid name for column {index}: {reason}")]
    InvalidName { index: usize, reason: &'static str },

    #[error("column name '{name}' is already used by column {existing}")]
    DuplicateColumnName { name: String, existing: usize },

    #[error("column {0} has already been added")]
    ColumnAlreadyExists(usize),

    #[error("column {0} has not been added")]
    MissingColumn(usize),

    #[error("type mismatch in column {column}: expected {expected}, got {actual}")]
    TypeMismatch {
        column: usize,
        expected: DataType,
        actual: DataType,
    },
}

/// Errors reported by the CSV reader and writer.
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Stream(#[from] io::Error),

    #[error("{} is not valid UTF-8", .path.display())]
    InvalidUtf8 {
        path: PathBuf,
        #[source]
        source: Utf8Error,
    },

    #[error("no header line in CSV")]
    MissingHeader,

    #[error("header has {found} fields, but {expected} column types were given")]
    SchemaMismatch { expected: usize, found: usize },

    #[error("line {line} has {found} fields (should have {expected})")]
    RowArityMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("failed to create column '{name}'")]
    ColumnCreation {
        name: String,
        #[source]
        source: DataFrameError,
    },

    #[error("line {line}, column {column}: '{field}' is not a valid {expected}")]
    InvalidNumber {
        line: usize,
        column: usize,
        field: String,
        expected: DataType,
    },

    /// The column slot was never added, so there is no name to write.
    #[error("column {0} has an empty name (it was never added)")]
    EmptyColumnName(usize),

    #[error(transparent)]
    Cell(#[from] DataFrameError),
}

impl CsvError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> CsvError {
        let path = path.into();
        move |source| CsvError::Io { path, source }
    }
}
