//! Fixed-schema columnar table.
//!
//! A [`DataFrame`] owns a fixed number of column slots. Each slot is filled once
//! with [`DataFrame::add_column`], which allocates a typed array sized to the
//! table's row count. Cells are then written and read through [`Value`], which
//! carries its type so that a value can never be stored in a column of another
//! type.

use crate::error::{Axis, DataFrameError};
use std::fmt;
use tracing::{debug, trace};

/// Column names are limited to this many bytes, terminator included.
pub const MAX_COLUMN_NAME_LENGTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Integer,
    Float,
    Text,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Integer => write!(f, "integer"),
            DataType::Float => write!(f, "float"),
            DataType::Text => write!(f, "text"),
        }
    }
}

/// A single cell value.
///
/// Text borrows: passed to [`DataFrame::set_value`] it is copied into the table,
/// returned from [`DataFrame::get_value`] it points into the table. `None` is a
/// missing text value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Integer(i64),
    Float(f64),
    Text(Option<&'a str>),
}

impl<'a> Value<'a> {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Integer(_) => DataType::Integer,
            Value::Float(_) => DataType::Float,
            Value::Text(_) => DataType::Text,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            Value::Integer(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match *self {
            Value::Float(v) => Some(v),
            _ => None,
        }
    }

    /// `Some(None)` for a null text cell, `None` for a non-text value.
    pub fn as_text(&self) -> Option<Option<&'a str>> {
        match *self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// Typed backing array of a column. The variant is picked when the column is
/// added and never changes.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Integer(Vec<i64>),
    Float(Vec<f64>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    /// Zero-filled numeric array or null-filled text array of exactly `len` cells.
    fn with_len(data_type: DataType, len: usize) -> Result<Self, DataFrameError> {
        Ok(match data_type {
            DataType::Integer => ColumnData::Integer(filled(len, || 0, "integer column")?),
            DataType::Float => ColumnData::Float(filled(len, || 0.0, "float column")?),
            DataType::Text => ColumnData::Text(filled(len, || None, "text column")?),
        })
    }

    pub fn data_type(&self) -> DataType {
        match self {
            ColumnData::Integer(_) => DataType::Integer,
            ColumnData::Float(_) => DataType::Float,
            ColumnData::Text(_) => DataType::Text,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Integer(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn filled<T>(
    len: usize,
    init: impl FnMut() -> T,
    what: &'static str,
) -> Result<Vec<T>, DataFrameError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|source| DataFrameError::Allocation { what, source })?;
    v.resize_with(len, init);
    Ok(v)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, PartialEq)]
pub struct DataFrame {
    columns: Vec<Option<Column>>,
    row_count: usize,
}

impl DataFrame {
    /// Creates a table with `column_count` empty column slots and room for
    /// `row_count` rows in every column added later.
    pub fn new(row_count: usize, column_count: usize) -> Result<Self, DataFrameError> {
        let columns = filled(column_count, || None, "column slots")?;
        debug!(row_count, column_count, "created dataframe");
        Ok(DataFrame { columns, row_count })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// The column at `index`, or `None` if it is out of range or not added yet.
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index).and_then(Option::as_ref)
    }

    /// Added columns together with their index.
    pub fn columns(&self) -> impl Iterator<Item = (usize, &Column)> {
        self.columns
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_ref().map(|c| (i, c)))
    }

    pub fn add_column(
        &mut self,
        index: usize,
        name: &str,
        data_type: DataType,
    ) -> Result<(), DataFrameError> {
        let slot = self.columns.get(index).ok_or(DataFrameError::IndexOutOfRange {
            axis: Axis::Column,
            index,
            len: self.columns.len(),
        })?;
        if name.is_empty() {
            return Err(DataFrameError::InvalidName {
                index,
                reason: "name is empty",
            });
        }
        if name.len() >= MAX_COLUMN_NAME_LENGTH {
            return Err(DataFrameError::InvalidName {
                index,
                reason: "name is too long",
            });
        }
        if slot.is_some() {
            return Err(DataFrameError::ColumnAlreadyExists(index));
        }
        if let Some((existing, _)) = self.columns().find(|(_, c)| c.name == name) {
            return Err(DataFrameError::DuplicateColumnName {
                name: name.to_owned(),
                existing,
            });
        }

        let data = ColumnData::with_len(data_type, self.row_count)?;
        self.columns[index] = Some(Column {
            name: name.to_owned(),
            data,
        });
        trace!(index, name, %data_type, "added column");
        Ok(())
    }

    /// Writes `value` into a cell. Text is copied; the previous text of the
    /// cell is released.
    pub fn set_value(
        &mut self,
        row: usize,
        column: usize,
        value: Value<'_>,
    ) -> Result<(), DataFrameError> {
        self.check_bounds(row, column)?;
        let col = self.columns[column]
            .as_mut()
            .ok_or(DataFrameError::MissingColumn(column))?;

        match (&mut col.data, value) {
            (ColumnData::Integer(cells), Value::Integer(v)) => cells[row] = v,
            (ColumnData::Float(cells), Value::Float(v)) => cells[row] = v,
            (ColumnData::Text(cells), Value::Text(v)) => cells[row] = v.map(str::to_owned),
            (data, value) => {
                return Err(DataFrameError::TypeMismatch {
                    column,
                    expected: data.data_type(),
                    actual: value.data_type(),
                })
            }
        }
        trace!(row, column, "set value");
        Ok(())
    }

    /// Reads a cell. Text is borrowed from the table.
    pub fn get_value(&self, row: usize, column: usize) -> Result<Value<'_>, DataFrameError> {
        self.check_bounds(row, column)?;
        let col = self.columns[column]
            .as_ref()
            .ok_or(DataFrameError::MissingColumn(column))?;

        Ok(match &col.data {
            ColumnData::Integer(cells) => Value::Integer(cells[row]),
            ColumnData::Float(cells) => Value::Float(cells[row]),
            ColumnData::Text(cells) => Value::Text(cells[row].as_deref()),
        })
    }

    /// Releases the table and everything it owns.
    pub fn destroy(self) {
        debug!(
            row_count = self.row_count,
            column_count = self.columns.len(),
            "destroying dataframe"
        );
        drop(self);
    }

    fn check_bounds(&self, row: usize, column: usize) -> Result<(), DataFrameError> {
        if column >= self.columns.len() {
            return Err(DataFrameError::IndexOutOfRange {
                axis: Axis::Column,
                index: column,
                len: self.columns.len(),
            });
        }
        if row >= self.row_count {
            return Err(DataFrameError::IndexOutOfRange {
                axis: Axis::Row,
                index: row,
                len: self.row_count,
            });
        }
        Ok(())
    }
}
