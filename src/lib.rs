//! In-memory fixed-schema table with integer, float and text columns, and a
//! CSV reader and writer for it.

pub mod csv;
pub mod dataframe;
mod display;
pub mod error;
pub mod lexer;

pub use crate::csv::{
    parse_csv, read_csv, read_csv_with, write_csv, write_csv_to, NumericParsing, ReadOptions,
};
pub use crate::dataframe::{
    Column, ColumnData, DataFrame, DataType, Value, MAX_COLUMN_NAME_LENGTH,
};
pub use crate::error::{Axis, CsvError, DataFrameError};
