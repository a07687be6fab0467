use crate::dataframe::{Column, ColumnData, DataFrame, DataType, Value};
use crate::error::CsvError;
use crate::lexer::{float_prefix, integer_prefix, split_line};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str;
use tracing::{debug, instrument, warn};

/// How numeric fields are converted when reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumericParsing {
    /// Read the leading number of a field and ignore the rest, like C's
    /// `atoi`/`atof`. A field with no leading number becomes 0.
    #[default]
    Permissive,
    /// The whole field must be a number.
    Strict,
}

#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    pub numeric: NumericParsing,
}

/// Reads a CSV file. The file must be UTF-8; other encodings fail with
/// [`CsvError::InvalidUtf8`].
pub fn read_csv(path: &Path, types: &[DataType]) -> Result<DataFrame, CsvError> {
    read_csv_with(path, types, &ReadOptions::default())
}

#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn read_csv_with(
    path: &Path,
    types: &[DataType],
    options: &ReadOptions,
) -> Result<DataFrame, CsvError> {
    let bytes = fs::read(path).map_err(CsvError::io(path))?;
    let text = str::from_utf8(&bytes).map_err(|source| CsvError::InvalidUtf8 {
        path: path.to_owned(),
        source,
    })?;
    parse_csv(text, types, options)
}

/// Builds a table from CSV text: a header line with one name per entry of
/// `types`, then one line per row. The last line may end with a newline; a
/// blank line anywhere else is a row with no fields. A trailing `\r` on any
/// line is ignored.
pub fn parse_csv(
    text: &str,
    types: &[DataType],
    options: &ReadOptions,
) -> Result<DataFrame, CsvError> {
    let text = text.strip_suffix('\n').unwrap_or(text);
    let mut lines = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .enumerate()
        .map(|(i, line)| (i + 1, line));

    let header = match lines.next() {
        Some((_, line)) if !line.is_empty() => split_line(line),
        _ => return Err(CsvError::MissingHeader),
    };
    if header.len() != types.len() {
        return Err(CsvError::SchemaMismatch {
            expected: types.len(),
            found: header.len(),
        });
    }

    let rows = lines.collect::<Vec<_>>();

    let mut df = DataFrame::new(rows.len(), types.len())?;
    for (i, (name, data_type)) in header.iter().zip(types).enumerate() {
        df.add_column(i, name, *data_type)
            .map_err(|source| CsvError::ColumnCreation {
                name: name.to_owned(),
                source,
            })?;
    }

    for (row, (line_no, line)) in rows.into_iter().enumerate() {
        let fields = split_line(line);
        if fields.len() != types.len() {
            return Err(CsvError::RowArityMismatch {
                line: line_no,
                expected: types.len(),
                found: fields.len(),
            });
        }
        for (column, (field, data_type)) in fields.iter().zip(types).enumerate() {
            let value = coerce(field, *data_type, options.numeric, line_no, column)?;
            df.set_value(row, column, value)?;
        }
    }

    debug!(
        rows = df.row_count(),
        columns = df.column_count(),
        "parsed csv"
    );
    Ok(df)
}

fn coerce(
    field: &str,
    data_type: DataType,
    numeric: NumericParsing,
    line: usize,
    column: usize,
) -> Result<Value<'_>, CsvError> {
    let invalid = || CsvError::InvalidNumber {
        line,
        column,
        field: field.to_owned(),
        expected: data_type,
    };

    Ok(match (data_type, numeric) {
        (DataType::Text, _) => Value::Text(Some(field)),
        (DataType::Integer, NumericParsing::Strict) => {
            Value::Integer(field.trim().parse().map_err(|_| invalid())?)
        }
        (DataType::Float, NumericParsing::Strict) => {
            Value::Float(field.trim().parse().map_err(|_| invalid())?)
        }
        (DataType::Integer, NumericParsing::Permissive) => {
            Value::Integer(integer_prefix(field).unwrap_or_else(|| {
                warn!(line, column, field, "no integer in field, storing 0");
                0
            }))
        }
        (DataType::Float, NumericParsing::Permissive) => {
            Value::Float(float_prefix(field).unwrap_or_else(|| {
                warn!(line, column, field, "no number in field, storing 0");
                0.0
            }))
        }
    })
}

/// Writes the table as CSV. Fails before touching the file if a column
/// has not been added.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn write_csv(df: &DataFrame, path: &Path) -> Result<(), CsvError> {
    let columns = named_columns(df)?;
    let file = File::create(path).map_err(CsvError::io(path))?;
    let mut out = BufWriter::new(file);
    write_table(&columns, df.row_count(), &mut out)
        .and_then(|_| out.flush())
        .map_err(CsvError::io(path))?;
    debug!(rows = df.row_count(), "wrote csv");
    Ok(())
}

pub fn write_csv_to(df: &DataFrame, out: &mut impl Write) -> Result<(), CsvError> {
    let columns = named_columns(df)?;
    write_table(&columns, df.row_count(), out)?;
    Ok(())
}

// added columns always have a name, so a nameless slot is one never added
fn named_columns(df: &DataFrame) -> Result<Vec<&Column>, CsvError> {
    (0..df.column_count())
        .map(|i| df.column(i).ok_or(CsvError::EmptyColumnName(i)))
        .collect()
}

fn write_quoted(out: &mut impl Write, text: &str) -> io::Result<()> {
    write!(out, "\"{}\"", text.replace('"', "\"\""))
}

fn write_table(columns: &[&Column], row_count: usize, out: &mut impl Write) -> io::Result<()> {
    if columns.is_empty() {
        return Ok(());
    }

    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            out.write_all(b",")?;
        }
        write_quoted(out, column.name())?;
    }
    out.write_all(b"\n")?;

    for row in 0..row_count {
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                out.write_all(b",")?;
            }
            match column.data() {
                ColumnData::Integer(cells) => write!(out, "{}", cells[row])?,
                ColumnData::Float(cells) => write!(out, "{:.2}", cells[row])?,
                ColumnData::Text(cells) => match &cells[row] {
                    Some(text) => write_quoted(out, text)?,
                    None => out.write_all(b"\"NULL\"")?,
                },
            }
        }
        out.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataFrameError;

    const TYPES: [DataType; 3] = [DataType::Integer, DataType::Float, DataType::Text];

    fn parse(text: &str) -> Result<DataFrame, CsvError> {
        parse_csv(text, &TYPES, &ReadOptions::default())
    }

    #[test]
    fn test_read_csv() {
        let tempdir = tempfile::tempdir().unwrap();
        let csv_path = tempdir.path().join("data.csv");
        std::fs::write(
            &csv_path,
            "ID,Value,Name\n1,3.14,Alice\n2,2.718,Bob\n3,1.618,Charlie\n",
        )
        .unwrap();

        let df = read_csv(&csv_path, &TYPES).unwrap();
        assert_eq!(df.row_count(), 3);
        assert_eq!(df.column_count(), 3);

        let names = df.columns().map(|(_, c)| c.name()).collect::<Vec<_>>();
        assert_eq!(names, vec!["ID", "Value", "Name"]);
        assert_eq!(df.column(0).unwrap().data_type(), DataType::Integer);
        assert_eq!(df.column(1).unwrap().data_type(), DataType::Float);
        assert_eq!(df.column(2).unwrap().data_type(), DataType::Text);

        assert_eq!(df.get_value(0, 0).unwrap().as_integer(), Some(1));
        assert!((df.get_value(0, 1).unwrap().as_float().unwrap() - 3.14).abs() < 1e-3);
        assert_eq!(df.get_value(0, 2).unwrap(), Value::Text(Some("Alice")));
        assert_eq!(df.get_value(1, 0).unwrap(), Value::Integer(2));
        assert!((df.get_value(1, 1).unwrap().as_float().unwrap() - 2.718).abs() < 1e-3);
        assert_eq!(df.get_value(2, 2).unwrap(), Value::Text(Some("Charlie")));
    }

    #[test]
    fn test_line_endings() {
        let df = parse("ID,Value,Name\r\n1,1.5,a\r\n2,2.5, b \r\n").unwrap();
        assert_eq!(df.row_count(), 2);
        assert_eq!(df.get_value(1, 0).unwrap(), Value::Integer(2));
        assert_eq!(df.get_value(1, 2).unwrap(), Value::Text(Some("b")));

        let df = parse("ID,Value,Name\n1,1.5,a\n2,2.5,b").unwrap();
        assert_eq!(df.row_count(), 2);
        let df = parse("ID,Value,Name\n1,1.5,a\n").unwrap();
        assert_eq!(df.row_count(), 1);
    }

    #[test]
    fn test_blank_line_is_a_short_row() {
        let err = parse("ID,Value,Name\n1,1.0,a\n\n2,2.0,b\n").unwrap_err();
        assert!(matches!(
            err,
            CsvError::RowArityMismatch {
                line: 3,
                expected: 3,
                found: 0
            }
        ));
        assert!(matches!(
            parse("ID,Value,Name\n1,1.0,a\n\n"),
            Err(CsvError::RowArityMismatch { line: 3, .. })
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        let tempdir = tempfile::tempdir().unwrap();
        let csv_path = tempdir.path().join("latin1.csv");
        std::fs::write(&csv_path, b"ID,Value,Name\n1,1.0,caf\xe9\n").unwrap();

        let err = read_csv(&csv_path, &TYPES).unwrap_err();
        match err {
            CsvError::InvalidUtf8 { path, source } => {
                assert_eq!(path, csv_path);
                assert_eq!(source.valid_up_to(), 23);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_header_only() {
        let df = parse("ID,Value,Name").unwrap();
        assert_eq!(df.row_count(), 0);
        assert_eq!(df.columns().count(), 3);
    }

    #[test]
    fn test_missing_file() {
        let tempdir = tempfile::tempdir().unwrap();
        let err = read_csv(&tempdir.path().join("nope.csv"), &TYPES).unwrap_err();
        assert!(matches!(err, CsvError::Io { .. }));
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(parse(""), Err(CsvError::MissingHeader)));
    }

    #[test]
    fn test_schema_mismatch() {
        assert!(matches!(
            parse("ID,Value\n1,2\n"),
            Err(CsvError::SchemaMismatch {
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn test_row_arity_mismatch() {
        let err = parse("ID,Value,Name\n1,3.14,Alice\n2,2.718\n3,1.618,Charlie\n").unwrap_err();
        assert!(matches!(
            err,
            CsvError::RowArityMismatch {
                line: 3,
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn test_duplicate_header_names() {
        let err = parse("ID,ID,Name\n").unwrap_err();
        match err {
            CsvError::ColumnCreation { name, source } => {
                assert_eq!(name, "ID");
                assert!(matches!(
                    source,
                    DataFrameError::DuplicateColumnName { existing: 0, .. }
                ));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_permissive_numbers() {
        let df = parse("ID,Value,Name\nabc,x,n\n12abc,2.5kg,m\n").unwrap();
        assert_eq!(df.get_value(0, 0).unwrap(), Value::Integer(0));
        assert_eq!(df.get_value(0, 1).unwrap(), Value::Float(0.0));
        assert_eq!(df.get_value(1, 0).unwrap(), Value::Integer(12));
        assert_eq!(df.get_value(1, 1).unwrap(), Value::Float(2.5));
    }

    #[test]
    fn test_strict_numbers() {
        let options = ReadOptions {
            numeric: NumericParsing::Strict,
        };
        let df = parse_csv("ID,Value,Name\n 7 ,\"1.25\",n\n", &TYPES, &options).unwrap();
        assert_eq!(df.get_value(0, 0).unwrap(), Value::Integer(7));
        assert_eq!(df.get_value(0, 1).unwrap(), Value::Float(1.25));

        let err = parse_csv("ID,Value,Name\n1,2.5,a\n12abc,1,b\n", &TYPES, &options).unwrap_err();
        assert!(matches!(
            err,
            CsvError::InvalidNumber {
                line: 3,
                column: 0,
                expected: DataType::Integer,
                ..
            }
        ));
    }

    fn sample() -> DataFrame {
        let mut df = DataFrame::new(3, 3).unwrap();
        df.add_column(0, "ID", DataType::Integer).unwrap();
        df.add_column(1, "Value", DataType::Float).unwrap();
        df.add_column(2, "Name", DataType::Text).unwrap();
        let rows = [
            (1, 3.14159, Some("Alice")),
            (-2, 2.5, None),
            (3, 0.1, Some(r#"say "hi", then leave"#)),
        ];
        for (row, (id, value, name)) in rows.iter().enumerate() {
            df.set_value(row, 0, Value::Integer(*id)).unwrap();
            df.set_value(row, 1, Value::Float(*value)).unwrap();
            df.set_value(row, 2, Value::Text(*name)).unwrap();
        }
        df
    }

    #[test]
    fn test_write_csv() {
        let mut out = Vec::new();
        write_csv_to(&sample(), &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            concat!(
                "\"ID\",\"Value\",\"Name\"\n",
                "1,3.14,\"Alice\"\n",
                "-2,2.50,\"NULL\"\n",
                "3,0.10,\"say \"\"hi\"\", then leave\"\n",
            )
        );
    }

    #[test]
    fn test_write_then_read() {
        let tempdir = tempfile::tempdir().unwrap();
        let csv_path = tempdir.path().join("out.csv");
        let df = sample();
        write_csv(&df, &csv_path).unwrap();

        let loaded = read_csv(&csv_path, &TYPES).unwrap();
        assert_eq!(loaded.row_count(), df.row_count());
        for i in 0..3 {
            assert_eq!(loaded.column(i).unwrap().name(), df.column(i).unwrap().name());
        }
        assert_eq!(loaded.get_value(1, 0).unwrap(), Value::Integer(-2));
        assert_eq!(loaded.get_value(0, 1).unwrap(), Value::Float(3.14));
        assert_eq!(loaded.get_value(1, 1).unwrap(), Value::Float(2.5));
        assert_eq!(
            loaded.get_value(2, 2).unwrap(),
            Value::Text(Some(r#"say "hi", then leave"#))
        );
        // a missing value comes back as the text NULL
        assert_eq!(loaded.get_value(1, 2).unwrap(), Value::Text(Some("NULL")));
    }

    #[test]
    fn test_write_null_text() {
        let tempdir = tempfile::tempdir().unwrap();
        let csv_path = tempdir.path().join("null.csv");
        let mut df = DataFrame::new(2, 1).unwrap();
        df.add_column(0, "Name", DataType::Text).unwrap();
        df.set_value(0, 0, Value::Text(Some("Alice"))).unwrap();

        write_csv(&df, &csv_path).unwrap();
        let written = std::fs::read_to_string(&csv_path).unwrap();
        let lines = written.lines().collect::<Vec<_>>();
        assert_eq!(lines, vec!["\"Name\"", "\"Alice\"", "\"NULL\""]);
    }

    #[test]
    fn test_write_missing_column_name() {
        let tempdir = tempfile::tempdir().unwrap();
        let csv_path = tempdir.path().join("bad.csv");
        let mut df = DataFrame::new(1, 2).unwrap();
        df.add_column(0, "a", DataType::Integer).unwrap();

        let err = write_csv(&df, &csv_path).unwrap_err();
        assert!(matches!(err, CsvError::EmptyColumnName(1)));
        assert!(!csv_path.exists());
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_to_failing_writer() {
        let err = write_csv_to(&sample(), &mut BrokenPipe).unwrap_err();
        match err {
            CsvError::Stream(e) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_write_to_missing_directory() {
        let tempdir = tempfile::tempdir().unwrap();
        let csv_path = tempdir.path().join("missing").join("out.csv");
        let err = write_csv(&sample(), &csv_path).unwrap_err();
        assert!(matches!(err, CsvError::Io { .. }));
    }
}
