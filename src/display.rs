use crate::dataframe::{DataFrame, Value};
use std::fmt;

/// Tab-separated dump for the console: names on the first line, then one
/// line per row.
impl fmt::Display for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = (0..self.column_count())
            .map(|i| self.column(i).map_or("", |c| c.name()))
            .collect::<Vec<_>>();
        writeln!(f, "{}", names.join("\t"))?;

        for row in 0..self.row_count() {
            for column in 0..self.column_count() {
                match self.get_value(row, column) {
                    Ok(Value::Integer(v)) => write!(f, "{}\t", v)?,
                    Ok(Value::Float(v)) => write!(f, "{:.2}\t", v)?,
                    Ok(Value::Text(Some(s))) => write!(f, "{}\t", s)?,
                    Ok(Value::Text(None)) => write!(f, "NULL\t")?,
                    Err(_) => write!(f, "UNKNOWN\t")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
