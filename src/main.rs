use simplidf::{write_csv, DataFrame, DataType, Value};
use std::error::Error;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data.csv"));

    let ages = [25, 30, 22];
    let names = ["Alice", "Bob", "Charlie"];

    let mut df = DataFrame::new(ages.len(), 2)?;
    df.add_column(0, "Age", DataType::Integer)?;
    df.add_column(1, "Name", DataType::Text)?;
    for (row, (age, name)) in ages.iter().zip(names.iter()).enumerate() {
        df.set_value(row, 0, Value::Integer(*age))?;
        df.set_value(row, 1, Value::Text(Some(*name)))?;
    }

    print!("{}", df);
    write_csv(&df, &path)?;
    tracing::info!(path = %path.display(), "saved dataframe");

    df.destroy();
    Ok(())
}
