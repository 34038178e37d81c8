//! Delimited-file loader.
//!
//! Reads a CSV (optionally gzip-compressed) into a [`Table`], treating the
//! usual NA spellings as missing and inferring numeric columns.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use tracing::{debug, info};

use crate::table::{Column, ColumnData, Table};

/// Cell spellings read as missing.
pub const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_na(value: &str) -> bool {
    NA_TOKENS.contains(&value)
}

/// Loads the file at `path`. Files ending in `.gz` are decompressed on the fly.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or is not a well-formed
/// delimited file with a header row.
#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub fn load_table(path: &Path, delimiter: u8) -> Result<Table> {
    let file =
        File::open(path).with_context(|| format!("failed to open '{}'", path.display()))?;

    let gzip = path.extension().and_then(|e| e.to_str()) == Some("gz");
    debug!(gzip, "Opened input file");

    let table = if gzip {
        read_table(GzDecoder::new(file), delimiter)
    } else {
        read_table(file, delimiter)
    }
    .with_context(|| format!("failed to parse '{}'", path.display()))?;

    info!(
        rows = table.rows(),
        columns = table.columns().len(),
        "Loaded dataset"
    );
    Ok(table)
}

/// Reads delimited records from any reader.
pub fn read_table<R: Read>(reader: R, delimiter: u8) -> Result<Table> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
        bail!("no header row");
    }
    let names = dedupe_labels(headers.iter());

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];
    for (idx, result) in rdr.records().enumerate() {
        let record = result?;
        if record.len() > names.len() {
            // header is line 1
            bail!(
                "line {} has {} fields, expected {}",
                idx + 2,
                record.len(),
                names.len()
            );
        }
        for (col, values) in cells.iter_mut().enumerate() {
            let cell = record.get(col).filter(|v| !is_na(v)).map(str::to_string);
            values.push(cell);
        }
    }

    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::new(name, infer(values)))
        .collect();

    Table::new(columns)
}

/// Appends `.1`, `.2`, ... to repeated labels.
fn dedupe_labels<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for label in labels {
        let mut candidate = label.to_string();
        let mut n = 1;
        while out.contains(&candidate) {
            candidate = format!("{label}.{n}");
            n += 1;
        }
        out.push(candidate);
    }
    out
}

/// A column is numeric when every present value parses as a number.
fn infer(values: Vec<Option<String>>) -> ColumnData {
    let numeric = values
        .iter()
        .flatten()
        .all(|v| v.trim().parse::<f64>().is_ok());

    if numeric {
        ColumnData::Numeric(
            values
                .iter()
                .map(|v| v.as_ref().and_then(|s| s.trim().parse().ok()))
                .collect(),
        )
    } else {
        ColumnData::Text(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnKind;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::env;
    use std::fs;
    use std::io::Write;

    const SAMPLE: &str = "Date,Booking Status, Ride Distance ,Customer Rating\n\
        2024-03-23,Completed,12.5,4.1\n\
        2024-03-24,null,,\n\
        ,Cancelled by Driver,3,NA\n";

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    #[test]
    fn test_read_table_infers_types_and_na() {
        let table = read_table(SAMPLE.as_bytes(), b',').unwrap();

        assert_eq!(table.rows(), 3);
        // labels are kept verbatim; trimming is the cleaner's job
        assert_eq!(
            table.names(),
            vec!["Date", "Booking Status", " Ride Distance ", "Customer Rating"]
        );

        let distance = table.column(" Ride Distance ").unwrap();
        assert_eq!(distance.kind(), ColumnKind::Numeric);
        assert_eq!(distance.missing_count(), 1);

        let status = table.column("Booking Status").unwrap();
        assert_eq!(status.kind(), ColumnKind::Text);
        assert_eq!(status.missing_count(), 1);

        let rating = table.column("Customer Rating").unwrap();
        assert_eq!(rating.kind(), ColumnKind::Numeric);
        assert_eq!(rating.missing_count(), 2);

        assert_eq!(table.column("Date").unwrap().missing_count(), 1);
    }

    #[test]
    fn test_all_missing_column_is_numeric() {
        let table = read_table("a,b\n1,\n2,null\n".as_bytes(), b',').unwrap();
        assert_eq!(table.column("b").unwrap().kind(), ColumnKind::Numeric);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = read_table("a,b,c\n1,2\n".as_bytes(), b',').unwrap();
        assert_eq!(table.rows(), 1);
        assert_eq!(table.column("c").unwrap().missing_count(), 1);
    }

    #[test]
    fn test_long_rows_are_rejected() {
        let result = read_table("a,b\n1,2,3\n".as_bytes(), b',');
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_labels_are_suffixed() {
        let table = read_table("x,x,x\n1,2,3\n".as_bytes(), b',').unwrap();
        assert_eq!(table.names(), vec!["x", "x.1", "x.2"]);
    }

    #[test]
    fn test_custom_delimiter() {
        let table = read_table("a;b\n1;foo\n".as_bytes(), b';').unwrap();
        assert_eq!(table.names(), vec!["a", "b"]);
        assert_eq!(table.column("a").unwrap().numbers(), Some(vec![1.0]));
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(read_table("".as_bytes(), b',').is_err());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = load_table(Path::new("/nonexistent/ncr_ride_bookings.csv"), b',');
        assert!(result.is_err());
    }

    #[test]
    fn test_load_gzip_matches_plain() {
        let plain = temp_path("ride_insights_loader_plain.csv");
        let gz = temp_path("ride_insights_loader_plain.csv.gz");

        fs::write(&plain, SAMPLE).unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(SAMPLE.as_bytes()).unwrap();
        fs::write(&gz, encoder.finish().unwrap()).unwrap();

        let a = load_table(Path::new(&plain), b',').unwrap();
        let b = load_table(Path::new(&gz), b',').unwrap();
        assert_eq!(a, b);

        fs::remove_file(&plain).unwrap();
        fs::remove_file(&gz).unwrap();
    }
}
