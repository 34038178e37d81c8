//! Console output and file exports.
//!
//! Insights, overviews and the digest are printed to stdout; the digest can
//! also be written as JSON and the cleaned table as CSV.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::analyzers::analyzer::digest_lines;
use crate::analyzers::types::{Digest, Insight};
use crate::cleaner::CleanReport;
use crate::features::Features;
use crate::table::Table;
use csv::WriterBuilder;
use std::fs::File;

/// Prints a report's heading and lines.
pub fn print_insight(insight: &Insight) {
    println!("\n {}", insight.heading);
    for line in &insight.lines {
        println!("{line}");
    }
}

/// Prints row/column counts, per-column type and present counts, the first
/// `head` rows and the column labels.
pub fn print_overview(table: &Table, head: usize) {
    println!("\n Dataset Info ");
    println!("{} rows, {} columns", table.rows(), table.columns().len());
    for column in table.columns() {
        println!(
            "  {:<40} {:>8} non-missing  {:?}",
            column.name,
            table.rows() - column.missing_count(),
            column.kind()
        );
    }

    println!("\n First {head} Rows ");
    println!("{}", table.names().join(" | "));
    for row in 0..head.min(table.rows()) {
        let cells: Vec<String> = table
            .columns()
            .iter()
            .map(|c| c.display(row).map(|v| v.into_owned()).unwrap_or_else(|| "NaN".into()))
            .collect();
        println!("{}", cells.join(" | "));
    }

    println!("\n Column Names ");
    println!("{:?}", table.names());
}

/// Prints the missing-cell count of every column.
pub fn print_missing(title: &str, table: &Table) {
    println!("\n {title} ");
    for (name, missing) in table.missing_counts() {
        println!("  {name:<40} {missing}");
    }
}

/// Prints what cleaning changed, separating the causes of missing values.
pub fn print_clean_report(report: &CleanReport) {
    println!("\n Cleaning Summary ");
    println!(
        "  rows: {} before, {} dropped for missing critical values, {} kept",
        report.rows_before,
        report.rows_dropped,
        report.rows_after()
    );
    for c in report
        .columns
        .iter()
        .filter(|c| c.missing + c.coerced + c.unparsable > 0)
    {
        println!(
            "  {:<40} missing {:>6}  coerced {:>6}  filled {:>6}  unparsable {:>6}",
            c.name, c.missing, c.coerced, c.filled, c.unparsable
        );
    }
}

/// Prints the end-of-run digest.
pub fn print_digest(digest: &Digest) {
    println!("\n Overall Summary of Key Insights ");
    for line in digest_lines(digest) {
        println!("{line}");
    }
}

/// Writes the digest as pretty-printed JSON.
pub fn write_digest_json(path: &str, digest: &Digest) -> Result<()> {
    let body = serde_json::to_string_pretty(digest)?;
    std::fs::write(path, body).with_context(|| format!("failed to write digest to '{path}'"))?;
    info!(path, "Digest written");
    Ok(())
}

/// Writes the cleaned table to a CSV file, followed by the derived
/// `Request Hour` and `Request Day` columns when present.
pub fn write_cleaned_csv(path: &str, table: &Table, features: Option<&Features>) -> Result<()> {
    debug!(path, rows = table.rows(), "Writing cleaned CSV");

    let file = File::create(path).with_context(|| format!("failed to create '{path}'"))?;
    let mut writer = WriterBuilder::new().from_writer(file);

    let mut header: Vec<&str> = table.names();
    if features.is_some() {
        header.extend(["Request Hour", "Request Day"]);
    }
    writer.write_record(&header)?;

    for row in 0..table.rows() {
        let mut record: Vec<String> = table
            .columns()
            .iter()
            .map(|c| c.display(row).map(|v| v.into_owned()).unwrap_or_default())
            .collect();
        if let Some(f) = features {
            record.push(f.hours[row].map(|h| h.to_string()).unwrap_or_default());
            record.push(f.days[row].map(|d| d.to_string()).unwrap_or_default());
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;

    info!(path, rows = table.rows(), "Cleaned data written");
    Ok(())
}
