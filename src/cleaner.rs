//! Cleaning stage.
//!
//! Normalizes labels, binds the schema, drops rows missing critical values,
//! fills gaps by column type and parses date/time columns. The data keeps a
//! single "absent" representation; [`CleanReport`] records why each value
//! went missing.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::schema::{ResolvedSchema, Schema};
use crate::table::{ColumnData, Table};
use crate::temporal::parse_temporal;

/// What happened to one column during cleaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnReport {
    pub name: String,
    /// Empty or NA cells after the critical-row drop.
    pub missing: usize,
    /// Non-numeric text in a declared numeric column.
    pub coerced: usize,
    /// Cells replaced by zero or the unknown label.
    pub filled: usize,
    /// Present values no date/time layout accepted.
    pub unparsable: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanReport {
    pub rows_before: usize,
    pub rows_dropped: usize,
    pub columns: Vec<ColumnReport>,
}

impl CleanReport {
    pub fn rows_after(&self) -> usize {
        self.rows_before - self.rows_dropped
    }

    fn column(&mut self, name: &str) -> &mut ColumnReport {
        let idx = self
            .columns
            .iter()
            .position(|c| c.name == name)
            .unwrap_or_else(|| {
                self.columns.push(ColumnReport {
                    name: name.to_string(),
                    ..Default::default()
                });
                self.columns.len() - 1
            });
        &mut self.columns[idx]
    }
}

/// Output of [`clean`]: the table plus the schema bound to its labels.
#[derive(Debug, Clone)]
pub struct Cleaned {
    pub table: Table,
    pub schema: ResolvedSchema,
    pub report: CleanReport,
}

/// Runs every cleaning step over `table`.
#[tracing::instrument(skip_all, fields(rows = table.rows()))]
pub fn clean(mut table: Table, schema: &Schema) -> Cleaned {
    normalize_labels(&mut table);
    let resolved = schema.resolve(&table);

    let mut report = CleanReport {
        rows_before: table.rows(),
        ..Default::default()
    };

    report.rows_dropped = drop_incomplete_rows(&mut table, &resolved.critical);
    if report.rows_dropped > 0 {
        info!(
            dropped = report.rows_dropped,
            critical = ?resolved.critical,
            "Dropped rows missing critical values"
        );
    }

    for column in table.columns() {
        let missing = column.missing_count();
        report.column(&column.name).missing = missing;
    }

    coerce_numeric(&mut table, &resolved, &mut report);
    fill_numeric(&mut table, &mut report);
    parse_temporal_columns(&mut table, &resolved, &mut report);
    fill_text(&mut table, &resolved.unknown_label, &mut report);

    info!(rows = table.rows(), "Cleaning complete");
    Cleaned {
        table,
        schema: resolved,
        report,
    }
}

/// Strips surrounding whitespace from every column label.
pub fn normalize_labels(table: &mut Table) {
    for column in table.columns_mut() {
        let trimmed = column.name.trim();
        if trimmed.len() != column.name.len() {
            column.name = trimmed.to_string();
        }
    }
}

/// Drops rows with an absent value in any of `critical`. Returns the number
/// of rows removed.
pub fn drop_incomplete_rows(table: &mut Table, critical: &[String]) -> usize {
    if critical.is_empty() {
        return 0;
    }

    let columns: Vec<_> = critical.iter().filter_map(|n| table.column(n)).collect();
    let keep: Vec<bool> = (0..table.rows())
        .map(|row| columns.iter().all(|c| !c.is_missing(row)))
        .collect();

    let before = table.rows();
    table.retain_rows(&keep);
    before - table.rows()
}

/// Declared numeric columns read as text are converted; values that are not
/// numbers become absent.
fn coerce_numeric(table: &mut Table, schema: &ResolvedSchema, report: &mut CleanReport) {
    for name in &schema.numeric {
        let Some(column) = table.column_mut(name) else {
            continue;
        };
        let ColumnData::Text(values) = &column.data else {
            continue;
        };

        let mut coerced = 0;
        let numbers = values
            .iter()
            .map(|v| {
                let v = v.as_ref()?;
                let parsed = v.trim().parse::<f64>().ok();
                if parsed.is_none() {
                    coerced += 1;
                }
                parsed
            })
            .collect();

        if coerced > 0 {
            warn!(column = %name, coerced, "Non-numeric values in numeric column");
        }
        column.data = ColumnData::Numeric(numbers);
        report.column(name).coerced = coerced;
    }
}

fn fill_numeric(table: &mut Table, report: &mut CleanReport) {
    for column in table.columns_mut() {
        if let ColumnData::Numeric(values) = &mut column.data {
            let mut filled = 0;
            for v in values.iter_mut().filter(|v| v.is_none()) {
                *v = Some(0.0);
                filled += 1;
            }
            report.column(&column.name).filled = filled;
        }
    }
}

fn fill_text(table: &mut Table, unknown: &str, report: &mut CleanReport) {
    for column in table.columns_mut() {
        if let ColumnData::Text(values) = &mut column.data {
            let mut filled = 0;
            for v in values.iter_mut().filter(|v| v.is_none()) {
                *v = Some(unknown.to_string());
                filled += 1;
            }
            report.column(&column.name).filled = filled;
        }
    }
}

/// Parses date/time text columns value by value. Missing cells stay absent;
/// unparsable values become absent and are counted.
fn parse_temporal_columns(table: &mut Table, schema: &ResolvedSchema, report: &mut CleanReport) {
    for name in &schema.temporal {
        let Some(column) = table.column_mut(name) else {
            continue;
        };
        let ColumnData::Text(values) = &column.data else {
            continue;
        };

        let mut unparsable = 0;
        let parsed = values
            .iter()
            .map(|v| {
                let v = v.as_ref()?;
                let t = parse_temporal(v);
                if t.is_none() {
                    unparsable += 1;
                }
                t
            })
            .collect();

        if unparsable > 0 {
            warn!(column = %name, unparsable, "Unparsable date/time values");
        } else {
            debug!(column = %name, "Parsed date/time column");
        }
        column.data = ColumnData::Temporal(parsed);
        report.column(name).unparsable = unparsable;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::read_table;
    use crate::table::{ColumnKind, Temporal};

    const RIDES: &str = " Date ,Time,Booking Status,Vehicle Type,Ride Distance,Booking Value,Notes\n\
        2024-03-23,12:29:38,Completed,Auto,10.5,250,\n\
        ,08:00:00,Completed,Bike,3,100,lost\n\
        2024-03-24,not a time,null,,,n/a,\n\
        2024-03-25,21:15:00,Cancelled,Go Sedan,7,abc,\n";

    fn cleaned() -> Cleaned {
        clean(read_table(RIDES.as_bytes(), b',').unwrap(), &Schema::default())
    }

    #[test]
    fn test_labels_are_trimmed() {
        let out = cleaned();
        assert_eq!(out.table.names()[0], "Date");
    }

    #[test]
    fn test_rows_missing_critical_values_are_dropped() {
        let out = cleaned();
        assert_eq!(out.report.rows_before, 4);
        assert_eq!(out.report.rows_dropped, 1);
        assert_eq!(out.table.rows(), 3);
        assert_eq!(out.report.rows_after(), 3);

        let vehicles = out.table.column("Vehicle Type").unwrap().labels();
        assert!(!vehicles.contains(&"Bike".to_string()));
    }

    #[test]
    fn test_no_missing_numeric_or_text_after_cleaning() {
        let out = cleaned();
        for column in out.table.columns() {
            if column.kind() != ColumnKind::Temporal {
                assert_eq!(column.missing_count(), 0, "column {}", column.name);
            }
        }
    }

    #[test]
    fn test_fill_values() {
        let out = cleaned();
        let distance = out.table.column("Ride Distance").unwrap();
        assert_eq!(distance.numbers(), Some(vec![10.5, 0.0, 7.0]));

        let status = out.table.column("Booking Status").unwrap();
        assert_eq!(status.labels(), vec!["Completed", "Unknown", "Cancelled"]);

        // text at load time, so still text once the only value was dropped
        let notes = out.table.column("Notes").unwrap();
        assert_eq!(notes.kind(), ColumnKind::Text);
        assert_eq!(notes.labels(), vec!["Unknown", "Unknown", "Unknown"]);
    }

    #[test]
    fn test_declared_numeric_column_is_coerced() {
        let out = cleaned();
        let value = out.table.column("Booking Value").unwrap();
        assert_eq!(value.kind(), ColumnKind::Numeric);
        assert_eq!(value.numbers(), Some(vec![250.0, 0.0, 0.0]));

        let report = out
            .report
            .columns
            .iter()
            .find(|c| c.name == "Booking Value")
            .unwrap();
        assert_eq!(report.missing, 1);
        assert_eq!(report.coerced, 1);
        assert_eq!(report.filled, 2);
    }

    #[test]
    fn test_temporal_columns_parsed_per_value() {
        let out = cleaned();
        let time = out.table.column("Time").unwrap();
        assert_eq!(time.kind(), ColumnKind::Temporal);
        assert_eq!(time.missing_count(), 1);

        let ColumnData::Temporal(values) = &out.table.column("Date").unwrap().data else {
            panic!("Date should be temporal");
        };
        assert!(values.iter().all(|v| matches!(v, Some(Temporal::Date(_)))));

        let report = out.report.columns.iter().find(|c| c.name == "Time").unwrap();
        assert_eq!(report.unparsable, 1);
        assert_eq!(report.filled, 0);
    }

    #[test]
    fn test_table_without_critical_columns_keeps_all_rows() {
        let table = read_table("a,b\n1,\n,x\n".as_bytes(), b',').unwrap();
        let out = clean(table, &Schema::default());
        assert_eq!(out.report.rows_dropped, 0);
        assert_eq!(out.table.rows(), 2);
    }

    #[test]
    fn test_all_rows_dropped_leaves_empty_table() {
        let table = read_table("Date,Booking Status\n,Completed\nnull,Cancelled\n".as_bytes(), b',')
            .unwrap();
        let out = clean(table, &Schema::default());
        assert!(out.table.is_empty());
        assert_eq!(out.report.rows_dropped, 2);
    }
}
