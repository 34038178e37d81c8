//! Feature derivation: hour-of-day and calendar-day per row.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::schema::{Field, ResolvedSchema};
use crate::table::{Column, ColumnData, Table, Temporal};
use crate::temporal::{parse_datetime, parse_temporal};

/// Where the derived fields came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimestampSource {
    RequestColumn { column: String },
    DateTimePair { date: String, time: String },
}

/// Derived fields, row-aligned with the cleaned table.
#[derive(Debug, Clone, PartialEq)]
pub struct Features {
    pub source: TimestampSource,
    pub hours: Vec<Option<u32>>,
    pub days: Vec<Option<NaiveDate>>,
}

impl Features {
    fn from_temporals(source: TimestampSource, values: Vec<Option<Temporal>>) -> Self {
        let hours = values.iter().map(|v| v.map(|t| t.hour())).collect();
        let days = values.iter().map(|v| v.and_then(|t| t.day())).collect();
        Self {
            source,
            hours,
            days,
        }
    }

    pub fn present_hours(&self) -> Vec<u32> {
        self.hours.iter().flatten().copied().collect()
    }

    pub fn present_days(&self) -> Vec<NaiveDate> {
        self.days.iter().flatten().copied().collect()
    }
}

/// Outcome of [`derive_features`].
#[derive(Debug, Clone, PartialEq)]
pub enum Derivation {
    Derived(Features),
    /// Neither a request timestamp nor a date + time pair exists.
    NoSource,
    /// The date + time pair exists but no row combined into a timestamp.
    Failed { reason: String },
}

impl Derivation {
    pub fn features(&self) -> Option<&Features> {
        match self {
            Derivation::Derived(f) => Some(f),
            _ => None,
        }
    }

    pub fn into_features(self) -> Option<Features> {
        match self {
            Derivation::Derived(f) => Some(f),
            _ => None,
        }
    }
}

/// Derives hour and day from the request timestamp column, falling back to
/// combining the date and time columns.
pub fn derive_features(table: &Table, schema: &ResolvedSchema) -> Derivation {
    if let Some(column) = schema
        .label(Field::RequestTimestamp)
        .and_then(|l| table.column(l))
    {
        let values = (0..table.rows()).map(|r| cell_temporal(column, r)).collect();
        info!(column = %column.name, "Deriving request hour and day");
        return Derivation::Derived(Features::from_temporals(
            TimestampSource::RequestColumn {
                column: column.name.clone(),
            },
            values,
        ));
    }

    let date = schema.label(Field::Date).and_then(|l| table.column(l));
    let time = schema.label(Field::Time).and_then(|l| table.column(l));
    let (Some(date), Some(time)) = (date, time) else {
        info!("No timestamp source, skipping hour/day derivation");
        return Derivation::NoSource;
    };

    let values: Vec<Option<Temporal>> = (0..table.rows())
        .map(|r| {
            let combined = format!("{} {}", date.display(r)?, time.display(r)?);
            parse_datetime(&combined).map(Temporal::DateTime)
        })
        .collect();

    let parsed = values.iter().flatten().count();
    if table.rows() > 0 && parsed == 0 {
        let reason = format!(
            "none of {} rows combined into a valid timestamp",
            table.rows()
        );
        warn!(%reason, "Timestamp synthesis failed");
        return Derivation::Failed { reason };
    }

    info!(
        date = %date.name,
        time = %time.name,
        parsed,
        "Synthesized request timestamp from date and time"
    );
    Derivation::Derived(Features::from_temporals(
        TimestampSource::DateTimePair {
            date: date.name.clone(),
            time: time.name.clone(),
        },
        values,
    ))
}

/// Temporal columns are used as-is; anything else goes through the parser.
fn cell_temporal(column: &Column, row: usize) -> Option<Temporal> {
    match &column.data {
        ColumnData::Temporal(values) => values[row],
        _ => parse_temporal(&column.display(row)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::clean;
    use crate::loader::read_table;
    use crate::schema::Schema;
    use chrono::{Datelike, NaiveDateTime};

    fn derive(csv: &str) -> (Table, Derivation) {
        let cleaned = clean(read_table(csv.as_bytes(), b',').unwrap(), &Schema::default());
        let derivation = derive_features(&cleaned.table, &cleaned.schema);
        (cleaned.table, derivation)
    }

    #[test]
    fn test_derive_from_request_timestamp() {
        let (table, derivation) = derive(
            "Request Timestamp,Booking Status\n\
             2024-03-23 03:10:00,Completed\n\
             2024-03-23 23:59:59,Completed\n\
             2024-03-24 00:00:01,Cancelled\n",
        );
        let features = derivation.into_features().unwrap();
        assert_eq!(
            features.source,
            TimestampSource::RequestColumn {
                column: "Request Timestamp".into()
            }
        );
        assert_eq!(features.hours, vec![Some(3), Some(23), Some(0)]);

        let ColumnData::Temporal(source) = &table.column("Request Timestamp").unwrap().data else {
            panic!("timestamp column should be parsed");
        };
        for (value, day) in source.iter().zip(&features.days) {
            assert_eq!(value.and_then(|t| t.day()), *day);
        }
        assert!(features.present_hours().iter().all(|h| *h <= 23));
    }

    #[test]
    fn test_lowercase_request_timestamp_label() {
        let (_, derivation) = derive("Request timestamp\n2024-01-05 17:30:00\n");
        let features = derivation.into_features().unwrap();
        assert_eq!(features.hours, vec![Some(17)]);
        assert_eq!(features.days[0].unwrap().day(), 5);
    }

    #[test]
    fn test_unparsable_request_timestamp_is_absent() {
        let (_, derivation) = derive("Request Timestamp\n2024-01-05 17:30:00\ngarbage\n");
        let features = derivation.into_features().unwrap();
        assert_eq!(features.hours, vec![Some(17), None]);
        assert_eq!(features.days[1], None);
    }

    #[test]
    fn test_derive_from_date_and_time() {
        let (_, derivation) = derive(
            "Date,Time,Booking Status\n\
             2024-03-23,12:29:38,Completed\n\
             2024-11-29,18:01:39,Incomplete\n",
        );
        let features = derivation.into_features().unwrap();
        assert!(matches!(
            features.source,
            TimestampSource::DateTimePair { .. }
        ));
        assert_eq!(features.hours, vec![Some(12), Some(18)]);

        let expected: NaiveDateTime = "2024-11-29T18:01:39".parse().unwrap();
        assert_eq!(features.days[1], Some(expected.date()));
    }

    #[test]
    fn test_date_time_pair_failure_is_reported() {
        let (_, derivation) = derive("Date,Time\n2024-03-23,soon\n2024-03-24,later\n");
        assert!(matches!(derivation, Derivation::Failed { .. }));
        assert!(derivation.features().is_none());
    }

    #[test]
    fn test_no_source_is_skipped() {
        let (_, derivation) = derive("Booking Status,Vehicle Type\nCompleted,Auto\n");
        assert_eq!(derivation, Derivation::NoSource);
    }

    #[test]
    fn test_empty_table_derives_empty_features() {
        let (table, derivation) = derive("Date,Time\n,10:00:00\n");
        assert!(table.is_empty());
        let features = derivation.into_features().unwrap();
        assert!(features.hours.is_empty());
        assert!(features.present_days().is_empty());
    }
}
