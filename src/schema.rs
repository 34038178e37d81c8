//! Declared dataset schema.
//!
//! [`Schema`] names the logical fields the reports need and the source labels
//! accepted for each. It is resolved once against the normalized header into a
//! [`ResolvedSchema`], which every later stage consults instead of matching
//! column labels itself.
//!
//! A schema can be overridden with a JSON file; keys left out keep their
//! defaults:
//! ```json
//! {
//!   "fields": { "vehicle_type": ["Vehicle Type", "Cab Type"] },
//!   "unknown_label": "N/A"
//! }
//! ```

use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::table::{ColumnKind, Table};

/// Logical fields the pipeline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    RequestTimestamp,
    Date,
    Time,
    BookingStatus,
    VehicleType,
    PickupLocation,
    PaymentMethod,
    RideDistance,
    BookingValue,
    TripDuration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schema {
    /// Accepted source labels per logical field, first match wins.
    pub fields: BTreeMap<Field, Vec<String>>,
    /// Substrings (case-sensitive) marking a column as critical.
    pub critical_markers: Vec<String>,
    /// Substrings (case-insensitive) marking a text column as date/time.
    pub temporal_markers: Vec<String>,
    /// Substring (case-insensitive) locating the status column.
    pub status_marker: String,
    /// Columns coerced to numbers and zero-filled; also the correlation set.
    pub numeric_fields: Vec<String>,
    /// Fill value for missing text cells.
    pub unknown_label: String,
}

impl Default for Schema {
    fn default() -> Self {
        let labels = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let fields = BTreeMap::from([
            (
                Field::RequestTimestamp,
                labels(&["Request Timestamp", "Request timestamp"]),
            ),
            (Field::Date, labels(&["Date"])),
            (Field::Time, labels(&["Time"])),
            (Field::BookingStatus, labels(&["Booking Status"])),
            (Field::VehicleType, labels(&["Vehicle Type"])),
            (Field::PickupLocation, labels(&["Pickup Location"])),
            (Field::PaymentMethod, labels(&["Payment Method"])),
            (Field::RideDistance, labels(&["Ride Distance"])),
            (Field::BookingValue, labels(&["Booking Value"])),
            (Field::TripDuration, labels(&["trip_duration_min"])),
        ]);

        Self {
            fields,
            critical_markers: labels(&["Request", "Timestamp", "Date"]),
            temporal_markers: labels(&["time", "date"]),
            status_marker: "status".to_string(),
            numeric_fields: labels(&[
                "Avg VTAT",
                "Avg CTAT",
                "Booking Value",
                "Ride Distance",
                "Driver Ratings",
                "Customer Rating",
            ]),
            unknown_label: "Unknown".to_string(),
        }
    }
}

impl Schema {
    /// Loads a schema from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read schema file '{path}'"))?;
        let mut schema: Schema = serde_json::from_str(&content)
            .with_context(|| format!("invalid schema file '{path}'"))?;

        // overridden fields replace their default labels, the rest are kept
        let mut fields = Schema::default().fields;
        fields.extend(std::mem::take(&mut schema.fields));
        schema.fields = fields;
        Ok(schema)
    }

    /// Binds the declared fields and markers to the labels present in `table`.
    pub fn resolve(&self, table: &Table) -> ResolvedSchema {
        let names = table.names();

        let mut fields = HashMap::new();
        for (field, accepted) in &self.fields {
            if let Some(label) = accepted.iter().find(|l| names.contains(&l.as_str())) {
                fields.insert(*field, label.clone());
            }
        }

        let critical = names
            .iter()
            .filter(|n| self.critical_markers.iter().any(|m| n.contains(m.as_str())))
            .map(|n| n.to_string())
            .collect();

        let temporal = table
            .columns()
            .iter()
            .filter(|c| c.kind() == ColumnKind::Text)
            .filter(|c| contains_ignore_case(&c.name, &self.temporal_markers))
            .map(|c| c.name.clone())
            .collect();

        let status = names
            .iter()
            .find(|n| contains_ignore_case(n, std::slice::from_ref(&self.status_marker)))
            .map(|n| n.to_string());

        let numeric = self
            .numeric_fields
            .iter()
            .filter(|l| names.contains(&l.as_str()))
            .cloned()
            .collect();

        ResolvedSchema {
            fields,
            critical,
            temporal,
            status,
            numeric,
            unknown_label: self.unknown_label.clone(),
        }
    }
}

fn contains_ignore_case(label: &str, markers: &[String]) -> bool {
    let lower = label.to_lowercase();
    markers.iter().any(|m| lower.contains(&m.to_lowercase()))
}

/// A [`Schema`] bound to the columns of one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedSchema {
    fields: HashMap<Field, String>,
    /// Labels of critical columns.
    pub critical: Vec<String>,
    /// Labels of text columns to parse as date/time.
    pub temporal: Vec<String>,
    /// Label of the first status-like column.
    pub status: Option<String>,
    /// Declared numeric columns that are present.
    pub numeric: Vec<String>,
    pub unknown_label: String,
}

impl ResolvedSchema {
    /// The label bound to `field`, if the table has one.
    pub fn label(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn has(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }
}
