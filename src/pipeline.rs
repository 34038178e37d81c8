//! Threads the dataset through load, clean and derive.

use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use crate::cleaner::{CleanReport, clean};
use crate::features::{Derivation, Features, derive_features};
use crate::loader::load_table;
use crate::schema::{Field, ResolvedSchema, Schema};
use crate::table::{Column, Table};

/// The cleaned table with its bound schema and derived fields.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub table: Table,
    pub schema: ResolvedSchema,
    pub derivation: Derivation,
}

impl Dataset {
    pub fn features(&self) -> Option<&Features> {
        self.derivation.features()
    }

    /// The column bound to `field`, if present.
    pub fn column(&self, field: Field) -> Option<&Column> {
        self.schema.label(field).and_then(|l| self.table.column(l))
    }

    /// The first column whose label mentions the status marker.
    pub fn status_column(&self) -> Option<&Column> {
        self.schema.status.as_deref().and_then(|l| self.table.column(l))
    }
}

/// Result of [`prepare`].
#[derive(Debug, Clone)]
pub struct Prepared {
    pub dataset: Dataset,
    pub report: CleanReport,
}

/// Cleans a loaded table and derives the time features.
pub fn prepare(raw: Table, schema: &Schema) -> Prepared {
    let cleaned = clean(raw, schema);
    let derivation = derive_features(&cleaned.table, &cleaned.schema);

    if let Derivation::Failed { reason } = &derivation {
        warn!(%reason, "Hour/day derivation failed, dependent reports will be skipped");
    }

    Prepared {
        dataset: Dataset {
            table: cleaned.table,
            schema: cleaned.schema,
            derivation,
        },
        report: cleaned.report,
    }
}

/// Loads `path` and prepares it.
///
/// # Errors
///
/// Fails only if the file cannot be loaded.
pub fn run(path: &Path, delimiter: u8, schema: &Schema) -> Result<(Table, Prepared)> {
    let raw = load_table(path, delimiter)?;
    let snapshot = raw.clone();
    let prepared = prepare(raw, schema);
    info!(
        rows = prepared.dataset.table.rows(),
        derived = prepared.dataset.features().is_some(),
        "Dataset prepared"
    );
    Ok((snapshot, prepared))
}
