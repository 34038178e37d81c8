//! In-memory column store for the ride-booking dataset.

use std::borrow::Cow;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// A parsed date/time cell. The flexible parser keeps whichever parts the
/// source value actually carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Temporal {
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
}

impl Temporal {
    /// Hour of day. Date-only values count as midnight.
    pub fn hour(&self) -> u32 {
        use chrono::Timelike;
        match self {
            Temporal::DateTime(dt) => dt.hour(),
            Temporal::Date(_) => 0,
            Temporal::Time(t) => t.hour(),
        }
    }

    /// Calendar day, if the value carried one.
    pub fn day(&self) -> Option<NaiveDate> {
        match self {
            Temporal::DateTime(dt) => Some(dt.date()),
            Temporal::Date(d) => Some(*d),
            Temporal::Time(_) => None,
        }
    }

    /// Canonical string form, used when combining separate date and time cells.
    pub fn render(&self) -> String {
        match self {
            Temporal::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Temporal::Date(d) => d.format("%Y-%m-%d").to_string(),
            Temporal::Time(t) => t.format("%H:%M:%S").to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Text,
    Temporal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Temporal(Vec<Option<Temporal>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
            ColumnData::Temporal(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Numeric(_) => ColumnKind::Numeric,
            ColumnData::Text(_) => ColumnKind::Text,
            ColumnData::Temporal(_) => ColumnKind::Temporal,
        }
    }

    fn is_missing(&self, row: usize) -> bool {
        match self {
            ColumnData::Numeric(v) => v[row].is_none(),
            ColumnData::Text(v) => v[row].is_none(),
            ColumnData::Temporal(v) => v[row].is_none(),
        }
    }

    fn retain(&mut self, keep: &[bool]) {
        fn retain_vec<T>(values: &mut Vec<T>, keep: &[bool]) {
            let mut idx = 0;
            values.retain(|_| {
                let k = keep[idx];
                idx += 1;
                k
            });
        }

        match self {
            ColumnData::Numeric(v) => retain_vec(v, keep),
            ColumnData::Text(v) => retain_vec(v, keep),
            ColumnData::Temporal(v) => retain_vec(v, keep),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn kind(&self) -> ColumnKind {
        self.data.kind()
    }

    pub fn is_missing(&self, row: usize) -> bool {
        self.data.is_missing(row)
    }

    pub fn missing_count(&self) -> usize {
        (0..self.data.len()).filter(|&r| self.is_missing(r)).count()
    }

    /// String form of a cell, `None` when the cell is absent.
    pub fn display(&self, row: usize) -> Option<Cow<'_, str>> {
        match &self.data {
            ColumnData::Numeric(v) => v[row].map(|n| Cow::Owned(format_number(n))),
            ColumnData::Text(v) => v[row].as_deref().map(Cow::Borrowed),
            ColumnData::Temporal(v) => v[row].map(|t| Cow::Owned(t.render())),
        }
    }

    /// String forms of all present cells, in row order.
    pub fn labels(&self) -> Vec<String> {
        (0..self.data.len())
            .filter_map(|r| self.display(r).map(Cow::into_owned))
            .collect()
    }

    /// Present values of a numeric column; `None` for other kinds.
    pub fn numbers(&self) -> Option<Vec<f64>> {
        match &self.data {
            ColumnData::Numeric(v) => Some(v.iter().flatten().copied().collect()),
            _ => None,
        }
    }
}

/// Formats a float the way it reads in the source file: integral values
/// without a trailing `.0`.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// An ordered set of equally long columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Builds a table, rejecting columns whose lengths disagree.
    pub fn new(columns: Vec<Column>) -> anyhow::Result<Self> {
        let rows = columns.first().map(|c| c.data.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.data.len() != rows) {
            anyhow::bail!(
                "column '{}' has {} values, expected {}",
                bad.name,
                bad.data.len(),
                rows
            );
        }
        Ok(Self { columns, rows })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Keeps only the rows whose flag is `true`.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        debug_assert_eq!(keep.len(), self.rows);
        for column in &mut self.columns {
            column.data.retain(keep);
        }
        self.rows = keep.iter().filter(|k| **k).count();
    }

    /// Missing-cell count per column, in column order.
    pub fn missing_counts(&self) -> Vec<(String, usize)> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.missing_count()))
            .collect()
    }
}
