//! Data types shared by the reports and the digest.

use crate::charts::ChartSpec;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// One labelled count, e.g. a status and how many rides had it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountEntry {
    pub label: String,
    pub count: usize,
    pub share: f64,
}

/// A histogram bucket covering `lower..upper` (the last one includes `upper`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// The printed summary paired with a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Insight {
    pub heading: String,
    pub lines: Vec<String>,
}

impl Insight {
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            lines: Vec::new(),
        }
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }
}

/// A chart and its insight.
#[derive(Debug, Clone)]
pub struct Report {
    pub chart: Option<ChartSpec>,
    pub insight: Insight,
}

/// End-of-run recap of every summary statistic, written as JSON on request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Digest {
    pub generated_at: DateTime<Utc>,
    pub rows: usize,
    pub peak_hour: Option<u32>,
    pub most_common_status: Option<String>,
    pub busiest_day: Option<NaiveDate>,
    pub most_common_pickup: Option<String>,
    pub booking_status_counts: Option<Vec<CountEntry>>,
    pub avg_ride_distance: Option<f64>,
    pub avg_booking_value: Option<f64>,
    pub vehicle_type_counts: Option<Vec<CountEntry>>,
    pub payment_method_counts: Option<Vec<CountEntry>>,
}
