//! Chart descriptions and the sinks that render them.
//!
//! Reports build a [`ChartSpec`] from plain data; a [`ChartSink`] decides
//! what to do with it. [`SvgCharts`] writes one SVG file per chart,
//! [`Discard`] drops them.

mod svg;

pub use svg::SvgCharts;

use anyhow::Result;

use crate::analyzers::types::Bin;

#[derive(Debug, Clone, PartialEq)]
pub enum ChartKind {
    Bar {
        x_label: String,
        y_label: String,
        bars: Vec<(String, usize)>,
    },
    Line {
        x_label: String,
        y_label: String,
        points: Vec<(String, usize)>,
    },
    Pie {
        slices: Vec<(String, usize)>,
    },
    Histogram {
        x_label: String,
        bins: Vec<Bin>,
    },
    Heatmap {
        labels: Vec<String>,
        cells: Vec<Vec<Option<f64>>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    /// File stem, unique per report.
    pub name: &'static str,
    pub title: String,
    pub kind: ChartKind,
}

/// Receives each chart as the reports produce it.
pub trait ChartSink {
    fn render(&mut self, chart: &ChartSpec) -> Result<()>;
}

/// Renders nothing.
pub struct Discard;

impl ChartSink for Discard {
    fn render(&mut self, _chart: &ChartSpec) -> Result<()> {
        Ok(())
    }
}

/// Collects charts in memory.
impl ChartSink for Vec<ChartSpec> {
    fn render(&mut self, chart: &ChartSpec) -> Result<()> {
        self.push(chart.clone());
        Ok(())
    }
}
