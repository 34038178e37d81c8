use std::f64::consts::{FRAC_PI_2, TAU};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::{debug, info};

use super::{ChartKind, ChartSink, ChartSpec};
use crate::analyzers::types::Bin;

type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

const BAR: RGBColor = RGBColor(70, 130, 180);
const LINE: RGBColor = RGBColor(31, 119, 180);
const DURATION: RGBColor = RGBColor(255, 165, 0);

const COOL: RGBColor = RGBColor(59, 76, 192);
const NEUTRAL: RGBColor = RGBColor(221, 221, 221);
const WARM: RGBColor = RGBColor(180, 4, 38);
const UNDEFINED: RGBColor = RGBColor(190, 190, 190);

const PIE: [RGBColor; 12] = [
    RGBColor(166, 206, 227),
    RGBColor(31, 120, 180),
    RGBColor(178, 223, 138),
    RGBColor(51, 160, 44),
    RGBColor(251, 154, 153),
    RGBColor(227, 26, 28),
    RGBColor(253, 191, 111),
    RGBColor(255, 127, 0),
    RGBColor(202, 178, 214),
    RGBColor(106, 61, 154),
    RGBColor(255, 255, 153),
    RGBColor(177, 89, 40),
];

/// Writes each chart to `<dir>/<name>.svg`.
pub struct SvgCharts {
    dir: PathBuf,
    size: (u32, u32),
    written: Vec<PathBuf>,
}

impl SvgCharts {
    /// Creates the output directory if it does not exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create chart directory '{}'", dir.display()))?;
        Ok(Self {
            dir,
            size: (1000, 600),
            written: Vec::new(),
        })
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths of the charts written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ChartSink for SvgCharts {
    fn render(&mut self, chart: &ChartSpec) -> Result<()> {
        let path = self.dir.join(format!("{}.svg", chart.name));
        debug!(chart = chart.name, "Rendering chart");

        {
            let root = SVGBackend::new(&path, self.size).into_drawing_area();
            root.fill(&WHITE)?;

            match &chart.kind {
                ChartKind::Bar {
                    x_label,
                    y_label,
                    bars,
                } => draw_bar(&root, &chart.title, x_label, y_label, bars)?,
                ChartKind::Line {
                    x_label,
                    y_label,
                    points,
                } => draw_line(&root, &chart.title, x_label, y_label, points)?,
                ChartKind::Pie { slices } => draw_pie(&root, &chart.title, slices)?,
                ChartKind::Histogram { x_label, bins } => {
                    draw_histogram(&root, &chart.title, x_label, bins)?
                }
                ChartKind::Heatmap { labels, cells } => {
                    draw_heatmap(&root, &chart.title, labels, cells)?
                }
            }

            root.present()?;
        }

        info!(path = %path.display(), "Chart written");
        self.written.push(path);
        Ok(())
    }
}

fn y_ceiling(max: usize) -> u64 {
    let max = max as u64;
    max + max / 10 + 1
}

fn label_at(labels: &[(String, usize)], idx: i32) -> String {
    usize::try_from(idx)
        .ok()
        .and_then(|i| labels.get(i))
        .map(|(l, _)| l.clone())
        .unwrap_or_default()
}

fn draw_bar(
    root: &Area,
    title: &str,
    x_label: &str,
    y_label: &str,
    bars: &[(String, usize)],
) -> Result<()> {
    let last = bars.len().saturating_sub(1) as i32;
    let max = bars.iter().map(|(_, c)| *c).max().unwrap_or(0);

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d((0..last).into_segmented(), 0u64..y_ceiling(max))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(bars.len())
        .x_label_formatter(&|v: &SegmentValue<i32>| match v {
            SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => label_at(bars, *i),
            SegmentValue::Last => String::new(),
        })
        .x_desc(x_label)
        .y_desc(y_label)
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BAR.filled())
            .margin(4)
            .data(
                bars.iter()
                    .enumerate()
                    .map(|(i, (_, c))| (i as i32, *c as u64)),
            ),
    )?;

    Ok(())
}

fn draw_line(
    root: &Area,
    title: &str,
    x_label: &str,
    y_label: &str,
    points: &[(String, usize)],
) -> Result<()> {
    let last = (points.len().saturating_sub(1) as i32).max(1);
    let max = points.iter().map(|(_, c)| *c).max().unwrap_or(0);
    let series: Vec<(i32, u64)> = points
        .iter()
        .enumerate()
        .map(|(i, (_, c))| (i as i32, *c as u64))
        .collect();

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(0..last, 0u64..y_ceiling(max))?;

    chart
        .configure_mesh()
        .x_labels(points.len().clamp(2, 12))
        .x_label_formatter(&|i: &i32| label_at(points, *i))
        .x_desc(x_label)
        .y_desc(y_label)
        .draw()?;

    chart.draw_series(LineSeries::new(series.iter().copied(), &LINE))?;
    chart.draw_series(
        series
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 3, LINE.filled())),
    )?;

    Ok(())
}

fn draw_pie(root: &Area, title: &str, slices: &[(String, usize)]) -> Result<()> {
    let (w, h) = root.dim_in_pixel();
    root.draw(&Text::new(
        title.to_string(),
        (20, 15),
        ("sans-serif", 24).into_font(),
    ))?;

    let total: usize = slices.iter().map(|(_, n)| n).sum();
    if total == 0 {
        return Ok(());
    }

    let center = (w as i32 / 2, h as i32 / 2 + 15);
    let radius = f64::from(w.min(h)) * 0.33;
    let at = |angle: f64, r: f64| {
        (
            center.0 + (r * angle.cos()).round() as i32,
            center.1 + (r * angle.sin()).round() as i32,
        )
    };

    // start at twelve o'clock
    let mut start = -FRAC_PI_2;
    for (i, (label, count)) in slices.iter().enumerate() {
        let share = *count as f64 / total as f64;
        let sweep = share * TAU;
        let steps = ((share * 180.0).ceil() as usize).max(2);

        let mut outline = vec![center];
        outline.extend((0..=steps).map(|s| at(start + sweep * s as f64 / steps as f64, radius)));
        root.draw(&Polygon::new(outline, PIE[i % PIE.len()].filled()))?;

        let (x, y) = at(start + sweep / 2.0, radius * 1.12);
        root.draw(&Text::new(
            format!("{label} {:.1}%", share * 100.0),
            (x - 30, y - 6),
            ("sans-serif", 14).into_font(),
        ))?;

        start += sweep;
    }

    Ok(())
}

fn draw_histogram(root: &Area, title: &str, x_label: &str, bins: &[Bin]) -> Result<()> {
    let lower = bins.first().map(|b| b.lower).unwrap_or(0.0);
    let mut upper = bins.last().map(|b| b.upper).unwrap_or(1.0);
    if upper <= lower {
        upper = lower + 1.0;
    }
    let max = bins.iter().map(|b| b.count).max().unwrap_or(0);

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(lower..upper, 0u64..y_ceiling(max))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(x_label)
        .y_desc("Count")
        .draw()?;

    chart.draw_series(bins.iter().map(|b| {
        Rectangle::new(
            [(b.lower, 0u64), (b.upper, b.count as u64)],
            DURATION.filled(),
        )
    }))?;

    Ok(())
}

fn draw_heatmap(
    root: &Area,
    title: &str,
    labels: &[String],
    cells: &[Vec<Option<f64>>],
) -> Result<()> {
    let n = labels.len() as i32;

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(130)
        .build_cartesian_2d(0..n, 0..n)?;

    let name = |idx: usize| labels.get(idx).cloned().unwrap_or_default();
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(labels.len() + 1)
        .y_labels(labels.len() + 1)
        .x_label_formatter(&|i: &i32| usize::try_from(*i).map(name).unwrap_or_default())
        .y_label_formatter(&|i: &i32| {
            usize::try_from(n - 1 - *i)
                .map(name)
                .unwrap_or_default()
        })
        .draw()?;

    // row 0 is drawn at the top
    chart.draw_series(cells.iter().enumerate().flat_map(|(i, row)| {
        let y = n - 1 - i as i32;
        row.iter().enumerate().map(move |(j, r)| {
            Rectangle::new([(j as i32, y), (j as i32 + 1, y + 1)], heat_color(*r).filled())
        })
    }))?;

    chart.draw_series(cells.iter().enumerate().flat_map(|(i, row)| {
        let y = n - 1 - i as i32;
        row.iter().enumerate().map(move |(j, r)| {
            let text = r.map(|r| format!("{r:.2}")).unwrap_or_else(|| "n/a".to_string());
            Text::new(text, (j as i32, y + 1), ("sans-serif", 14).into_font())
        })
    }))?;

    Ok(())
}

/// Diverging blue-grey-red scale over [-1, 1].
fn heat_color(r: Option<f64>) -> RGBColor {
    let Some(r) = r else {
        return UNDEFINED;
    };
    let r = r.clamp(-1.0, 1.0);
    let (from, to, t) = if r < 0.0 {
        (COOL, NEUTRAL, r + 1.0)
    } else {
        (NEUTRAL, WARM, r)
    };
    let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_dir(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    fn counts(pairs: &[(&str, usize)]) -> Vec<(String, usize)> {
        pairs.iter().map(|(l, n)| (l.to_string(), *n)).collect()
    }

    #[test]
    fn test_heat_color_endpoints() {
        assert_eq!(heat_color(Some(-1.0)), COOL);
        assert_eq!(heat_color(Some(0.0)), NEUTRAL);
        assert_eq!(heat_color(Some(1.0)), WARM);
        assert_eq!(heat_color(None), UNDEFINED);
    }

    #[test]
    fn test_render_every_kind_writes_svg() {
        let dir = temp_dir("ride_insights_svg_test");
        let _ = fs::remove_dir_all(&dir);
        let mut sink = SvgCharts::new(&dir).unwrap().with_size(640, 480);

        let charts = vec![
            ChartSpec {
                name: "bar",
                title: "Bars".into(),
                kind: ChartKind::Bar {
                    x_label: "Status".into(),
                    y_label: "Count".into(),
                    bars: counts(&[("Completed", 5), ("Cancelled", 2)]),
                },
            },
            ChartSpec {
                name: "line",
                title: "Line".into(),
                kind: ChartKind::Line {
                    x_label: "Date".into(),
                    y_label: "Rides".into(),
                    points: counts(&[("2024-03-01", 3), ("2024-03-02", 1), ("2024-03-03", 4)]),
                },
            },
            ChartSpec {
                name: "pie",
                title: "Pie".into(),
                kind: ChartKind::Pie {
                    slices: counts(&[("Auto", 3), ("Bike", 1)]),
                },
            },
            ChartSpec {
                name: "histogram",
                title: "Histogram".into(),
                kind: ChartKind::Histogram {
                    x_label: "Minutes".into(),
                    bins: vec![
                        Bin {
                            lower: 0.0,
                            upper: 5.0,
                            count: 2,
                        },
                        Bin {
                            lower: 5.0,
                            upper: 10.0,
                            count: 1,
                        },
                    ],
                },
            },
            ChartSpec {
                name: "heatmap",
                title: "Heatmap".into(),
                kind: ChartKind::Heatmap {
                    labels: vec!["a".into(), "b".into()],
                    cells: vec![vec![Some(1.0), Some(-0.5)], vec![Some(-0.5), None]],
                },
            },
        ];

        for chart in &charts {
            sink.render(chart).unwrap();
        }

        assert_eq!(sink.written().len(), charts.len());
        for path in sink.written() {
            let content = fs::read_to_string(path).unwrap();
            assert!(content.contains("<svg"), "{} is not an svg", path.display());
        }

        fs::remove_dir_all(&dir).unwrap();
    }
}
