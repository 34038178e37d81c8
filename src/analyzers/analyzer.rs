use crate::analyzers::aggregate::{
    busiest_in_series, correlation_matrix, count_entries, daily_counts, histogram, hourly_counts,
    mode, value_counts,
};
use crate::analyzers::grade::grade;
use crate::analyzers::types::{CountEntry, Digest, Insight, Report};
use crate::analyzers::utility::{mean, stddev};
use crate::charts::{ChartKind, ChartSink, ChartSpec};
use crate::output::print_insight;
use crate::pipeline::Dataset;
use crate::schema::Field;
use crate::table::ColumnKind;
use chrono::{NaiveDate, Utc};
use tracing::{debug, error};

const DURATION_BINS: usize = 30;

/// Most frequent request hour.
pub fn peak_hour(ds: &Dataset) -> Option<u32> {
    mode(ds.features()?.present_hours())
}

/// Most frequent value of the status column.
pub fn most_common_status(ds: &Dataset) -> Option<String> {
    mode(ds.status_column()?.labels())
}

/// Most frequent request day; ties go to the day seen first.
pub fn busiest_day(ds: &Dataset) -> Option<NaiveDate> {
    mode(ds.features()?.present_days())
}

/// Value counts of a categorical field, `None` when the column is absent.
pub fn field_counts(ds: &Dataset, field: Field) -> Option<Vec<(String, usize)>> {
    Some(value_counts(ds.column(field)?.labels()))
}

pub fn most_common(ds: &Dataset, field: Field) -> Option<String> {
    mode(ds.column(field)?.labels())
}

/// Mean of a numeric field; `None` when absent, not numeric or empty.
pub fn field_mean(ds: &Dataset, field: Field) -> Option<f64> {
    let values = ds.column(field)?.numbers()?;
    if values.is_empty() {
        return None;
    }
    Some(mean(&values))
}

fn count_lines(counts: &[(String, usize)]) -> impl Iterator<Item = String> + '_ {
    counts.iter().map(|(label, n)| format!("  {label:<30} {n}"))
}

pub fn hourly_requests(ds: &Dataset) -> Option<Report> {
    let hours = ds.features()?.present_hours();
    let peak = mode(hours.iter().copied())?;

    let bars = hourly_counts(&hours)
        .iter()
        .enumerate()
        .map(|(h, n)| (h.to_string(), *n))
        .collect();

    Some(Report {
        chart: Some(ChartSpec {
            name: "requests_by_hour",
            title: "Ride Requests by Hour of Day".into(),
            kind: ChartKind::Bar {
                x_label: "Hour".into(),
                y_label: "Number of Requests".into(),
                bars,
            },
        }),
        insight: Insight::new("Key Insights - Ride Requests by Hour")
            .line(format!("- Peak request hour: {peak}:00 hrs")),
    })
}

pub fn status_distribution(ds: &Dataset) -> Option<Report> {
    let column = ds.status_column()?;
    let counts = value_counts(column.labels());
    let (top, _) = counts.first()?.clone();

    let mut insight = Insight::new("Key Insights - Ride Status Distribution")
        .line(format!("- Most common ride status: {top}"));
    if let Some(booking) = field_counts(ds, Field::BookingStatus) {
        insight = insight.line("- Ride Status Distribution:");
        for line in count_lines(&booking) {
            insight = insight.line(line);
        }
    }

    Some(Report {
        chart: Some(ChartSpec {
            name: "status_distribution",
            title: "Ride Status Distribution".into(),
            kind: ChartKind::Bar {
                x_label: "Status".into(),
                y_label: "Count".into(),
                bars: counts,
            },
        }),
        insight,
    })
}

/// Daily volume. Present whenever hour/day derivation succeeded; without any
/// usable day only the insight is produced.
pub fn daily_requests(ds: &Dataset) -> Option<Report> {
    let days = ds.features()?.present_days();
    let heading = "Key Insights - Daily Ride Requests";

    let Some(busiest) = mode(days.iter().copied()) else {
        return Some(Report {
            chart: None,
            insight: Insight::new(heading).line(
                "- Could not determine busiest day as 'Request Day' column is empty after cleaning.",
            ),
        });
    };

    let points = daily_counts(&days)
        .into_iter()
        .map(|(d, n)| (d.to_string(), n))
        .collect();

    Some(Report {
        chart: Some(ChartSpec {
            name: "daily_requests",
            title: "Daily Ride Requests".into(),
            kind: ChartKind::Line {
                x_label: "Date".into(),
                y_label: "Number of Requests".into(),
                points,
            },
        }),
        insight: Insight::new(heading).line(format!("- Busiest day for bookings: {busiest}")),
    })
}

pub fn rides_per_day(ds: &Dataset) -> Option<Report> {
    let daily = daily_counts(&ds.features()?.present_days());
    let busiest = busiest_in_series(&daily)?;

    Some(Report {
        chart: Some(ChartSpec {
            name: "rides_per_day",
            title: "Rides Per Day".into(),
            kind: ChartKind::Line {
                x_label: "Date".into(),
                y_label: "Number of Rides".into(),
                points: daily.into_iter().map(|(d, n)| (d.to_string(), n)).collect(),
            },
        }),
        insight: Insight::new("Key Insights - Rides Per Day")
            .line(format!("- Overall busiest day for bookings: {busiest}")),
    })
}

pub fn vehicle_mix(ds: &Dataset) -> Option<Report> {
    let counts = field_counts(ds, Field::VehicleType)?;
    let top = count_entries(&counts).into_iter().next()?;

    Some(Report {
        chart: Some(ChartSpec {
            name: "vehicle_types",
            title: "Distribution of Vehicle Types".into(),
            kind: ChartKind::Pie { slices: counts },
        }),
        insight: Insight::new("Key Insights - Vehicle Types").line(format!(
            "- Most common vehicle type: {} ({:.1}% of rides)",
            top.label,
            top.share * 100.0
        )),
    })
}

pub fn status_bar(ds: &Dataset) -> Option<Report> {
    let counts = value_counts(ds.status_column()?.labels());
    let (top, _) = counts.first()?.clone();

    Some(Report {
        chart: Some(ChartSpec {
            name: "status_bar",
            title: "Ride Status Distribution".into(),
            kind: ChartKind::Bar {
                x_label: "Status".into(),
                y_label: "Count".into(),
                bars: counts,
            },
        }),
        insight: Insight::new("Key Insights - Ride Status Distribution (Bar Plot)")
            .line(format!("- Most common ride status: {top}")),
    })
}

pub fn trip_duration(ds: &Dataset) -> Option<Report> {
    let minutes = ds.column(Field::TripDuration)?.numbers()?;
    if minutes.is_empty() {
        return None;
    }
    let avg = mean(&minutes);
    let sd = stddev(&minutes, avg);

    Some(Report {
        chart: Some(ChartSpec {
            name: "trip_duration",
            title: "Trip Duration (Minutes)".into(),
            kind: ChartKind::Histogram {
                x_label: "Minutes".into(),
                bins: histogram(&minutes, DURATION_BINS),
            },
        }),
        insight: Insight::new("Key Insights - Trip Duration Distribution")
            .line(format!("- Average Trip Duration: {avg:.2} minutes"))
            .line(format!("- Standard deviation: {sd:.2} minutes")),
    })
}

/// Pearson correlations across the declared numeric columns present.
pub fn correlation(ds: &Dataset) -> Option<Report> {
    if ds.table.is_empty() {
        return None;
    }

    let (labels, series): (Vec<String>, Vec<Vec<f64>>) = ds
        .schema
        .numeric
        .iter()
        .filter_map(|name| ds.table.column(name))
        .filter(|c| c.kind() == ColumnKind::Numeric)
        .filter_map(|c| Some((c.name.clone(), c.numbers()?)))
        .unzip();
    if labels.len() < 2 {
        return None;
    }

    let cells = correlation_matrix(&series);

    let mut strongest: Option<(usize, usize, f64)> = None;
    for i in 0..labels.len() {
        for j in (i + 1)..labels.len() {
            if let Some(r) = cells[i][j] {
                if strongest.is_none_or(|(_, _, best)| r.abs() > best.abs()) {
                    strongest = Some((i, j, r));
                }
            }
        }
    }

    let line = match strongest {
        Some((i, j, r)) => format!(
            "- Strongest correlation: {} vs {} (r = {r:.2}, {})",
            labels[i],
            labels[j],
            grade(r)
        ),
        None => "- No pair of columns has a defined correlation".to_string(),
    };

    Some(Report {
        chart: Some(ChartSpec {
            name: "correlation_heatmap",
            title: "Correlation Heatmap".into(),
            kind: ChartKind::Heatmap { labels, cells },
        }),
        insight: Insight::new("Key Insights - Correlation Heatmap").line(line),
    })
}

/// Every report in presentation order. Absent inputs skip their report.
pub fn reports(ds: &Dataset) -> Vec<Report> {
    let builders: [fn(&Dataset) -> Option<Report>; 8] = [
        hourly_requests,
        status_distribution,
        daily_requests,
        rides_per_day,
        vehicle_mix,
        status_bar,
        trip_duration,
        correlation,
    ];

    builders.iter().filter_map(|build| build(ds)).collect()
}

/// Renders and prints every report. A chart that fails to render is logged
/// and its insight still printed.
pub fn run_reports<S: ChartSink + ?Sized>(ds: &Dataset, sink: &mut S) -> Vec<Insight> {
    let mut insights = Vec::new();

    for report in reports(ds) {
        if let Some(chart) = &report.chart {
            if let Err(e) = sink.render(chart) {
                error!(chart = chart.name, error = %e, "Failed to render chart");
            }
        }
        debug!(heading = %report.insight.heading, "Report ready");
        print_insight(&report.insight);
        insights.push(report.insight);
    }

    insights
}

/// Collects the end-of-run statistics.
pub fn build_digest(ds: &Dataset) -> Digest {
    let entries = |field| field_counts(ds, field).map(|c| count_entries(&c));

    Digest {
        generated_at: Utc::now(),
        rows: ds.table.rows(),
        peak_hour: peak_hour(ds),
        most_common_status: most_common_status(ds),
        busiest_day: busiest_day(ds),
        most_common_pickup: most_common(ds, Field::PickupLocation),
        booking_status_counts: entries(Field::BookingStatus),
        avg_ride_distance: field_mean(ds, Field::RideDistance),
        avg_booking_value: field_mean(ds, Field::BookingValue),
        vehicle_type_counts: entries(Field::VehicleType),
        payment_method_counts: entries(Field::PaymentMethod),
    }
}

fn push_counts(lines: &mut Vec<String>, title: &str, entries: Option<&[CountEntry]>) {
    if let Some(entries) = entries {
        lines.push(format!("- {title}:"));
        lines.extend(entries.iter().map(|e| format!("  {:<30} {}", e.label, e.count)));
    }
}

/// Digest lines in print order.
pub fn digest_lines(digest: &Digest) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(h) = digest.peak_hour {
        lines.push(format!("- Peak request hour: {h}:00 hrs"));
    }
    if let Some(s) = &digest.most_common_status {
        lines.push(format!("- Most common ride status: {s}"));
    }
    if let Some(d) = digest.busiest_day {
        lines.push(format!("- Busiest day for bookings: {d}"));
    }
    if let Some(p) = &digest.most_common_pickup {
        lines.push(format!("- Most common pickup location: {p}"));
    }
    push_counts(
        &mut lines,
        "Ride Status Distribution",
        digest.booking_status_counts.as_deref(),
    );
    if let Some(d) = digest.avg_ride_distance {
        lines.push(format!("- Average Ride Distance: {d:.2} units"));
    }
    if let Some(v) = digest.avg_booking_value {
        lines.push(format!("- Average Booking Value: {v:.2}"));
    }
    push_counts(
        &mut lines,
        "Vehicle Type Distribution",
        digest.vehicle_type_counts.as_deref(),
    );
    push_counts(
        &mut lines,
        "Payment Method Distribution",
        digest.payment_method_counts.as_deref(),
    );

    lines
}
