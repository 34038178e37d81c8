use chrono::NaiveDate;
use ride_insights::analyzers::analyzer::{build_digest, digest_lines, run_reports};
use ride_insights::charts::{ChartKind, ChartSpec};
use ride_insights::features::TimestampSource;
use ride_insights::output::write_cleaned_csv;
use ride_insights::pipeline::run;
use ride_insights::schema::{Field, Schema};
use std::env;
use std::fs;
use std::path::Path;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/rides_sample.csv");

#[test]
fn test_full_pipeline() {
    let (raw, prepared) =
        run(Path::new(FIXTURE), b',', &Schema::default()).expect("Failed to load fixture");

    assert_eq!(raw.rows(), 9);
    assert_eq!(prepared.report.rows_dropped, 1);
    assert_eq!(prepared.report.rows_after(), 8);

    let ds = &prepared.dataset;
    let features = ds.features().expect("hour/day derivation failed");
    assert!(matches!(features.source, TimestampSource::DateTimePair { .. }));
    assert_eq!(features.present_hours().len(), 8);

    // cleaning leaves no absent text and fills numeric gaps with zero
    let payment = ds.column(Field::PaymentMethod).unwrap();
    assert_eq!(payment.missing_count(), 0);
    assert_eq!(
        payment.labels().iter().filter(|l| *l == "Unknown").count(),
        2
    );

    let mut sink: Vec<ChartSpec> = Vec::new();
    let insights = run_reports(ds, &mut sink);
    let names: Vec<_> = sink.iter().map(|c| c.name).collect();
    assert_eq!(
        names,
        vec![
            "requests_by_hour",
            "status_distribution",
            "daily_requests",
            "rides_per_day",
            "vehicle_types",
            "status_bar",
            "correlation_heatmap"
        ]
    );
    assert_eq!(insights.len(), names.len());

    let heatmap = sink.last().unwrap();
    let ChartKind::Heatmap { labels, cells } = &heatmap.kind else {
        panic!("expected a heatmap");
    };
    assert_eq!(labels.len(), 6);
    assert_eq!(cells.len(), 6);

    let digest = build_digest(ds);
    assert_eq!(digest.rows, 8);
    assert_eq!(digest.peak_hour, Some(18));
    assert_eq!(digest.most_common_status.as_deref(), Some("Completed"));
    assert_eq!(digest.busiest_day, NaiveDate::from_ymd_opt(2024, 3, 23));
    assert_eq!(digest.most_common_pickup.as_deref(), Some("Palam Vihar"));
    assert_eq!(digest.avg_booking_value, Some(297.25));

    let lines = digest_lines(&digest);
    assert_eq!(lines[0], "- Peak request hour: 18:00 hrs");
    assert!(lines.contains(&"- Average Ride Distance: 14.36 units".to_string()));
    assert!(lines.contains(&"- Vehicle Type Distribution:".to_string()));
}

#[test]
fn test_schema_override_renames_fields() {
    let dir = env::temp_dir();
    let schema_path = dir.join("ride_insights_it_schema.json");
    fs::write(
        &schema_path,
        r#"{ "fields": { "vehicle_type": ["Cab Kind"] }, "unknown_label": "n/a" }"#,
    )
    .unwrap();
    let schema = Schema::load(schema_path.to_str().unwrap()).unwrap();
    assert_eq!(schema.unknown_label, "n/a");

    let csv_path = dir.join("ride_insights_it_renamed.csv");
    fs::write(
        &csv_path,
        " Cab Kind ,Request Timestamp\nAuto,2024-03-01 09:00:00\n,2024-03-01 10:00:00\n",
    )
    .unwrap();

    let (_, prepared) = run(&csv_path, b',', &schema).unwrap();
    let vehicles = prepared.dataset.column(Field::VehicleType).unwrap();
    assert_eq!(vehicles.name, "Cab Kind");
    assert_eq!(vehicles.labels(), vec!["Auto", "n/a"]);
    assert!(matches!(
        prepared.dataset.features().unwrap().source,
        TimestampSource::RequestColumn { .. }
    ));

    fs::remove_file(&schema_path).unwrap();
    fs::remove_file(&csv_path).unwrap();
}

#[test]
fn test_cleaned_export_keeps_surviving_rows() {
    let (_, prepared) = run(Path::new(FIXTURE), b',', &Schema::default()).unwrap();
    let ds = &prepared.dataset;

    let out = env::temp_dir().join("ride_insights_it_cleaned.csv");
    let out = out.to_str().unwrap();
    write_cleaned_csv(out, &ds.table, ds.features()).unwrap();

    let content = fs::read_to_string(out).unwrap();
    let mut lines = content.lines();
    assert!(lines.next().unwrap().ends_with("Payment Method,Request Hour,Request Day"));
    let first = lines.next().unwrap();
    assert!(first.starts_with("2024-03-23,12:29:38,"));
    assert!(first.ends_with(",Unknown,12,2024-03-23"));
    assert_eq!(content.lines().count(), 9);

    fs::remove_file(out).unwrap();
}

#[test]
fn test_missing_file_is_an_error() {
    let err = run(
        Path::new("does/not/exist.csv"),
        b',',
        &Schema::default(),
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("does/not/exist.csv"));
}
