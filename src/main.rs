//! CLI entry point for the ride-booking analysis tool.
//!
//! Run without arguments it analyzes `ncr_ride_bookings.csv`: cleans it,
//! derives request hour and day, renders one chart per report and prints the
//! insights and a closing digest.

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use ride_insights::analyzers::analyzer::{build_digest, run_reports};
use ride_insights::charts::{ChartSink, Discard, SvgCharts};
use ride_insights::features::Derivation;
use ride_insights::output::{
    print_clean_report, print_digest, print_missing, print_overview, write_cleaned_csv,
    write_digest_json,
};
use ride_insights::pipeline::run;
use ride_insights::schema::Schema;
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "ride_insights")]
#[command(about = "Exploratory analysis of a ride-booking dataset", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    analyze: AnalyzeArgs,
}

#[derive(Args)]
struct InputArgs {
    /// Delimited file to read (files ending in .gz are decompressed)
    #[arg(short, long, default_value = "ncr_ride_bookings.csv")]
    input: String,

    /// Field delimiter
    #[arg(short, long, default_value_t = ',')]
    delimiter: char,

    /// JSON file overriding the built-in schema
    #[arg(short, long)]
    schema: Option<String>,
}

#[derive(Args)]
struct AnalyzeArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Directory to write SVG charts to
    #[arg(short, long, default_value = "charts")]
    charts_dir: String,

    /// Skip chart rendering
    #[arg(long, default_value_t = false)]
    no_charts: bool,

    /// Rows shown in the dataset overview
    #[arg(long, default_value_t = 5)]
    head: usize,

    /// Optional: write the digest as JSON to this file
    #[arg(long)]
    digest_json: Option<String>,

    /// Optional: write the cleaned table (with derived columns) as CSV
    #[arg(long)]
    cleaned_output: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean, derive, chart and summarize the dataset (the default)
    Analyze(AnalyzeArgs),
    /// Clean and derive only, writing the result as CSV
    Clean {
        #[command(flatten)]
        input: InputArgs,

        /// CSV file to write the cleaned table to
        #[arg(short, long, default_value = "cleaned_rides.csv")]
        output: String,
    },
    /// Print the built-in schema as JSON
    Schema,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/ride_insights.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("ride_insights.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        None => analyze(cli.analyze)?,
        Some(Commands::Analyze(args)) => analyze(args)?,
        Some(Commands::Clean { input, output }) => {
            let schema = load_schema(input.schema.as_deref())?;
            let delimiter = delimiter_byte(input.delimiter)?;
            let (_, prepared) = run(Path::new(&input.input), delimiter, &schema)?;

            print_clean_report(&prepared.report);
            report_derivation(&prepared.dataset.derivation);

            let ds = &prepared.dataset;
            write_cleaned_csv(&output, &ds.table, ds.features())?;
        }
        Some(Commands::Schema) => {
            println!("{}", serde_json::to_string_pretty(&Schema::default())?);
        }
    }

    Ok(())
}

/// Runs the full analysis: overview, cleaning, reports and digest.
#[tracing::instrument(skip(args), fields(input = %args.input.input))]
fn analyze(args: AnalyzeArgs) -> Result<()> {
    let schema = load_schema(args.input.schema.as_deref())?;
    let delimiter = delimiter_byte(args.input.delimiter)?;

    let (raw, prepared) = run(Path::new(&args.input.input), delimiter, &schema)?;
    let ds = &prepared.dataset;

    print_overview(&raw, args.head);
    print_missing("Missing Values Before Cleaning", &raw);
    print_missing("Missing Values After Cleaning", &ds.table);
    print_clean_report(&prepared.report);
    report_derivation(&ds.derivation);

    let mut sink: Box<dyn ChartSink> = if args.no_charts {
        info!("Chart rendering disabled");
        Box::new(Discard)
    } else {
        let charts = SvgCharts::new(&args.charts_dir)?;
        info!(dir = %charts.dir().display(), "Writing charts");
        Box::new(charts)
    };
    run_reports(ds, sink.as_mut());

    let digest = build_digest(ds);
    print_digest(&digest);

    if let Some(path) = &args.digest_json {
        write_digest_json(path, &digest)?;
    }
    if let Some(path) = &args.cleaned_output {
        write_cleaned_csv(path, &ds.table, ds.features())?;
    }

    info!(rows = ds.table.rows(), "Analysis complete");
    Ok(())
}

fn load_schema(path: Option<&str>) -> Result<Schema> {
    match path {
        Some(path) => {
            info!(path, "Loading schema override");
            Schema::load(path)
        }
        None => Ok(Schema::default()),
    }
}

fn delimiter_byte(delimiter: char) -> Result<u8> {
    if !delimiter.is_ascii() {
        bail!("delimiter must be a single ASCII character, got '{delimiter}'");
    }
    Ok(delimiter as u8)
}

fn report_derivation(derivation: &Derivation) {
    if let Derivation::Failed { reason } = derivation {
        println!("Could not create 'Request Timestamp' from 'Date' and 'Time': {reason}");
    }
}
