//! CLI entry point for the SEN emissions aggregator.
//!
//! Provides subcommands for building the dashboard report for a selected
//! day and hour, listing the selectable days, and exporting chart series
//! to CSV.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use sen_emissions::analyzers::aggregate::{hourly_series, intensity_series};
use sen_emissions::analyzers::analyzer::{available_days, build_report, default_date};
use sen_emissions::{
    config::IngestConfig,
    fetch::load_source,
    output::{append_records, log_summary, print_pretty, write_json},
    parser::parse_table,
    table::{EmissionsTable, IngestReport},
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "sen_emissions")]
#[command(about = "Hourly CO2 emissions metrics for the SEN thermal fleet", long_about = None)]
struct Cli {
    /// JSON ingest configuration (column names, formats)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the dashboard report for one day and hour
    Report {
        /// Path or URL of the hourly emissions CSV
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Day to analyze (YYYY-MM-DD); defaults to the first day in the data
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Hour of day for the fuel mix; defaults to the first hour of the day
        #[arg(long)]
        hour: Option<u32>,

        /// JSON file to write the report to (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// List the days in the data and the hours each covers
    Dates {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,
    },
    /// Append the day's hourly series and the month's intensity series to CSV
    Export {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Day to export (YYYY-MM-DD)
        #[arg(short, long)]
        date: NaiveDate,

        /// Directory for the CSV files
        #[arg(short, long, default_value = "exports")]
        output_dir: String,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/sen_emissions.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("sen_emissions.log"));

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
    let cfg = load_config(cli.config)?;

    match cli.command {
        Commands::Report {
            source,
            date,
            hour,
            output,
        } => {
            let (table, ingest) = load_table(&source, &cfg)?;
            if table.is_empty() {
                bail!("no valid records in '{source}'");
            }
            let date = date
                .or_else(|| default_date(&table))
                .context("no day to report")?;

            let mut report = build_report(&table, date, hour);
            report.ingest = Some(ingest);

            log_summary(&report);
            print_pretty(&report);
            write_json(output.as_deref(), &report)?;
        }
        Commands::Dates { source } => {
            let (table, _) = load_table(&source, &cfg)?;
            let days = available_days(&table);

            for day in &days {
                let first = day.hours.first().copied().unwrap_or(0);
                let last = day.hours.last().copied().unwrap_or(0);
                info!(
                    date = %day.date,
                    hours = day.hours.len(),
                    first_hour = first,
                    last_hour = last,
                    "Day"
                );
            }
            write_json(None, &days)?;
        }
        Commands::Export {
            source,
            date,
            output_dir,
        } => {
            let (table, _) = load_table(&source, &cfg)?;
            export(&table, date, &output_dir)?;
        }
    }

    Ok(())
}

/// Resolves the ingest configuration from `--config`, then `EMISSIONS_CONFIG`,
/// then the built-in defaults.
fn load_config(path: Option<String>) -> Result<IngestConfig> {
    match path.or_else(|| std::env::var("EMISSIONS_CONFIG").ok()) {
        Some(path) => {
            info!(path = %path, "Loading ingest configuration");
            IngestConfig::load(&path).with_context(|| format!("failed to load config '{path}'"))
        }
        None => Ok(IngestConfig::default()),
    }
}

#[tracing::instrument(skip(cfg))]
fn load_table(source: &str, cfg: &IngestConfig) -> Result<(EmissionsTable, IngestReport)> {
    let bytes = load_source(source)?;
    let (table, ingest) =
        parse_table(&bytes, cfg).with_context(|| format!("failed to parse '{source}'"))?;

    if ingest.rejected_count() > 0 {
        warn!(
            rejected = ingest.rejected_count(),
            reasons = ?ingest.rejected,
            "Malformed rows dropped"
        );
    }

    Ok((table, ingest))
}

/// Appends the chart series for `date` to `hourly_<date>.csv` and
/// `intensity_<year>-<month>.csv` under `output_dir`.
#[tracing::instrument(skip(table), fields(date = %date))]
fn export(table: &EmissionsTable, date: NaiveDate, output_dir: &str) -> Result<()> {
    std::fs::create_dir_all(output_dir)?;

    let hourly = hourly_series(&table.select_day(date));
    let intensity = intensity_series(&table.select_month(date));

    let hourly_path = format!("{}/hourly_{}.csv", output_dir, date.format("%Y-%m-%d"));
    let intensity_path = format!("{}/intensity_{}.csv", output_dir, date.format("%Y-%m"));

    append_records(&hourly_path, &hourly)?;
    append_records(&intensity_path, &intensity.points)?;

    info!(
        hourly_rows = hourly.len(),
        intensity_rows = intensity.points.len(),
        output_dir,
        "Export complete"
    );
    Ok(())
}
