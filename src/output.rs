//! Output formatting and persistence for dashboard reports.
//!
//! Supports pretty-printing, JSON serialization, metric-tile logging and CSV
//! append for the chart series.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::types::DashboardReport;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Logs a report using Rust's debug pretty-print format.
pub fn print_pretty(report: &DashboardReport) {
    debug!("{:#?}", report);
}

/// Logs the monthly tiles and the selected hour's ring-chart total.
pub fn log_summary(report: &DashboardReport) {
    let m = &report.monthly;
    info!(
        date = %report.selection.date,
        total_co2_t = %format!("{:.0}", m.total_co2_t),
        total_generation_mwh = %format!("{:.0}", m.total_generation_mwh),
        avg_intensity = %format!("{:.4}", m.avg_intensity),
        no_data = m.no_data,
        "Monthly summary"
    );

    let mix = &report.fuel_mix;
    info!(
        hour = %format!("{:02}:00", mix.hour),
        total_co2_t = %format!("{:.0}", mix.total_co2_t),
        fuels = mix.shares.len(),
        no_data = mix.no_data,
        "Fuel mix"
    );
    for share in &mix.shares {
        debug!(
            fuel = %share.fuel_subtype,
            co2_t = %format!("{:.0}", share.co2_t),
            percentage = %format!("{:.1}", share.percentage),
            "Fuel share"
        );
    }

    info!(
        mean = %format!("{:.3}", report.intensity.mean),
        weighted_mean = %format!("{:.3}", report.intensity.weighted_mean),
        hours = report.intensity.points.len(),
        "Monthly intensity"
    );
}

/// Serializes `value` as pretty JSON to `path`, or to stdout when `path` is `None`.
pub fn write_json(path: Option<&str>, value: &impl Serialize) -> Result<()> {
    let body = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => {
            std::fs::write(path, body)?;
            info!(path, "Report written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{body}")?;
        }
    }
    Ok(())
}

/// Appends rows to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_records<T: Serialize>(path: &str, rows: &[T]) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, rows = rows.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::analyzer::build_report;
    use crate::analyzers::types::{HourlyPoint, IntensityPoint};
    use crate::table::{EmissionsTable, HourlyRecord};
    use chrono::{NaiveDate, NaiveDateTime};
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn ts(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 1, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn report() -> DashboardReport {
        let rows = vec![
            Ok(HourlyRecord::new(ts(0), "Carbón", 100.0, 50.0)),
            Ok(HourlyRecord::new(ts(1), "Gas Natural", 40.0, 80.0)),
        ];
        let (table, _) = EmissionsTable::from_rows(rows);
        build_report(&table, ts(0).date(), None)
    }

    fn points() -> Vec<HourlyPoint> {
        vec![
            HourlyPoint { timestamp: ts(0), co2_t: 100.0 },
            HourlyPoint { timestamp: ts(1), co2_t: 40.0 },
        ]
    }

    #[test]
    fn test_print_pretty_and_summary_do_not_panic() {
        let report = report();
        print_pretty(&report);
        log_summary(&report);
    }

    #[test]
    fn test_write_json_to_file() {
        let path = temp_path("sen_emissions_test_report.json");
        let _ = fs::remove_file(&path);

        write_json(Some(&path), &report()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["schema_version"], 1);
        assert_eq!(value["monthly"]["total_co2_t"], 140.0);
        assert_eq!(value["selection"]["date"], "2022-01-01");
        assert!(value.get("ingest").is_none());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_records_writes_header_once() {
        let path = temp_path("sen_emissions_test_header.csv");
        let _ = fs::remove_file(&path);

        append_records(&path, &points()).unwrap();
        append_records(&path, &points()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.contains("timestamp")).count();
        assert_eq!(header_count, 1);
        // 1 header + 4 data rows
        assert_eq!(content.lines().count(), 5);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_records_missing_intensity_is_blank() {
        let path = temp_path("sen_emissions_test_intensity.csv");
        let _ = fs::remove_file(&path);

        let rows = vec![IntensityPoint {
            timestamp: ts(3),
            co2_t: 5.0,
            generation_mwh: 0.0,
            intensity: None,
        }];
        append_records(&path, &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "timestamp,co2_t,generation_mwh,intensity");
        assert!(lines[1].ends_with(','));

        fs::remove_file(&path).unwrap();
    }
}
