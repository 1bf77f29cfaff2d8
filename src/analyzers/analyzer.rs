use crate::analyzers::aggregate::{
    fuel_mix, fuel_trend, hourly_series, intensity_series, monthly_summary, pivot_fuel_trend,
};
use crate::analyzers::types::{AvailableDay, DashboardReport, Selection};
use crate::table::EmissionsTable;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

pub const SCHEMA_VERSION: u8 = 1;

/// Relative gap between the unweighted and weighted monthly intensity above
/// which a warning is logged.
const MEAN_GAP_WARN_RATIO: f64 = 0.05;

/// First day in the data, the dashboard's initial selection.
pub fn default_date(table: &EmissionsTable) -> Option<NaiveDate> {
    table.dates().into_iter().next()
}

/// Earliest hour present on `date`, or midnight when the day is empty.
pub fn default_hour(table: &EmissionsTable, date: NaiveDate) -> u32 {
    table.hours_on(date).into_iter().next().unwrap_or(0)
}

/// Lists every selectable day with the hours it covers.
pub fn available_days(table: &EmissionsTable) -> Vec<AvailableDay> {
    table
        .dates()
        .into_iter()
        .map(|date| AvailableDay {
            date,
            hours: table.hours_on(date),
        })
        .collect()
}

/// Computes every dashboard aggregate for one (date, hour) selection.
#[tracing::instrument(skip(table), fields(records = table.len()))]
pub fn build_report(table: &EmissionsTable, date: NaiveDate, hour: Option<u32>) -> DashboardReport {
    let hour = hour.unwrap_or_else(|| default_hour(table, date));

    let day = table.select_day(date);
    let month = table.select_month(date);
    debug!(day_records = day.len(), month_records = month.len(), "Selections built");

    if day.is_empty() {
        warn!(%date, "No records for the selected day");
    }

    let monthly = monthly_summary(&month);
    let intensity = intensity_series(&month);

    let gap = intensity.mean_gap();
    if gap > MEAN_GAP_WARN_RATIO {
        warn!(
            mean = intensity.mean,
            weighted_mean = intensity.weighted_mean,
            gap,
            "Hourly-average intensity differs from the monthly weighted intensity"
        );
    }
    if intensity.hours_without_generation > 0 {
        info!(
            hours = intensity.hours_without_generation,
            "Hours without generation left out of the intensity mean"
        );
    }

    DashboardReport {
        schema_version: SCHEMA_VERSION,
        selection: Selection { date, hour },
        ingest: None,
        monthly,
        hourly: hourly_series(&day),
        fuel_mix: fuel_mix(&day, hour),
        fuel_trend: pivot_fuel_trend(&fuel_trend(&day)),
        intensity,
    }
}
