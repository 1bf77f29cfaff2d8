//! Data types produced by the aggregation layer.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::table::IngestReport;

/// Monthly metric tiles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    pub total_co2_t: f64,
    pub total_generation_mwh: f64,
    /// Total CO2 over total generation, 0 when there was no generation.
    pub avg_intensity: f64,
    pub records: usize,
    pub no_data: bool,
}

/// Total emissions for one timestamp of the selected day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyPoint {
    pub timestamp: NaiveDateTime,
    pub co2_t: f64,
}

/// One slice of the fuel ring chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuelShare {
    pub fuel_subtype: String,
    pub co2_t: f64,
    pub percentage: f64,
}

/// Emissions split by fuel for one hour of the selected day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuelMix {
    pub hour: u32,
    /// Shown in the centre of the ring.
    pub total_co2_t: f64,
    pub shares: Vec<FuelShare>,
    pub no_data: bool,
}

impl FuelMix {
    pub fn empty(hour: u32) -> Self {
        Self {
            hour,
            total_co2_t: 0.0,
            shares: Vec::new(),
            no_data: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuelTrendPoint {
    pub hour: u32,
    pub fuel_subtype: String,
    pub co2_t: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourValue {
    pub hour: u32,
    pub co2_t: f64,
}

/// One plotted line of the per-fuel trend chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuelSeries {
    pub fuel_subtype: String,
    pub points: Vec<HourValue>,
}

/// Carbon intensity for one timestamp of the selected month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntensityPoint {
    pub timestamp: NaiveDateTime,
    pub co2_t: f64,
    pub generation_mwh: f64,
    /// `None` when the hour had no generation.
    pub intensity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntensitySeries {
    pub points: Vec<IntensityPoint>,
    /// Arithmetic mean of the hourly ratios.
    pub mean: f64,
    /// Monthly CO2 over monthly generation.
    pub weighted_mean: f64,
    pub hours_without_generation: usize,
    pub no_data: bool,
}

impl IntensitySeries {
    /// Relative gap between the unweighted and weighted means.
    pub fn mean_gap(&self) -> f64 {
        if self.weighted_mean == 0.0 {
            0.0
        } else {
            (self.mean - self.weighted_mean).abs() / self.weighted_mean
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub date: NaiveDate,
    pub hour: u32,
}

/// Everything the dashboard shows for one (date, hour) selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub schema_version: u8,
    pub selection: Selection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingest: Option<IngestReport>,
    pub monthly: MonthlySummary,
    pub hourly: Vec<HourlyPoint>,
    pub fuel_mix: FuelMix,
    pub fuel_trend: Vec<FuelSeries>,
    pub intensity: IntensitySeries,
}

/// Days available for selection and the hours present on each.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailableDay {
    pub date: NaiveDate,
    pub hours: Vec<u32>,
}
