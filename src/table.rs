//! The immutable in-memory table of hourly records and its selections.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::error::RowError;

/// One row of the hourly emissions export.
///
/// A missing measurement is `None`, never zero, and is skipped by the sums it
/// would feed. A row without a subtype still counts toward totals and the
/// hourly series but belongs to no fuel group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyRecord {
    pub timestamp: NaiveDateTime,
    pub fuel_subtype: Option<String>,
    pub co2_t: Option<f64>,
    pub generation_mwh: Option<f64>,
}

impl HourlyRecord {
    pub fn new(timestamp: NaiveDateTime, fuel_subtype: &str, co2_t: f64, generation_mwh: f64) -> Self {
        Self {
            timestamp,
            fuel_subtype: Some(fuel_subtype.to_string()),
            co2_t: Some(co2_t),
            generation_mwh: Some(generation_mwh),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }

    pub fn subtype(&self) -> Option<&str> {
        self.fuel_subtype.as_deref()
    }

    fn is_partial(&self) -> bool {
        self.co2_t.is_none() || self.generation_mwh.is_none()
    }
}

/// Outcome of validating raw rows into an [`EmissionsTable`].
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub total_rows: usize,
    pub accepted: usize,
    /// Accepted rows with at least one of the two measurements missing.
    pub partial: usize,
    /// Accepted rows with a blank fuel subtype.
    pub unlabeled: usize,
    /// Rejected rows keyed by [`RowError::kind`].
    pub rejected: BTreeMap<String, usize>,
}

impl IngestReport {
    pub fn rejected_count(&self) -> usize {
        self.rejected.values().sum()
    }
}

/// Read-only table built once at start-up and borrowed by every aggregation.
#[derive(Debug, Default, Clone)]
pub struct EmissionsTable {
    records: Vec<HourlyRecord>,
}

impl EmissionsTable {
    /// Keeps the rows that validated and counts the ones that did not.
    pub fn from_rows<I>(rows: I) -> (Self, IngestReport)
    where
        I: IntoIterator<Item = Result<HourlyRecord, RowError>>,
    {
        let mut report = IngestReport::default();
        let mut records = Vec::new();

        for row in rows {
            report.total_rows += 1;
            match row {
                Ok(record) => {
                    if record.is_partial() {
                        report.partial += 1;
                    }
                    if record.fuel_subtype.is_none() {
                        report.unlabeled += 1;
                    }
                    records.push(record);
                }
                Err(e) => {
                    debug!(row = report.total_rows, error = %e, "Dropping malformed row");
                    *report.rejected.entry(e.kind().to_string()).or_default() += 1;
                }
            }
        }
        report.accepted = records.len();

        info!(
            total = report.total_rows,
            accepted = report.accepted,
            partial = report.partial,
            unlabeled = report.unlabeled,
            rejected = report.rejected_count(),
            "Emissions table loaded"
        );

        (Self { records }, report)
    }

    pub fn records(&self) -> &[HourlyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records whose calendar date equals `date`, in table order.
    pub fn select_day(&self, date: NaiveDate) -> Vec<&HourlyRecord> {
        self.records.iter().filter(|r| r.date() == date).collect()
    }

    /// Records in the same year and month as `date`, in table order.
    pub fn select_month(&self, date: NaiveDate) -> Vec<&HourlyRecord> {
        self.records
            .iter()
            .filter(|r| r.timestamp.year() == date.year() && r.timestamp.month() == date.month())
            .collect()
    }

    /// Distinct days present, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let days: BTreeSet<NaiveDate> = self.records.iter().map(HourlyRecord::date).collect();
        days.into_iter().collect()
    }

    /// Distinct hours of day present on `date`, ascending.
    pub fn hours_on(&self, date: NaiveDate) -> Vec<u32> {
        let hours: BTreeSet<u32> = self
            .records
            .iter()
            .filter(|r| r.date() == date)
            .map(HourlyRecord::hour)
            .collect();
        hours.into_iter().collect()
    }
}
