use crate::analyzers::types::{
    FuelMix, FuelSeries, FuelShare, FuelTrendPoint, HourValue, HourlyPoint, IntensityPoint,
    IntensitySeries, MonthlySummary,
};
use crate::analyzers::utility::{mean, pct, ratio_or_zero};
use crate::table::HourlyRecord;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use tracing::warn;

const HOURS_PER_DAY: u32 = 24;

fn total_co2(records: &[&HourlyRecord]) -> f64 {
    records.iter().filter_map(|r| r.co2_t).sum()
}

fn total_generation(records: &[&HourlyRecord]) -> f64 {
    records.iter().filter_map(|r| r.generation_mwh).sum()
}

/// Monthly totals and the generation-weighted average intensity.
pub fn monthly_summary(month: &[&HourlyRecord]) -> MonthlySummary {
    let total_co2_t = total_co2(month);
    let total_generation_mwh = total_generation(month);

    MonthlySummary {
        total_co2_t,
        total_generation_mwh,
        avg_intensity: ratio_or_zero(total_co2_t, total_generation_mwh),
        records: month.len(),
        no_data: month.is_empty(),
    }
}

/// Sums CO2 per timestamp, ascending. Hours absent from the data stay absent.
pub fn hourly_series(day: &[&HourlyRecord]) -> Vec<HourlyPoint> {
    let mut by_ts: BTreeMap<NaiveDateTime, f64> = BTreeMap::new();
    for r in day {
        *by_ts.entry(r.timestamp).or_default() += r.co2_t.unwrap_or(0.0);
    }

    by_ts
        .into_iter()
        .map(|(timestamp, co2_t)| HourlyPoint { timestamp, co2_t })
        .collect()
}

/// Splits one hour of the day by fuel subtype, in order of first appearance.
///
/// Records without a subtype are left out. An hour outside 0..=23 or without
/// labeled records yields an empty mix flagged `no_data`. A zero total gives
/// every subtype 0%.
pub fn fuel_mix(day: &[&HourlyRecord], hour: u32) -> FuelMix {
    if hour >= HOURS_PER_DAY {
        warn!(hour, "Hour out of range, returning empty fuel mix");
        return FuelMix::empty(hour);
    }

    let mut groups: Vec<(&str, f64)> = Vec::new();
    for r in day.iter().filter(|r| r.hour() == hour) {
        let Some(label) = r.subtype() else { continue };
        let co2 = r.co2_t.unwrap_or(0.0);
        match groups.iter_mut().find(|(subtype, _)| *subtype == label) {
            Some((_, sum)) => *sum += co2,
            None => groups.push((label, co2)),
        }
    }

    if groups.is_empty() {
        return FuelMix::empty(hour);
    }

    let total_co2_t: f64 = groups.iter().map(|(_, sum)| sum).sum();
    let shares = groups
        .into_iter()
        .map(|(subtype, co2_t)| FuelShare {
            fuel_subtype: subtype.to_string(),
            co2_t,
            percentage: pct(co2_t, total_co2_t),
        })
        .collect();

    FuelMix {
        hour,
        total_co2_t,
        shares,
        no_data: false,
    }
}

/// Sums CO2 per (hour of day, subtype), ordered by hour then subtype.
/// Records without a subtype are left out.
pub fn fuel_trend(day: &[&HourlyRecord]) -> Vec<FuelTrendPoint> {
    let mut by_key: BTreeMap<(u32, &str), f64> = BTreeMap::new();
    for r in day {
        if let Some(subtype) = r.subtype() {
            *by_key.entry((r.hour(), subtype)).or_default() += r.co2_t.unwrap_or(0.0);
        }
    }

    by_key
        .into_iter()
        .map(|((hour, subtype), co2_t)| FuelTrendPoint {
            hour,
            fuel_subtype: subtype.to_string(),
            co2_t,
        })
        .collect()
}

/// Pivots trend points into one line per subtype. Missing hours are not filled.
pub fn pivot_fuel_trend(points: &[FuelTrendPoint]) -> Vec<FuelSeries> {
    let mut by_subtype: BTreeMap<&str, Vec<HourValue>> = BTreeMap::new();
    for p in points {
        by_subtype
            .entry(p.fuel_subtype.as_str())
            .or_default()
            .push(HourValue {
                hour: p.hour,
                co2_t: p.co2_t,
            });
    }

    by_subtype
        .into_iter()
        .map(|(subtype, mut points)| {
            points.sort_by_key(|p| p.hour);
            FuelSeries {
                fuel_subtype: subtype.to_string(),
                points,
            }
        })
        .collect()
}

/// Hourly intensity across the month and its unweighted mean.
///
/// Hours with no generation have no intensity and are left out of the mean.
/// `weighted_mean` is carried alongside for comparison with the monthly tile.
pub fn intensity_series(month: &[&HourlyRecord]) -> IntensitySeries {
    let mut by_ts: BTreeMap<NaiveDateTime, (f64, f64)> = BTreeMap::new();
    for r in month {
        let (co2, generation) = by_ts.entry(r.timestamp).or_default();
        *co2 += r.co2_t.unwrap_or(0.0);
        *generation += r.generation_mwh.unwrap_or(0.0);
    }

    let points: Vec<IntensityPoint> = by_ts
        .into_iter()
        .map(|(timestamp, (co2_t, generation_mwh))| IntensityPoint {
            timestamp,
            co2_t,
            generation_mwh,
            intensity: (generation_mwh > 0.0).then(|| co2_t / generation_mwh),
        })
        .collect();

    let ratios: Vec<f64> = points.iter().filter_map(|p| p.intensity).collect();

    IntensitySeries {
        mean: mean(&ratios),
        weighted_mean: ratio_or_zero(total_co2(month), total_generation(month)),
        hours_without_generation: points.len() - ratios.len(),
        no_data: points.is_empty(),
        points,
    }
}
