//! CSV parser for the hourly SEN emissions export.
//!
//! Columns are located by header name (see [`IngestConfig`]). Cells are
//! coerced leniently: a timestamp or row encoding that cannot be read drops
//! the row, a number that cannot be read becomes a missing measurement and a
//! blank subtype is kept as unlabeled.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ByteRecord, ReaderBuilder, StringRecord};

use crate::config::IngestConfig;
use crate::error::{EmissionsError, RowError};
use crate::table::{EmissionsTable, HourlyRecord, IngestReport};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];

const MISSING_MARKERS: &[&str] = &["n.a.", "na", "n/a", "nan", "-", "null"];

struct Columns {
    timestamp: usize,
    co2: usize,
    generation: usize,
    subtype: usize,
}

impl Columns {
    fn locate(headers: &StringRecord, cfg: &IngestConfig) -> Result<Self, EmissionsError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
                .ok_or_else(|| EmissionsError::MissingColumn(name.to_string()))
        };

        Ok(Self {
            timestamp: find(cfg.timestamp_column.as_str())?,
            co2: find(cfg.co2_column.as_str())?,
            generation: find(cfg.generation_column.as_str())?,
            subtype: find(cfg.subtype_column.as_str())?,
        })
    }
}

/// Parses CSV bytes into a validated [`EmissionsTable`].
///
/// # Errors
///
/// Returns an error if a configured column is missing from the header or the
/// header itself is not readable CSV. Individual bad rows, including rows that
/// are not valid UTF-8, are counted, not returned.
#[tracing::instrument(skip(bytes, cfg), fields(bytes = bytes.len()))]
pub fn parse_table(
    bytes: &[u8],
    cfg: &IngestConfig,
) -> Result<(EmissionsTable, IngestReport), EmissionsError> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(sniff_delimiter(bytes))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = rdr.headers()?.clone();
    let columns = Columns::locate(&headers, cfg)?;

    let mut rows = Vec::new();
    for result in rdr.byte_records() {
        let row = match result {
            Ok(record) => decode_row(record)
                .and_then(|record| parse_row(&record, &columns, cfg)),
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => Err(RowError::Unreadable(e.to_string())),
        };
        rows.push(row);
    }

    Ok(EmissionsTable::from_rows(rows))
}

fn decode_row(record: ByteRecord) -> Result<StringRecord, RowError> {
    let line = record.position().map(|p| p.line()).unwrap_or(0);
    StringRecord::from_byte_record(record).map_err(|_| RowError::Encoding(line))
}

fn parse_row(
    record: &StringRecord,
    columns: &Columns,
    cfg: &IngestConfig,
) -> Result<HourlyRecord, RowError> {
    let cell = move |idx: usize| record.get(idx).unwrap_or("");

    let raw_ts = cell(columns.timestamp);
    let timestamp = parse_timestamp(raw_ts, &cfg.timestamp_formats)
        .ok_or_else(|| RowError::Timestamp(raw_ts.to_string()))?;

    let fuel_subtype = Some(cell(columns.subtype).trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(HourlyRecord {
        timestamp,
        fuel_subtype,
        co2_t: parse_number(cell(columns.co2), cfg.decimal_comma),
        generation_mwh: parse_number(cell(columns.generation), cfg.decimal_comma),
    })
}

/// Semicolon-separated exports are common with comma decimals.
fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or(&[]);
    let semicolons = first_line.iter().filter(|b| **b == b';').count();
    let commas = first_line.iter().filter(|b| **b == b',').count();
    if semicolons > commas { b';' } else { b',' }
}

/// Reads a timestamp in any of the accepted layouts. Offsets are dropped and
/// the wall-clock time kept.
pub fn parse_timestamp(value: &str, extra_formats: &[String]) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    let datetime_formats = DATETIME_FORMATS
        .iter()
        .copied()
        .chain(extra_formats.iter().map(String::as_str));
    for fmt in datetime_formats {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(ts);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Coerces a measurement cell. Blank, marker, negative and non-finite values
/// are missing.
///
/// Without `decimal_comma`, a comma is a thousands separator when the value is
/// grouped in threes (`1,234`, `12,345,678`) or a period is present
/// (`1,234.5`). Any other lone comma is a decimal mark (`119,5`, `0,125`).
pub fn parse_number(value: &str, decimal_comma: bool) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() || MISSING_MARKERS.contains(&value.to_ascii_lowercase().as_str()) {
        return None;
    }

    let normalized = if decimal_comma {
        value.replace('.', "").replace(',', ".")
    } else if value.contains(',') && !value.contains('.') && !is_thousands_grouped(value) {
        value.replace(',', ".")
    } else {
        value.replace(',', "")
    };

    normalized
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

fn is_thousands_grouped(value: &str) -> bool {
    let all_digits = |g: &str| g.bytes().all(|b| b.is_ascii_digit());
    let mut groups = value.split(',');
    let lead = groups.next().unwrap_or("");

    (1..=3).contains(&lead.len())
        && all_digits(lead)
        && !lead.starts_with('0')
        && groups.all(|g| g.len() == 3 && all_digits(g))
}
