//! Emissions aggregation for the dashboard.
//!
//! This module turns day and month selections of the hourly table into
//! monthly metric tiles, the hourly emissions line, the fuel ring chart, the
//! per-fuel trend and the hourly carbon-intensity line.

pub mod aggregate;
pub mod analyzer;
pub mod types;
pub mod utility;
