use serde::Deserialize;

use crate::error::EmissionsError;

/// How the CSV export is laid out and how its cells should be coerced.
///
/// Stored as a plain JSON object on disk; every field is optional:
/// ```json
/// {
///   "timestamp_column": "FechaHora",
///   "co2_column": "CO2e_t",
///   "generation_column": "Generacion_MWh",
///   "subtype_column": "Subtipo",
///   "timestamp_formats": ["%d.%m.%Y %H:%M"],
///   "decimal_comma": false
/// }
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct IngestConfig {
    pub timestamp_column: String,
    pub co2_column: String,
    pub generation_column: String,
    pub subtype_column: String,
    /// Extra `chrono` format strings tried after the built-in ones.
    pub timestamp_formats: Vec<String>,
    /// Treat `.` as a thousands separator and `,` as the decimal mark.
    pub decimal_comma: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            timestamp_column: "FechaHora".to_string(),
            co2_column: "CO2e_t".to_string(),
            generation_column: "Generacion_MWh".to_string(),
            subtype_column: "Subtipo".to_string(),
            timestamp_formats: Vec::new(),
            decimal_comma: false,
        }
    }
}

impl IngestConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self, EmissionsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, EmissionsError> {
        serde_json::from_str(content).map_err(|e| EmissionsError::Config(e.to_string()))
    }
}
