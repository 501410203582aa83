//! Adapter for parsing serialized readings
//!
//! Type mismatches (a string where a number is expected) are rejected with
//! the index of the offending reading rather than coerced.

use crate::error::ValidationError;
use crate::types::Reading;
use chrono::{DateTime, Utc};

/// Adapter for converting serialized input to readings
pub struct ReadingAdapter;

impl ReadingAdapter {
    /// Parse a JSON string containing an array of readings
    pub fn parse_array(json: &str) -> Result<Vec<Reading>, ValidationError> {
        let values: Vec<serde_json::Value> =
            serde_json::from_str(json).map_err(|e| ValidationError::Malformed {
                index: 0,
                message: format!("expected a JSON array of readings: {e}"),
            })?;

        values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                serde_json::from_value(value).map_err(|e| ValidationError::Malformed {
                    index,
                    message: e.to_string(),
                })
            })
            .collect()
    }

    /// Parse NDJSON (newline-delimited JSON) containing readings
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<Reading>, ValidationError> {
        let mut readings = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<Reading>(trimmed) {
                Ok(reading) => readings.push(reading),
                Err(e) => {
                    return Err(ValidationError::Malformed {
                        index: readings.len(),
                        message: format!("line {}: {}", line_num + 1, e),
                    });
                }
            }
        }
        Ok(readings)
    }

    /// Validate a batch of readings, reporting every invalid one
    pub fn validate_readings(readings: &[Reading]) -> Vec<ValidationResult> {
        readings
            .iter()
            .enumerate()
            .filter_map(|(index, reading)| {
                reading.non_finite_field().map(|field| ValidationResult {
                    index,
                    timestamp: reading.timestamp,
                    error: ValidationError::NonNumeric { index, field },
                })
            })
            .collect()
    }
}

/// Result of reading validation
#[derive(Debug)]
pub struct ValidationResult {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub error: ValidationError,
}
