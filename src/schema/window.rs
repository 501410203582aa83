//! Validated reading window
//!
//! A `ReadingWindow` holds a non-empty, time-ordered, all-finite reading
//! sequence stored newest-first, whatever order the caller supplied.

use crate::error::ValidationError;
use crate::types::{MetricKey, Reading, ReadingOrder};

/// Validated readings for one subject, newest first
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingWindow {
    readings: Vec<Reading>,
}

impl ReadingWindow {
    /// Validate `readings` against the declared `order`.
    ///
    /// Equal timestamps are accepted in either order. Error indices refer to
    /// positions in the sequence as supplied.
    pub fn new(mut readings: Vec<Reading>, order: ReadingOrder) -> Result<Self, ValidationError> {
        if readings.is_empty() {
            return Err(ValidationError::EmptySequence);
        }

        for (index, reading) in readings.iter().enumerate() {
            if let Some(field) = reading.non_finite_field() {
                return Err(ValidationError::NonNumeric { index, field });
            }
        }

        for (offset, pair) in readings.windows(2).enumerate() {
            let (earlier, later) = (&pair[0], &pair[1]);
            let in_order = match order {
                ReadingOrder::NewestFirst => later.timestamp <= earlier.timestamp,
                ReadingOrder::OldestFirst => later.timestamp >= earlier.timestamp,
            };
            if !in_order {
                return Err(ValidationError::OutOfOrder {
                    index: offset + 1,
                    order,
                });
            }
        }

        if order == ReadingOrder::OldestFirst {
            readings.reverse();
        }

        Ok(Self { readings })
    }

    /// Validate a borrowed sequence
    pub fn from_slice(readings: &[Reading], order: ReadingOrder) -> Result<Self, ValidationError> {
        Self::new(readings.to_vec(), order)
    }

    /// Most recent reading
    pub fn latest(&self) -> &Reading {
        // non-empty by construction
        &self.readings[0]
    }

    /// Up to `n` most recent readings, newest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &Reading> {
        self.readings.iter().take(n)
    }

    /// All values of one metric, newest first
    pub fn series(&self, key: MetricKey) -> Vec<Option<f64>> {
        self.recent_series(key, self.readings.len())
    }

    /// Values of one metric over the `n` most recent readings, newest first
    pub fn recent_series(&self, key: MetricKey, n: usize) -> Vec<Option<f64>> {
        self.recent(n).map(|reading| reading.value(key)).collect()
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}
