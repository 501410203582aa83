//! Composite health score
//!
//! Each present metric is penalized by how far its value lies outside the
//! normal range, relative to the scale of that range. Penalties are combined
//! as a weighted average over the metrics actually present, so a missing
//! metric never counts as zero or as worst-case.

use crate::catalog::{MetricCatalog, MetricDefinition};
use crate::error::ValidationError;
use crate::schema::ReadingWindow;
use crate::types::{HealthScore, Reading};

/// Score aggregator bound to a metric catalog
pub struct ScoreAggregator<'a> {
    catalog: &'a MetricCatalog,
}

impl<'a> ScoreAggregator<'a> {
    pub fn new(catalog: &'a MetricCatalog) -> Self {
        Self { catalog }
    }

    /// Score a single reading.
    ///
    /// Returns `HealthScore::UNAVAILABLE` when no catalog metric is present.
    /// A NaN or infinite value is rejected, never scored.
    pub fn score(&self, reading: &Reading) -> Result<HealthScore, ValidationError> {
        if let Some(field) = reading.non_finite_field() {
            return Err(ValidationError::NonNumeric { index: 0, field });
        }
        Ok(self.score_finite(reading))
    }

    /// Score the latest reading of a validated window
    pub fn score_window(&self, window: &ReadingWindow) -> HealthScore {
        self.score_finite(window.latest())
    }

    fn score_finite(&self, reading: &Reading) -> HealthScore {
        let mut total_penalty = 0.0;
        let mut present_weight = 0.0;
        let mut present = 0usize;

        for def in self.catalog.definitions() {
            let Some(value) = reading.value(def.key) else {
                continue;
            };

            let penalty = penalty_percent(def, value);
            tracing::trace!(metric = %def.key, value, penalty, "metric penalty");

            total_penalty += penalty * def.score_weight;
            present_weight += def.score_weight;
            present += 1;
        }

        if present == 0 {
            return HealthScore::UNAVAILABLE;
        }

        // Present metrics carrying zero weight contribute nothing either way.
        if present_weight <= 0.0 {
            return HealthScore::new(100);
        }

        let score = (100.0 - total_penalty / present_weight).round().clamp(0.0, 100.0);
        HealthScore::new(score as u8)
    }
}

/// Penalty in percent for one metric value, in [0, 100]
pub fn penalty_percent(def: &MetricDefinition, value: f64) -> f64 {
    let range = &def.normal_range;
    let deviation = range.distance(value);
    if deviation == 0.0 {
        return 0.0;
    }

    let max_deviation = range.width().max(range.min.abs()).max(range.max.abs());
    if max_deviation <= 0.0 {
        // degenerate range pinned at zero: any deviation is total
        return 100.0;
    }

    (deviation / max_deviation * 100.0).clamp(0.0, 100.0)
}
