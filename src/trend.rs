//! Trend analysis
//!
//! Short-horizon direction of a metric and detection of abnormal values that
//! persist across the most recent samples.

use crate::catalog::Range;
use crate::error::ValidationError;
use crate::schema::ReadingWindow;
use crate::types::{MetricKey, ReadingOrder, TrendDirection};
use serde::{Deserialize, Serialize};

/// Number of most recent samples that must all be abnormal
pub const PERSISTENCE_WINDOW: usize = 3;

/// Side of a threshold a value deviates to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deviation {
    /// Above the threshold
    High,
    /// Below the threshold
    Low,
}

impl Deviation {
    /// True when `value` is strictly beyond `threshold` on this side
    pub fn beyond(&self, value: f64, threshold: f64) -> bool {
        match self {
            Deviation::High => value > threshold,
            Deviation::Low => value < threshold,
        }
    }

    /// True when `value` leaves `range` on this side
    pub fn exceeds(&self, value: f64, range: &Range) -> bool {
        self.beyond(value, self.bound(range))
    }

    /// The edge of `range` this side is measured against
    pub fn bound(&self, range: &Range) -> f64 {
        match self {
            Deviation::High => range.max,
            Deviation::Low => range.min,
        }
    }
}

/// Stateless trend analyzer over a metric series
pub struct TrendAnalyzer;

impl TrendAnalyzer {
    /// Direction between the two most recent available values.
    ///
    /// Unavailable entries are skipped. Fewer than two available values yield
    /// `InsufficientData`. A tie resolves to `Decreasing`. A NaN or infinite
    /// entry is rejected with its position in `series`.
    pub fn trend(
        series: &[Option<f64>],
        order: ReadingOrder,
    ) -> Result<TrendDirection, ValidationError> {
        if let Some(index) = series
            .iter()
            .position(|sample| matches!(sample, Some(v) if !v.is_finite()))
        {
            return Err(ValidationError::NonNumeric {
                index,
                field: "value",
            });
        }
        Ok(direction(newest_first(series, order)))
    }

    /// Direction of one metric over a validated window
    pub fn window_trend(window: &ReadingWindow, key: MetricKey) -> TrendDirection {
        direction(window.recent(window.len()).map(|reading| reading.value(key)))
    }

    /// True only if each of the [`PERSISTENCE_WINDOW`] most recent samples is
    /// available and beyond `threshold` on the `deviation` side.
    ///
    /// Samples older than the window are never inspected.
    pub fn is_persistently_abnormal(
        series: &[Option<f64>],
        order: ReadingOrder,
        threshold: f64,
        deviation: Deviation,
    ) -> bool {
        let recent: Vec<Option<f64>> = newest_first(series, order)
            .take(PERSISTENCE_WINDOW)
            .collect();

        recent.len() == PERSISTENCE_WINDOW
            && recent
                .iter()
                .all(|sample| matches!(sample, Some(v) if deviation.beyond(*v, threshold)))
    }
}

fn direction(samples: impl Iterator<Item = Option<f64>>) -> TrendDirection {
    let mut available = samples.flatten();

    match (available.next(), available.next()) {
        (Some(latest), Some(previous)) if latest > previous => TrendDirection::Increasing,
        (Some(_), Some(_)) => TrendDirection::Decreasing,
        _ => TrendDirection::InsufficientData,
    }
}

fn newest_first<'a>(
    series: &'a [Option<f64>],
    order: ReadingOrder,
) -> Box<dyn Iterator<Item = Option<f64>> + 'a> {
    match order {
        ReadingOrder::NewestFirst => Box::new(series.iter().copied()),
        ReadingOrder::OldestFirst => Box::new(series.iter().rev().copied()),
    }
}
