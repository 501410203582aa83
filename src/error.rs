//! Error types for PetPulse

use crate::types::{MetricKey, ReadingOrder};
use thiserror::Error;

/// Rejected reading input.
///
/// Raised when a reading sequence cannot be evaluated as supplied. Missing
/// metric values are not errors; they are the normal "unavailable" case.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Reading sequence is empty")]
    EmptySequence,

    #[error("Reading {index}: field {field} is not a finite number")]
    NonNumeric { index: usize, field: &'static str },

    #[error("Reading {index}: malformed input: {message}")]
    Malformed { index: usize, message: String },

    #[error("Reading {index}: timestamp breaks declared {order} ordering")]
    OutOfOrder { index: usize, order: ReadingOrder },
}

/// Invalid metric catalog.
///
/// Raised while building a [`crate::catalog::MetricCatalog`]; a catalog that
/// fails these checks must never reach an evaluation.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Catalog defines no metrics")]
    EmptyCatalog,

    #[error("Metric {0} is defined more than once")]
    DuplicateMetric(MetricKey),

    #[error("Metric {key}: {tier} range is invalid ({min}, {max})")]
    InvalidRange {
        key: MetricKey,
        tier: &'static str,
        min: f64,
        max: f64,
    },

    #[error("Metric {key}: {inner} range is not contained in {outer} range")]
    TierNesting {
        key: MetricKey,
        inner: &'static str,
        outer: &'static str,
    },

    #[error("Metric {key}: weight {weight} must be finite and non-negative")]
    InvalidWeight { key: MetricKey, weight: f64 },

    #[error("Metric weights sum to {0}, expected 1.0")]
    WeightSum(f64),

    #[error("Invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced by the public entry points
#[derive(Debug, Error)]
pub enum HealthError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown subject: {0}")]
    UnknownSubject(String),
}
