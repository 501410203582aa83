//! PetPulse - Health scoring and alerting engine for pet vital signs
//!
//! PetPulse turns a short window of vital-sign readings for one animal into a
//! composite health score (0-100), a ranked list of actionable alerts and a
//! per-metric trend direction. Every evaluation is a pure function of its
//! input window and a validated metric catalog:
//! readings → validation → score + alerts + trends.
//!
//! ## Modules
//!
//! - **Catalog**: Metric ranges, weights, check directions and advice
//! - **Engine**: Score aggregation, alert evaluation and trend analysis
//! - **Input**: Reading parsing, validation and reading sources

pub mod alerts;
pub mod catalog;
pub mod error;
pub mod pipeline;
pub mod schema;
pub mod score;
pub mod source;
pub mod trend;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use catalog::{MetricCatalog, MetricDefinition};
pub use error::{ConfigurationError, HealthError, ValidationError};
pub use pipeline::{compute_health, compute_health_json, HealthEngine};
pub use source::{InMemoryReadingStore, ReadingSource};
pub use types::{
    Alert, AlertKind, HealthAssessment, HealthScore, MetricKey, Reading, ReadingOrder, Severity,
    TrendDirection,
};

/// PetPulse version
pub const PETPULSE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI and FFI
pub const PRODUCER_NAME: &str = "petpulse";
