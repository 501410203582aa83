//! Pipeline orchestration
//!
//! This module provides the public entry point of PetPulse. A caller hands
//! over the recent readings of one subject and receives a score, alerts and
//! per-metric trends. Nothing is cached between calls; re-invoke whenever a
//! new reading arrives.

use crate::alerts::AlertEngine;
use crate::catalog::MetricCatalog;
use crate::error::{ConfigurationError, HealthError, ValidationError};
use crate::schema::{ReadingAdapter, ReadingWindow};
use crate::score::ScoreAggregator;
use crate::source::ReadingSource;
use crate::trend::TrendAnalyzer;
use crate::types::{HealthAssessment, Reading, ReadingOrder};

/// Assess a reading sequence with the standard catalog.
///
/// # Arguments
/// * `readings` - Recent readings of one subject
/// * `order` - Declared time ordering of `readings`
///
/// # Example
/// ```ignore
/// let assessment = compute_health(&readings, ReadingOrder::NewestFirst)?;
/// println!("score: {}", assessment.score);
/// ```
pub fn compute_health(
    readings: &[Reading],
    order: ReadingOrder,
) -> Result<HealthAssessment, ValidationError> {
    HealthEngine::new().compute_health(readings, order)
}

/// Assess a JSON array of readings with the standard catalog and return the
/// assessment as JSON.
pub fn compute_health_json(json: &str, order: ReadingOrder) -> Result<String, HealthError> {
    HealthEngine::new().compute_health_json(json, order)
}

/// Health engine bound to a validated metric catalog.
///
/// Holds no per-subject state; one engine can serve any number of subjects
/// concurrently.
#[derive(Debug, Clone, Default)]
pub struct HealthEngine {
    catalog: MetricCatalog,
}

impl HealthEngine {
    /// Create an engine with the standard catalog
    pub fn new() -> Self {
        Self::with_catalog(MetricCatalog::standard())
    }

    /// Create an engine with a custom catalog
    pub fn with_catalog(catalog: MetricCatalog) -> Self {
        Self { catalog }
    }

    /// Create an engine from catalog JSON
    pub fn from_catalog_json(json: &str) -> Result<Self, ConfigurationError> {
        Ok(Self::with_catalog(MetricCatalog::from_json(json)?))
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    /// Validate and assess a reading sequence
    pub fn compute_health(
        &self,
        readings: &[Reading],
        order: ReadingOrder,
    ) -> Result<HealthAssessment, ValidationError> {
        let window = ReadingWindow::from_slice(readings, order)?;
        Ok(self.assess(&window))
    }

    /// Assess an already validated window.
    ///
    /// Stages:
    /// 1. ScoreAggregator - score the latest reading
    /// 2. AlertEngine - threshold and sustained-trend alerts
    /// 3. TrendAnalyzer - direction of every catalog metric
    pub fn assess(&self, window: &ReadingWindow) -> HealthAssessment {
        let score = ScoreAggregator::new(&self.catalog).score_window(window);
        let alerts = AlertEngine::new(&self.catalog).evaluate_window(window);
        let trends = self
            .catalog
            .definitions()
            .iter()
            .map(|def| (def.key, TrendAnalyzer::window_trend(window, def.key)))
            .collect();

        tracing::debug!(
            readings = window.len(),
            score = %score,
            alerts = alerts.len(),
            "computed health assessment"
        );

        HealthAssessment {
            score,
            alerts,
            trends,
        }
    }

    /// Parse a JSON array of readings, assess it and encode the result
    pub fn compute_health_json(&self, json: &str, order: ReadingOrder) -> Result<String, HealthError> {
        let readings = ReadingAdapter::parse_array(json)?;
        let assessment = self.compute_health(&readings, order)?;
        Ok(serde_json::to_string(&assessment)?)
    }

    /// Assess a subject using readings from an external source
    pub fn assess_subject<S>(&self, source: &S, subject_id: &str) -> Result<HealthAssessment, HealthError>
    where
        S: ReadingSource + ?Sized,
    {
        let readings = source.readings_for(subject_id)?;
        Ok(self.compute_health(&readings, source.order())?)
    }
}
