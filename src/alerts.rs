//! Alert evaluation
//!
//! A single generic evaluator driven by catalog entries. For each metric
//! present in the latest reading it checks, in order:
//! 1. critical range breach on a watched side → `Critical`
//! 2. warning range breach on a watched side → `Warning`
//! 3. the last three samples all beyond the sustained range → `Warning`
//!    sustained-trend alert
//!
//! At most one alert is produced per metric. Alerts are ordered critical
//! first, then by catalog declaration order.

use crate::catalog::{MetricCatalog, MetricDefinition, Range};
use crate::error::ValidationError;
use crate::schema::ReadingWindow;
use crate::trend::{Deviation, TrendAnalyzer, PERSISTENCE_WINDOW};
use crate::types::{Alert, AlertKind, Reading, ReadingOrder, Severity};

/// Alert engine bound to a metric catalog
pub struct AlertEngine<'a> {
    catalog: &'a MetricCatalog,
}

impl<'a> AlertEngine<'a> {
    pub fn new(catalog: &'a MetricCatalog) -> Self {
        Self { catalog }
    }

    /// Validate a reading sequence and evaluate it
    pub fn evaluate(
        &self,
        readings: &[Reading],
        order: ReadingOrder,
    ) -> Result<Vec<Alert>, ValidationError> {
        let window = ReadingWindow::from_slice(readings, order)?;
        Ok(self.evaluate_window(&window))
    }

    /// Evaluate an already validated window
    pub fn evaluate_window(&self, window: &ReadingWindow) -> Vec<Alert> {
        let latest = window.latest();

        let mut alerts: Vec<Alert> = self
            .catalog
            .definitions()
            .iter()
            .filter_map(|def| {
                let value = latest.value(def.key)?;
                check_metric(def, value, window)
            })
            .collect();

        // stable sort keeps declaration order within a severity
        alerts.sort_by_key(|alert| alert.severity.rank());
        alerts
    }
}

fn check_metric(def: &MetricDefinition, value: f64, window: &ReadingWindow) -> Option<Alert> {
    if def.check.breaches(&def.critical_range, value) {
        tracing::trace!(metric = %def.key, value, "critical range breached");
        return Some(threshold_alert(def, value, Severity::Critical, &def.critical_range));
    }

    if def.check.breaches(&def.warning_range, value) {
        tracing::trace!(metric = %def.key, value, "warning range breached");
        return Some(threshold_alert(def, value, Severity::Warning, &def.warning_range));
    }

    let sustained = def.sustained();
    let series = window.recent_series(def.key, PERSISTENCE_WINDOW);

    def.check
        .deviations()
        .iter()
        .find(|deviation| {
            TrendAnalyzer::is_persistently_abnormal(
                &series,
                ReadingOrder::NewestFirst,
                deviation.bound(&sustained),
                **deviation,
            )
        })
        .map(|deviation| {
            tracing::trace!(metric = %def.key, value, ?deviation, "sustained deviation");
            sustained_alert(def, value, *deviation, &sustained)
        })
}

fn threshold_alert(def: &MetricDefinition, value: f64, severity: Severity, range: &Range) -> Alert {
    let (side, limit) = if value > range.max {
        ("above", range.max)
    } else {
        ("below", range.min)
    };
    let tier = match severity {
        Severity::Critical => "critical",
        Severity::Warning => "warning",
    };

    Alert {
        metric_key: def.key,
        severity,
        kind: AlertKind::Threshold,
        value,
        unit: def.unit.clone(),
        message: format!(
            "{} is {}, {} the {} limit of {}.",
            def.key.label(),
            with_unit(value, &def.unit),
            side,
            tier,
            with_unit(limit, &def.unit)
        ),
        advice: def.advice_for(severity).to_string(),
    }
}

fn sustained_alert(def: &MetricDefinition, value: f64, deviation: Deviation, range: &Range) -> Alert {
    let side = match deviation {
        Deviation::High => "above",
        Deviation::Low => "below",
    };

    Alert {
        metric_key: def.key,
        severity: Severity::Warning,
        kind: AlertKind::SustainedTrend,
        value,
        unit: def.unit.clone(),
        message: format!(
            "{} has stayed {} {} for the last {} readings (now {}).",
            def.key.label(),
            side,
            with_unit(deviation.bound(range), &def.unit),
            PERSISTENCE_WINDOW,
            with_unit(value, &def.unit)
        ),
        advice: def.advice_for(Severity::Warning).to_string(),
    }
}

fn with_unit(value: f64, unit: &str) -> String {
    if unit.is_empty() {
        format!("{value}")
    } else {
        format!("{value} {unit}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MetricKey;
    use chrono::{DateTime, Duration, Utc};

    fn at(minutes: i64) -> DateTime<Utc> {
        let base: DateTime<Utc> = "2024-06-01T12:00:00Z".parse().unwrap();
        base + Duration::minutes(minutes)
    }

    fn healthy(minutes: i64) -> Reading {
        Reading::new(at(minutes))
            .with(MetricKey::HeartRate, 80.0)
            .with(MetricKey::Temperature, 38.5)
            .with(MetricKey::RespiratoryRate, 20.0)
            .with(MetricKey::ActivityLevel, 6.0)
            .with(MetricKey::SleepDuration, 780.0)
            .with(MetricKey::HoursSinceFeeding, 3.0)
    }

    fn evaluate(readings: &[Reading]) -> Vec<Alert> {
        let catalog = MetricCatalog::standard();
        AlertEngine::new(&catalog)
            .evaluate(readings, ReadingOrder::NewestFirst)
            .unwrap()
    }

    #[test]
    fn test_healthy_reading_has_no_alerts() {
        assert!(evaluate(&[healthy(0)]).is_empty());
    }

    #[test]
    fn test_heart_rate_135_is_single_critical() {
        let alerts = evaluate(&[healthy(0).with(MetricKey::HeartRate, 135.0)]);

        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        assert_eq!(alert.metric_key, MetricKey::HeartRate);
        assert_eq!(alert.severity, Severity::Critical);
        assert_eq!(alert.kind, AlertKind::Threshold);
        assert!(alert.message.contains("135 bpm"));
        assert_eq!(
            alert.advice,
            MetricCatalog::standard()
                .get(MetricKey::HeartRate)
                .unwrap()
                .advice
                .critical
        );
    }

    #[test]
    fn test_critical_sorted_before_warning() {
        // warning on the first declared metric, critical on a later one
        let reading = healthy(0)
            .with(MetricKey::HeartRate, 127.0)
            .with(MetricKey::RespiratoryRate, 45.0);
        let alerts = evaluate(&[reading]);

        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[0].metric_key, MetricKey::RespiratoryRate);
        assert_eq!(alerts[1].severity, Severity::Warning);
        assert_eq!(alerts[1].metric_key, MetricKey::HeartRate);
    }

    #[test]
    fn test_same_severity_uses_declaration_order() {
        let reading = healthy(0)
            .with(MetricKey::HoursSinceFeeding, 13.0)
            .with(MetricKey::Temperature, 40.5)
            .with(MetricKey::HeartRate, 126.0);
        let keys: Vec<MetricKey> = evaluate(&[reading]).iter().map(|a| a.metric_key).collect();

        assert_eq!(
            keys,
            vec![
                MetricKey::HeartRate,
                MetricKey::Temperature,
                MetricKey::HoursSinceFeeding
            ]
        );
    }

    #[test]
    fn test_single_sided_checks() {
        // hydration only alerts when low
        let alerts = evaluate(&[healthy(0).with(MetricKey::HydrationLevel, 45.0)]);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Warning);
        assert!(alerts[0].message.contains("45 %"));

        let alerts = evaluate(&[healthy(0).with(MetricKey::HydrationLevel, 30.0)]);
        assert_eq!(alerts[0].severity, Severity::Critical);

        let alerts = evaluate(&[healthy(0).with(MetricKey::HydrationLevel, 105.0)]);
        assert!(alerts.is_empty());

        // feeding interval only alerts when high
        let alerts = evaluate(&[healthy(0).with(MetricKey::HoursSinceFeeding, 13.0)]);
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].message.contains("above"));

        // sleep alerts in both directions
        let short = evaluate(&[healthy(0).with(MetricKey::SleepDuration, 500.0)]);
        let long = evaluate(&[healthy(0).with(MetricKey::SleepDuration, 1000.0)]);
        assert_eq!(short[0].severity, Severity::Warning);
        assert_eq!(long[0].severity, Severity::Warning);
    }

    #[test]
    fn test_sustained_trend_alert() {
        let readings = [
            healthy(20).with(MetricKey::HeartRate, 122.0),
            healthy(10).with(MetricKey::HeartRate, 124.0),
            healthy(0).with(MetricKey::HeartRate, 121.0),
        ];
        let alerts = evaluate(&readings);

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::SustainedTrend);
        assert_eq!(alerts[0].severity, Severity::Warning);
        assert!(alerts[0].message.contains("122 bpm"));
        assert!(alerts[0].message.contains("above 120 bpm"));
    }

    #[test]
    fn test_threshold_and_sustained_are_exclusive() {
        let readings = [
            healthy(20).with(MetricKey::HeartRate, 127.0),
            healthy(10).with(MetricKey::HeartRate, 124.0),
            healthy(0).with(MetricKey::HeartRate, 121.0),
        ];
        let alerts = evaluate(&readings);

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Threshold);
    }

    #[test]
    fn test_sustained_low_for_both_sided_metric() {
        let readings = [
            healthy(20).with(MetricKey::Temperature, 37.2),
            healthy(10).with(MetricKey::Temperature, 37.3),
            healthy(0).with(MetricKey::Temperature, 37.1),
        ];
        let alerts = evaluate(&readings);

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].metric_key, MetricKey::Temperature);
        assert!(alerts[0].message.contains("below 37.5 °C"));
    }

    #[test]
    fn test_sustained_looks_back_three_readings_only() {
        let readings = [
            healthy(30).with(MetricKey::HeartRate, 122.0),
            healthy(20).with(MetricKey::HeartRate, 123.0),
            healthy(10).with(MetricKey::HeartRate, 90.0),
            healthy(0).with(MetricKey::HeartRate, 124.0),
        ];
        assert!(evaluate(&readings).is_empty());
    }

    #[test]
    fn test_missing_latest_value_skips_metric() {
        let latest = Reading {
            heart_rate: None,
            ..healthy(20)
        };
        let readings = [
            latest,
            healthy(10).with(MetricKey::HeartRate, 140.0),
            healthy(0).with(MetricKey::HeartRate, 140.0),
        ];
        assert!(evaluate(&readings).is_empty());
    }

    #[test]
    fn test_oldest_first_evaluates_last_reading() {
        let catalog = MetricCatalog::standard();
        let readings = [
            healthy(0).with(MetricKey::HeartRate, 140.0),
            healthy(10),
        ];

        let alerts = AlertEngine::new(&catalog)
            .evaluate(&readings, ReadingOrder::OldestFirst)
            .unwrap();
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_rejects_invalid_sequence() {
        let catalog = MetricCatalog::standard();
        let engine = AlertEngine::new(&catalog);

        assert_eq!(
            engine.evaluate(&[], ReadingOrder::NewestFirst),
            Err(ValidationError::EmptySequence)
        );
        assert!(matches!(
            engine.evaluate(&[healthy(0), healthy(10)], ReadingOrder::NewestFirst),
            Err(ValidationError::OutOfOrder { index: 1, .. })
        ));
    }
}
