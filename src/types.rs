//! Core types for the PetPulse engine
//!
//! This module defines the data that flows through an evaluation: the raw
//! vital-sign readings coming in, and the score, alerts and trends going out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a recognized vital-sign metric.
///
/// Variant order is the catalog declaration order used as the alert
/// tie-break and as the iteration order of trend maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKey {
    HeartRate,
    Temperature,
    RespiratoryRate,
    ActivityLevel,
    HydrationLevel,
    SleepDuration,
    HoursSinceFeeding,
}

impl MetricKey {
    /// All metric keys in declaration order
    pub const ALL: [MetricKey; 7] = [
        MetricKey::HeartRate,
        MetricKey::Temperature,
        MetricKey::RespiratoryRate,
        MetricKey::ActivityLevel,
        MetricKey::HydrationLevel,
        MetricKey::SleepDuration,
        MetricKey::HoursSinceFeeding,
    ];

    /// Stable identifier, as used in catalogs and assessment output
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::HeartRate => "heartRate",
            MetricKey::Temperature => "temperature",
            MetricKey::RespiratoryRate => "respiratoryRate",
            MetricKey::ActivityLevel => "activityLevel",
            MetricKey::HydrationLevel => "hydrationLevel",
            MetricKey::SleepDuration => "sleepDuration",
            MetricKey::HoursSinceFeeding => "hoursSinceFeeding",
        }
    }

    /// Name of the matching field on [`Reading`]
    pub fn field_name(&self) -> &'static str {
        match self {
            MetricKey::HeartRate => "heart_rate",
            MetricKey::Temperature => "temperature",
            MetricKey::RespiratoryRate => "respiratory_rate",
            MetricKey::ActivityLevel => "activity_level",
            MetricKey::HydrationLevel => "hydration_level",
            MetricKey::SleepDuration => "sleep_duration",
            MetricKey::HoursSinceFeeding => "hours_since_feeding",
        }
    }

    /// Human-readable label used in alert messages
    pub fn label(&self) -> &'static str {
        match self {
            MetricKey::HeartRate => "Heart rate",
            MetricKey::Temperature => "Temperature",
            MetricKey::RespiratoryRate => "Respiratory rate",
            MetricKey::ActivityLevel => "Activity level",
            MetricKey::HydrationLevel => "Hydration level",
            MetricKey::SleepDuration => "Sleep duration",
            MetricKey::HoursSinceFeeding => "Time since feeding",
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared time ordering of a reading sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadingOrder {
    NewestFirst,
    OldestFirst,
}

impl fmt::Display for ReadingOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadingOrder::NewestFirst => f.write_str("newest-first"),
            ReadingOrder::OldestFirst => f.write_str("oldest-first"),
        }
    }
}

/// One sampled observation for a subject.
///
/// Every metric is optional; `None` means "not measured".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Sample time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Heart rate (bpm)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
    /// Body temperature (celsius)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Respiratory rate (breaths per minute)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respiratory_rate: Option<f64>,
    /// Activity index (unit-less, 0-10)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_level: Option<f64>,
    /// Hydration (percentage, 0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hydration_level: Option<f64>,
    /// Sleep duration (minutes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_duration: Option<f64>,
    /// Time elapsed since last feeding (hours)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_since_feeding: Option<f64>,
    /// Carried through, not interpreted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Carried through, not interpreted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl Reading {
    /// Create a reading with no metrics measured
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            heart_rate: None,
            temperature: None,
            respiratory_rate: None,
            activity_level: None,
            hydration_level: None,
            sleep_duration: None,
            hours_since_feeding: None,
            latitude: None,
            longitude: None,
        }
    }

    /// Set a metric value
    pub fn with(mut self, key: MetricKey, value: f64) -> Self {
        *self.slot_mut(key) = Some(value);
        self
    }

    /// Attach a location fix
    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Value of a metric, if measured
    pub fn value(&self, key: MetricKey) -> Option<f64> {
        match key {
            MetricKey::HeartRate => self.heart_rate,
            MetricKey::Temperature => self.temperature,
            MetricKey::RespiratoryRate => self.respiratory_rate,
            MetricKey::ActivityLevel => self.activity_level,
            MetricKey::HydrationLevel => self.hydration_level,
            MetricKey::SleepDuration => self.sleep_duration,
            MetricKey::HoursSinceFeeding => self.hours_since_feeding,
        }
    }

    fn slot_mut(&mut self, key: MetricKey) -> &mut Option<f64> {
        match key {
            MetricKey::HeartRate => &mut self.heart_rate,
            MetricKey::Temperature => &mut self.temperature,
            MetricKey::RespiratoryRate => &mut self.respiratory_rate,
            MetricKey::ActivityLevel => &mut self.activity_level,
            MetricKey::HydrationLevel => &mut self.hydration_level,
            MetricKey::SleepDuration => &mut self.sleep_duration,
            MetricKey::HoursSinceFeeding => &mut self.hours_since_feeding,
        }
    }

    /// First numeric field holding NaN or an infinity, if any
    pub fn non_finite_field(&self) -> Option<&'static str> {
        let metrics = MetricKey::ALL
            .iter()
            .map(|key| (key.field_name(), self.value(*key)));
        let location = [("latitude", self.latitude), ("longitude", self.longitude)];

        metrics
            .chain(location)
            .find(|(_, value)| matches!(value, Some(v) if !v.is_finite()))
            .map(|(field, _)| field)
    }

    /// Number of metrics measured in this reading
    pub fn present_count(&self) -> usize {
        MetricKey::ALL
            .iter()
            .filter(|key| self.value(**key).is_some())
            .count()
    }
}

/// Composite health score in [0, 100], or unavailable when no metric was
/// present. Serializes as an integer or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Option<u8>", try_from = "Option<u8>")]
pub struct HealthScore(Option<u8>);

impl HealthScore {
    pub const UNAVAILABLE: HealthScore = HealthScore(None);

    /// Create an available score, clamped to 100
    pub fn new(value: u8) -> Self {
        Self(Some(value.min(100)))
    }

    pub fn value(&self) -> Option<u8> {
        self.0
    }

    pub fn is_available(&self) -> bool {
        self.0.is_some()
    }
}

impl From<HealthScore> for Option<u8> {
    fn from(score: HealthScore) -> Self {
        score.0
    }
}

impl TryFrom<Option<u8>> for HealthScore {
    type Error = String;

    fn try_from(value: Option<u8>) -> Result<Self, Self::Error> {
        match value {
            Some(score) if score > 100 => Err(format!("health score {score} exceeds 100")),
            _ => Ok(Self(value)),
        }
    }
}

impl fmt::Display for HealthScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{value}"),
            None => f.write_str("unavailable"),
        }
    }
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    /// Sort rank, lower sorts first
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::Warning => 1,
        }
    }
}

/// What triggered an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Latest value breached a warning or critical range
    Threshold,
    /// Recent samples stayed beyond the sustained range
    SustainedTrend,
}

/// Actionable alert for one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub metric_key: MetricKey,
    pub severity: Severity,
    pub kind: AlertKind,
    /// Latest value of the metric
    pub value: f64,
    pub unit: String,
    pub message: String,
    pub advice: String,
}

/// Direction of the two most recent samples of a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    InsufficientData,
}

/// Complete assessment handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAssessment {
    pub score: HealthScore,
    pub alerts: Vec<Alert>,
    pub trends: BTreeMap<MetricKey, TrendDirection>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> DateTime<Utc> {
        "2024-06-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_reading_deserializes_missing_fields_as_unavailable() {
        let json = r#"{"timestamp": "2024-06-01T12:00:00Z", "heart_rate": 80.0, "temperature": null}"#;
        let reading: Reading = serde_json::from_str(json).unwrap();

        assert_eq!(reading.value(MetricKey::HeartRate), Some(80.0));
        assert_eq!(reading.value(MetricKey::Temperature), None);
        assert_eq!(reading.value(MetricKey::SleepDuration), None);
        assert_eq!(reading.present_count(), 1);
    }

    #[test]
    fn test_reading_rejects_string_in_numeric_field() {
        let json = r#"{"timestamp": "2024-06-01T12:00:00Z", "heart_rate": "fast"}"#;
        assert!(serde_json::from_str::<Reading>(json).is_err());
    }

    #[test]
    fn test_non_finite_field() {
        let reading = Reading::new(ts())
            .with(MetricKey::HeartRate, 80.0)
            .with(MetricKey::Temperature, f64::NAN);
        assert_eq!(reading.non_finite_field(), Some("temperature"));

        let reading = Reading::new(ts()).with_location(f64::INFINITY, 0.0);
        assert_eq!(reading.non_finite_field(), Some("latitude"));

        let reading = Reading::new(ts()).with(MetricKey::HeartRate, 80.0);
        assert_eq!(reading.non_finite_field(), None);
    }

    #[test]
    fn test_health_score_serialization() {
        assert_eq!(serde_json::to_string(&HealthScore::new(87)).unwrap(), "87");
        assert_eq!(serde_json::to_string(&HealthScore::UNAVAILABLE).unwrap(), "null");
        assert_eq!(HealthScore::new(250).value(), Some(100));
        assert_eq!(HealthScore::UNAVAILABLE.to_string(), "unavailable");
    }

    #[test]
    fn test_health_score_deserialization_is_bounded() {
        assert_eq!(
            serde_json::from_str::<HealthScore>("100").unwrap(),
            HealthScore::new(100)
        );
        assert_eq!(
            serde_json::from_str::<HealthScore>("null").unwrap(),
            HealthScore::UNAVAILABLE
        );
        assert!(serde_json::from_str::<HealthScore>("250").is_err());
        assert!(serde_json::from_str::<HealthScore>("-1").is_err());
    }

    #[test]
    fn test_metric_key_serialization() {
        assert_eq!(
            serde_json::to_string(&MetricKey::HoursSinceFeeding).unwrap(),
            "\"hoursSinceFeeding\""
        );
        for key in MetricKey::ALL {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_str()));
        }
    }
}
