//! Metric catalog
//!
//! Static table of the recognized vital-sign metrics: normal, sustained,
//! warning and critical ranges, unit, scoring weight, check direction and
//! advice text. A catalog is validated once, when it is built; evaluations
//! never re-check it.

use crate::error::ConfigurationError;
use crate::trend::Deviation;
use crate::types::{MetricKey, Severity};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Version tag of the built-in catalog
pub const CATALOG_VERSION: &str = "petpulse.catalog.v1";

/// Allowed drift of the weight sum from 1.0
const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Inclusive numeric interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// True when `value` lies inside the range, edges included
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Distance from `value` to the nearer edge, 0 when inside
    pub fn distance(&self, value: f64) -> f64 {
        if value < self.min {
            self.min - value
        } else if value > self.max {
            value - self.max
        } else {
            0.0
        }
    }

    /// True when `other` lies entirely within this range
    pub fn encloses(&self, other: &Range) -> bool {
        self.min <= other.min && self.max >= other.max
    }

    fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// Which side(s) of a range raise alerts for a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckDirection {
    /// Too low or too high
    Both,
    /// Only too low (e.g. hydration)
    Low,
    /// Only too high (e.g. time since feeding)
    High,
}

impl CheckDirection {
    /// Deviations this direction watches for
    pub fn deviations(&self) -> &'static [Deviation] {
        match self {
            CheckDirection::Both => &[Deviation::High, Deviation::Low],
            CheckDirection::Low => &[Deviation::Low],
            CheckDirection::High => &[Deviation::High],
        }
    }

    /// True when `value` falls outside `range` on a watched side
    pub fn breaches(&self, range: &Range, value: f64) -> bool {
        self.deviations()
            .iter()
            .any(|deviation| deviation.exceeds(value, range))
    }
}

/// Fixed advice text per severity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricAdvice {
    pub warning: String,
    pub critical: String,
}

/// Definition of one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub key: MetricKey,
    pub unit: String,
    /// No score penalty inside this range
    pub normal_range: Range,
    /// Secondary threshold for sustained-trend alerts; defaults to the normal range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sustained_range: Option<Range>,
    pub warning_range: Range,
    pub critical_range: Range,
    pub check: CheckDirection,
    pub score_weight: f64,
    pub advice: MetricAdvice,
}

impl MetricDefinition {
    /// Effective sustained-trend range
    pub fn sustained(&self) -> Range {
        self.sustained_range.unwrap_or(self.normal_range)
    }

    pub fn advice_for(&self, severity: Severity) -> &str {
        match severity {
            Severity::Warning => &self.advice.warning,
            Severity::Critical => &self.advice.critical,
        }
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        let sustained = self.sustained();
        let tiers = [
            ("normal", &self.normal_range),
            ("sustained", &sustained),
            ("warning", &self.warning_range),
            ("critical", &self.critical_range),
        ];

        for (tier, range) in tiers {
            if !range.is_valid() {
                return Err(ConfigurationError::InvalidRange {
                    key: self.key,
                    tier,
                    min: range.min,
                    max: range.max,
                });
            }
        }

        for pair in tiers.windows(2) {
            let (inner, inner_range) = pair[0];
            let (outer, outer_range) = pair[1];
            if !outer_range.encloses(inner_range) {
                return Err(ConfigurationError::TierNesting {
                    key: self.key,
                    inner,
                    outer,
                });
            }
        }

        if !self.score_weight.is_finite() || self.score_weight < 0.0 {
            return Err(ConfigurationError::InvalidWeight {
                key: self.key,
                weight: self.score_weight,
            });
        }

        Ok(())
    }
}

/// Validated, ordered set of metric definitions.
///
/// Declaration order is significant: it breaks ties between alerts of the
/// same severity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCatalog {
    version: String,
    metrics: Vec<MetricDefinition>,
}

#[derive(Deserialize)]
struct CatalogConfig {
    #[serde(default = "default_version")]
    version: String,
    metrics: Vec<MetricDefinition>,
}

fn default_version() -> String {
    CATALOG_VERSION.to_string()
}

impl Default for MetricCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl MetricCatalog {
    /// Build a catalog, rejecting inconsistent definitions
    pub fn new(
        version: impl Into<String>,
        metrics: Vec<MetricDefinition>,
    ) -> Result<Self, ConfigurationError> {
        let catalog = Self {
            version: version.into(),
            metrics,
        };

        if let Err(e) = catalog.validate() {
            tracing::warn!(version = %catalog.version, error = %e, "rejected metric catalog");
            return Err(e);
        }

        Ok(catalog)
    }

    /// Load and validate a catalog from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        let config: CatalogConfig = serde_json::from_str(json)?;
        Self::new(config.version, config.metrics)
    }

    /// Serialize the catalog to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Definitions in declaration order
    pub fn definitions(&self) -> &[MetricDefinition] {
        &self.metrics
    }

    pub fn get(&self, key: MetricKey) -> Option<&MetricDefinition> {
        self.metrics.iter().find(|def| def.key == key)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Sum of all metric weights
    pub fn total_weight(&self) -> f64 {
        self.metrics.iter().map(|def| def.score_weight).sum()
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.metrics.is_empty() {
            return Err(ConfigurationError::EmptyCatalog);
        }

        let mut seen = HashSet::new();
        for def in &self.metrics {
            if !seen.insert(def.key) {
                return Err(ConfigurationError::DuplicateMetric(def.key));
            }
            def.validate()?;
        }

        let total = self.total_weight();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigurationError::WeightSum(total));
        }

        Ok(())
    }

    /// The built-in catalog.
    ///
    /// Sleep duration is expressed in minutes and the feeding interval in
    /// hours.
    pub fn standard() -> Self {
        Self {
            version: CATALOG_VERSION.to_string(),
            metrics: standard_definitions(),
        }
    }
}

fn definition(
    key: MetricKey,
    unit: &str,
    ranges: [(f64, f64); 3],
    check: CheckDirection,
    score_weight: f64,
    warning: &str,
    critical: &str,
) -> MetricDefinition {
    let [normal, warning_range, critical_range] = ranges;
    MetricDefinition {
        key,
        unit: unit.to_string(),
        normal_range: Range::new(normal.0, normal.1),
        sustained_range: None,
        warning_range: Range::new(warning_range.0, warning_range.1),
        critical_range: Range::new(critical_range.0, critical_range.1),
        check,
        score_weight,
        advice: MetricAdvice {
            warning: warning.to_string(),
            critical: critical.to_string(),
        },
    }
}

fn standard_definitions() -> Vec<MetricDefinition> {
    vec![
        definition(
            MetricKey::HeartRate,
            "bpm",
            [(60.0, 120.0), (55.0, 125.0), (45.0, 130.0)],
            CheckDirection::Both,
            0.25,
            "Let your pet rest in a calm place and recheck the heart rate in 15 minutes.",
            "Heart rate is far outside the safe range. Contact your veterinarian immediately.",
        ),
        definition(
            MetricKey::Temperature,
            "°C",
            [(37.5, 39.5), (37.0, 40.0), (36.0, 41.0)],
            CheckDirection::Both,
            0.25,
            "Move your pet to a comfortable environment and monitor the temperature closely.",
            "Body temperature is dangerous. Seek veterinary care right away.",
        ),
        definition(
            MetricKey::RespiratoryRate,
            "breaths/min",
            [(10.0, 30.0), (8.0, 35.0), (6.0, 40.0)],
            CheckDirection::Both,
            0.15,
            "Watch for labored breathing and keep your pet calm and cool.",
            "Breathing rate is abnormal. Contact your veterinarian immediately.",
        ),
        definition(
            MetricKey::ActivityLevel,
            "",
            [(2.0, 8.0), (1.0, 9.0), (0.0, 10.0)],
            CheckDirection::Both,
            0.10,
            "Activity is unusual. Check for signs of pain, lethargy or restlessness.",
            "Activity is extreme. Check on your pet now and consult your veterinarian.",
        ),
        definition(
            MetricKey::HydrationLevel,
            "%",
            [(60.0, 100.0), (50.0, 100.0), (40.0, 100.0)],
            CheckDirection::Low,
            0.10,
            "Offer fresh water and encourage your pet to drink.",
            "Your pet may be severely dehydrated. Seek veterinary care promptly.",
        ),
        definition(
            MetricKey::SleepDuration,
            "min",
            [(720.0, 840.0), (600.0, 960.0), (480.0, 1080.0)],
            CheckDirection::Both,
            0.10,
            "Sleep duration is unusual. Keep an eye on your pet's routine and energy.",
            "Sleep duration is far from normal. Consult your veterinarian.",
        ),
        definition(
            MetricKey::HoursSinceFeeding,
            "h",
            [(0.0, 8.0), (0.0, 12.0), (0.0, 24.0)],
            CheckDirection::High,
            0.05,
            "It has been a while since the last meal. Offer food on schedule.",
            "Your pet has not eaten for a long time. Offer food and consult your veterinarian if it refuses.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_json(weight: f64) -> String {
        format!(
            r#"{{
                "version": "test.v1",
                "metrics": [{{
                    "key": "heartRate",
                    "unit": "bpm",
                    "normal_range": {{ "min": 60.0, "max": 120.0 }},
                    "warning_range": {{ "min": 55.0, "max": 125.0 }},
                    "critical_range": {{ "min": 45.0, "max": 130.0 }},
                    "check": "both",
                    "score_weight": {weight},
                    "advice": {{ "warning": "rest", "critical": "call the vet" }}
                }}]
            }}"#
        )
    }

    #[test]
    fn test_standard_catalog_is_valid() {
        let standard = MetricCatalog::standard();
        let rebuilt = MetricCatalog::new(CATALOG_VERSION, standard.definitions().to_vec());

        assert!(rebuilt.is_ok());
        assert_eq!(standard.len(), MetricKey::ALL.len());
        assert!((standard.total_weight() - 1.0).abs() < WEIGHT_TOLERANCE);
    }

    #[test]
    fn test_standard_catalog_declaration_order() {
        let keys: Vec<MetricKey> = MetricCatalog::standard()
            .definitions()
            .iter()
            .map(|def| def.key)
            .collect();
        assert_eq!(keys, MetricKey::ALL.to_vec());
    }

    #[test]
    fn test_from_json() {
        let catalog = MetricCatalog::from_json(&catalog_json(1.0)).unwrap();
        assert_eq!(catalog.version(), "test.v1");
        let def = catalog.get(MetricKey::HeartRate).unwrap();
        assert_eq!(def.sustained(), def.normal_range);
        assert!(catalog.get(MetricKey::Temperature).is_none());
    }

    #[test]
    fn test_json_round_trip_of_standard() {
        let json = MetricCatalog::standard().to_json().unwrap();
        let loaded = MetricCatalog::from_json(&json).unwrap();
        assert_eq!(loaded, MetricCatalog::standard());
    }

    #[test]
    fn test_rejects_weight_sum() {
        let result = MetricCatalog::from_json(&catalog_json(0.8));
        assert!(matches!(result, Err(ConfigurationError::WeightSum(_))));
    }

    #[test]
    fn test_rejects_negative_weight() {
        let mut metrics = MetricCatalog::standard().definitions().to_vec();
        metrics[0].score_weight = -0.25;
        metrics[1].score_weight = 0.75;

        let result = MetricCatalog::new("bad", metrics);
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidWeight {
                key: MetricKey::HeartRate,
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_critical_narrower_than_warning() {
        let mut metrics = MetricCatalog::standard().definitions().to_vec();
        metrics[1].critical_range = Range::new(37.2, 39.8);

        let result = MetricCatalog::new("bad", metrics);
        assert!(matches!(
            result,
            Err(ConfigurationError::TierNesting {
                key: MetricKey::Temperature,
                inner: "warning",
                outer: "critical",
            })
        ));
    }

    #[test]
    fn test_rejects_sustained_outside_warning() {
        let mut metrics = MetricCatalog::standard().definitions().to_vec();
        metrics[0].sustained_range = Some(Range::new(50.0, 120.0));

        let result = MetricCatalog::new("bad", metrics);
        assert!(matches!(
            result,
            Err(ConfigurationError::TierNesting {
                inner: "sustained",
                outer: "warning",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_inverted_range() {
        let mut metrics = MetricCatalog::standard().definitions().to_vec();
        metrics[2].normal_range = Range::new(30.0, 10.0);

        let result = MetricCatalog::new("bad", metrics);
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidRange {
                key: MetricKey::RespiratoryRate,
                tier: "normal",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        let mut metrics = MetricCatalog::standard().definitions().to_vec();
        metrics.push(metrics[0].clone());
        assert!(matches!(
            MetricCatalog::new("dup", metrics),
            Err(ConfigurationError::DuplicateMetric(MetricKey::HeartRate))
        ));

        assert!(matches!(
            MetricCatalog::new("empty", Vec::new()),
            Err(ConfigurationError::EmptyCatalog)
        ));
    }

    #[test]
    fn test_rejects_invalid_json() {
        assert!(matches!(
            MetricCatalog::from_json("{ not json"),
            Err(ConfigurationError::Json(_))
        ));
    }

    #[test]
    fn test_range_distance() {
        let range = Range::new(60.0, 120.0);
        assert_eq!(range.distance(80.0), 0.0);
        assert_eq!(range.distance(60.0), 0.0);
        assert_eq!(range.distance(120.0), 0.0);
        assert_eq!(range.distance(135.0), 15.0);
        assert_eq!(range.distance(50.0), 10.0);
    }

    #[test]
    fn test_check_direction_breaches() {
        let range = Range::new(50.0, 100.0);
        assert!(CheckDirection::Low.breaches(&range, 45.0));
        assert!(!CheckDirection::Low.breaches(&range, 105.0));
        assert!(CheckDirection::High.breaches(&range, 105.0));
        assert!(!CheckDirection::High.breaches(&range, 45.0));
        assert!(CheckDirection::Both.breaches(&range, 45.0));
        assert!(CheckDirection::Both.breaches(&range, 105.0));
        assert!(!CheckDirection::Both.breaches(&range, 75.0));
    }
}
