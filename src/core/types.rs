//! Core value types that flow out of validator hooks.
//!
//! The metric payload uses an enum-based approach rather than an open
//! dynamic type: validators report a finite set of value shapes, serde
//! handles enums natively, and exhaustive matching keeps consumers honest.
//! The engine itself never interprets these values.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A metric value reported by a validator.
///
/// Covers the payload shapes validators actually emit: strings, numbers,
/// booleans, and nested mappings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum MetricValue {
    /// UTF-8 string
    String(String),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point number
    Float(f64),
    /// Boolean value
    Boolean(bool),
    /// Nested key-value mapping
    Map(MetricMap),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::String(s) => write!(f, "{}", s),
            MetricValue::Integer(i) => write!(f, "{}", i),
            MetricValue::Float(x) => write!(f, "{}", x),
            MetricValue::Boolean(b) => write!(f, "{}", b),
            MetricValue::Map(m) => write!(f, "<map of {} entries>", m.len()),
        }
    }
}

impl From<&str> for MetricValue {
    fn from(s: &str) -> Self {
        MetricValue::String(s.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(s: String) -> Self {
        MetricValue::String(s)
    }
}

impl From<i64> for MetricValue {
    fn from(i: i64) -> Self {
        MetricValue::Integer(i)
    }
}

impl From<f64> for MetricValue {
    fn from(x: f64) -> Self {
        MetricValue::Float(x)
    }
}

impl From<bool> for MetricValue {
    fn from(b: bool) -> Self {
        MetricValue::Boolean(b)
    }
}

/// Free-form metric mapping carried on outcomes and configurations.
pub type MetricMap = HashMap<String, MetricValue>;

/// Validator-defined configuration record.
///
/// Opaque to the engine: it is handed to the validator at construction
/// time by the caller (e.g. a data-source filename and a batch size) and
/// never opened by the engine itself.
pub type ValidatorConfig = MetricMap;

/// The verdict produced by one validator for one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationOutcome {
    /// Whether the validated behavior matched expectations.
    pub is_validation_success: bool,
    /// Free-form metric payload, used only for reporting.
    pub validation_data: MetricMap,
}

impl ValidationOutcome {
    /// A passing outcome with no metric payload.
    pub fn success() -> Self {
        Self {
            is_validation_success: true,
            validation_data: MetricMap::new(),
        }
    }

    /// A failing outcome with no metric payload.
    pub fn failure() -> Self {
        Self {
            is_validation_success: false,
            validation_data: MetricMap::new(),
        }
    }

    /// Attach a metric value to this outcome.
    pub fn with_metric(mut self, key: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        self.validation_data.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_builders() {
        let outcome = ValidationOutcome::failure()
            .with_metric("observed", 12i64)
            .with_metric("expected", 20i64);

        assert!(!outcome.is_validation_success);
        assert_eq!(
            outcome.validation_data.get("observed"),
            Some(&MetricValue::Integer(12))
        );
    }

    #[test]
    fn test_metric_value_serde_roundtrip() {
        let mut inner = MetricMap::new();
        inner.insert("rate".to_string(), MetricValue::Float(0.5));
        let value = MetricValue::Map(inner);

        let json = serde_json::to_string(&value).unwrap();
        let back: MetricValue = serde_json::from_str(&json).unwrap();
        assert_eq!(value, back);
    }

    #[test]
    fn test_metric_value_from_impls() {
        assert_eq!(MetricValue::from("ok"), MetricValue::String("ok".into()));
        assert_eq!(MetricValue::from(true), MetricValue::Boolean(true));
    }
}
