//! Computation Results
//!
//! What a single `compute` call hands back to its consumers: one result per
//! system that could be computed, plus the systems that could not, with the
//! reason. A zero-denominator ratio is a value in its own right, never an
//! error and never a silent zero.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A computed metric value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MetricValue {
    /// Ratio metrics, already scaled to 0..100.
    Percent(f64),
    /// Currency metrics.
    Amount(f64),
    /// A ratio whose denominator was zero after filtering.
    Undefined,
}

impl MetricValue {
    pub fn is_defined(&self) -> bool {
        !matches!(self, MetricValue::Undefined)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Percent(v) | MetricValue::Amount(v) => Some(*v),
            MetricValue::Undefined => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Percent(v) => write!(f, "{:.2}%", v),
            MetricValue::Amount(v) => write!(f, "${:.2}", v),
            MetricValue::Undefined => write!(f, "undefined (zero denominator)"),
        }
    }
}

/// Result of computing one metric for one system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationResult {
    pub value: MetricValue,
    /// Rows that survived the system's filters and fed the value.
    pub rows_included: usize,
    /// Rows the system's filters dropped.
    pub rows_excluded: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

/// Why a system's result is absent from a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSystem {
    pub system: String,
    pub reason: String,
}

/// Everything a consumer needs for one metric: the per-system values, the
/// governed value under the `governed` key, and the systems that were
/// skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReport {
    pub metric_id: String,
    pub metric_name: String,
    pub results: BTreeMap<String, ComputationResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedSystem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(MetricValue::Percent(87.5).to_string(), "87.50%");
        assert_eq!(MetricValue::Amount(1500.0).to_string(), "$1500.00");
        assert_eq!(
            MetricValue::Undefined.to_string(),
            "undefined (zero denominator)"
        );
        assert!(!MetricValue::Undefined.is_defined());
    }
}
