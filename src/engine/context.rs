//! Compute Context
//!
//! Explicit inputs that keep `compute` a pure function: the as-of date and
//! the dimension filters shared by every system. Anything ambient (today's
//! date, CLI selections) is resolved at the edge and passed in here.

use crate::catalog::metric::FilterRule;
use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct ComputeContext {
    /// Date used by active-window predicates.
    pub as_of: NaiveDate,
    /// Restrict every system to one quarter, e.g. "Q2".
    pub quarter: Option<String>,
    /// Restrict every system to these regions.
    pub regions: Option<Vec<String>>,
}

impl ComputeContext {
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            quarter: None,
            regions: None,
        }
    }

    pub fn with_quarter(mut self, quarter: impl Into<String>) -> Self {
        self.quarter = Some(quarter.into());
        self
    }

    pub fn with_regions(mut self, regions: Vec<String>) -> Self {
        self.regions = Some(regions);
        self
    }

    /// The dimension filters as ordinary filter rules, applied uniformly to
    /// every system before its own rule runs.
    pub(crate) fn dimension_rules(&self) -> Vec<FilterRule> {
        let mut rules = Vec::new();

        if let Some(quarter) = &self.quarter {
            rules.push(FilterRule::Eq {
                field: "quarter".to_string(),
                value: serde_json::Value::String(quarter.clone()),
            });
        }

        if let Some(regions) = &self.regions {
            rules.push(FilterRule::OneOf {
                field: "region".to_string(),
                values: regions
                    .iter()
                    .map(|r| serde_json::Value::String(r.clone()))
                    .collect(),
            });
        }

        rules
    }
}
