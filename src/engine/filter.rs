//! Filter Interpreter
//!
//! Applies catalog filter rules to records. One interpreter serves every
//! system; which rows a system keeps is decided entirely by the rules it
//! brought along from the catalog.

use crate::catalog::metric::FilterRule;
use crate::engine::context::ComputeContext;
use crate::error::{MetricError, Result};
use crate::records::record::{FieldValue, SourceRecord};
use serde_json::Value as JsonValue;

/// Rule evaluation scoped to one metric and system, so that a missing
/// column is reported with full context.
pub(crate) struct FilterEval<'a> {
    pub metric: &'a str,
    pub system: &'a str,
    pub ctx: &'a ComputeContext,
}

impl FilterEval<'_> {
    /// True when the record satisfies every rule.
    pub fn matches(&self, record: &SourceRecord, rules: &[FilterRule]) -> Result<bool> {
        for rule in rules {
            if !self.matches_one(record, rule)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Numeric field access. Absent column is an error; a null or
    /// non-numeric value is None.
    pub fn numeric(&self, record: &SourceRecord, name: &str) -> Result<Option<f64>> {
        Ok(self.field(record, name)?.as_f64())
    }

    pub fn field<'r>(&self, record: &'r SourceRecord, name: &str) -> Result<&'r FieldValue> {
        record.get(name).ok_or_else(|| MetricError::MissingField {
            metric: self.metric.to_string(),
            system: self.system.to_string(),
            field: name.to_string(),
        })
    }

    fn matches_one(&self, record: &SourceRecord, rule: &FilterRule) -> Result<bool> {
        match rule {
            FilterRule::IsTrue { field } => {
                Ok(self.field(record, field)?.as_bool().unwrap_or(false))
            }
            FilterRule::IsFalse { field } => Ok(self
                .field(record, field)?
                .as_bool()
                .map(|b| !b)
                .unwrap_or(false)),
            FilterRule::NotNull { field } => Ok(!self.field(record, field)?.is_null()),
            FilterRule::Eq { field, value } => {
                Ok(literal_matches(self.field(record, field)?, value))
            }
            FilterRule::Ne { field, value } => {
                Ok(!literal_matches(self.field(record, field)?, value))
            }
            FilterRule::OneOf { field, values } => {
                let actual = self.field(record, field)?;
                Ok(values.iter().any(|v| literal_matches(actual, v)))
            }
            FilterRule::Gt { field, value } => {
                Ok(self.numeric(record, field)?.map(|v| v > *value).unwrap_or(false))
            }
            FilterRule::Ge { field, value } => {
                Ok(self.numeric(record, field)?.map(|v| v >= *value).unwrap_or(false))
            }
            FilterRule::Lt { field, value } => {
                Ok(self.numeric(record, field)?.map(|v| v < *value).unwrap_or(false))
            }
            FilterRule::Le { field, value } => {
                Ok(self.numeric(record, field)?.map(|v| v <= *value).unwrap_or(false))
            }
            FilterRule::GtField { field, other } => {
                let a = self.field(record, field)?;
                let b = self.field(record, other)?;
                Ok(match (a.as_f64(), b.as_f64()) {
                    (Some(x), Some(y)) => x > y,
                    _ => match (a.as_date(), b.as_date()) {
                        (Some(x), Some(y)) => x > y,
                        _ => false,
                    },
                })
            }
            FilterRule::WithinWindow { field, start, end } => {
                let d = self.field(record, field)?.as_date();
                let s = self.field(record, start)?.as_date();
                let e = self.field(record, end)?.as_date();
                Ok(matches!((d, s, e), (Some(d), Some(s), Some(e)) if d >= s && d <= e))
            }
            FilterRule::ActiveAsOf { start, end } => {
                let s = self.field(record, start)?.as_date();
                let e = self.field(record, end)?.as_date();
                let as_of = self.ctx.as_of;
                Ok(matches!((s, e), (Some(s), Some(e)) if s <= as_of && as_of <= e))
            }
        }
    }
}

/// Compare a typed cell against a catalog literal.
fn literal_matches(value: &FieldValue, literal: &JsonValue) -> bool {
    match literal {
        JsonValue::Null => value.is_null(),
        JsonValue::Bool(b) => value.as_bool() == Some(*b),
        JsonValue::Number(n) => match (value.as_f64(), n.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        JsonValue::String(s) => match value {
            FieldValue::Text(t) => t == s,
            // Date columns coerce eagerly, so a string literal like
            // "2025-01-01" still compares against them.
            FieldValue::Date(d) => d.to_string() == *s,
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn ctx() -> ComputeContext {
        ComputeContext::new(NaiveDate::from_ymd_opt(2025, 8, 1).unwrap())
    }

    fn eval<'a>(ctx: &'a ComputeContext) -> FilterEval<'a> {
        FilterEval {
            metric: "on_time_delivery_rate",
            system: "vgs",
            ctx,
        }
    }

    fn delivery() -> SourceRecord {
        SourceRecord::empty()
            .with("is_partial_delivery", FieldValue::Bool(false))
            .with("status", FieldValue::Text("RECEIVED".into()))
            .with("volume", FieldValue::Int(50))
            .with("delivery_date", FieldValue::coerce("2025-02-10"))
            .with("agreed_window_start", FieldValue::coerce("2025-02-08"))
            .with("agreed_window_end", FieldValue::coerce("2025-02-12"))
            .with("contract_start", FieldValue::coerce("2025-01-01"))
            .with("contract_end", FieldValue::coerce("2025-12-31"))
    }

    #[test]
    fn test_basic_predicates() {
        let ctx = ctx();
        let eval = eval(&ctx);
        let record = delivery();

        let rules = vec![
            FilterRule::IsFalse {
                field: "is_partial_delivery".into(),
            },
            FilterRule::Eq {
                field: "status".into(),
                value: json!("RECEIVED"),
            },
            FilterRule::Gt {
                field: "volume".into(),
                value: 0.0,
            },
        ];
        assert!(eval.matches(&record, &rules).unwrap());

        let excluded = vec![FilterRule::IsTrue {
            field: "is_partial_delivery".into(),
        }];
        assert!(!eval.matches(&record, &excluded).unwrap());
    }

    #[test]
    fn test_window_and_as_of() {
        let ctx = ctx();
        let eval = eval(&ctx);
        let record = delivery();

        let window = vec![FilterRule::WithinWindow {
            field: "delivery_date".into(),
            start: "agreed_window_start".into(),
            end: "agreed_window_end".into(),
        }];
        assert!(eval.matches(&record, &window).unwrap());

        let active = vec![FilterRule::ActiveAsOf {
            start: "contract_start".into(),
            end: "contract_end".into(),
        }];
        assert!(eval.matches(&record, &active).unwrap());
    }

    #[test]
    fn test_missing_field_carries_context() {
        let ctx = ctx();
        let eval = eval(&ctx);
        let record = delivery();

        let rules = vec![FilterRule::NotNull {
            field: "force_majeure_flag".into(),
        }];
        let err = eval.matches(&record, &rules).unwrap_err();
        match err {
            MetricError::MissingField {
                metric,
                system,
                field,
            } => {
                assert_eq!(metric, "on_time_delivery_rate");
                assert_eq!(system, "vgs");
                assert_eq!(field, "force_majeure_flag");
            }
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_null_comparisons_exclude_rather_than_fail() {
        let ctx = ctx();
        let eval = eval(&ctx);
        let record = delivery().with("prior_contract_price", FieldValue::Null);

        let rules = vec![FilterRule::Gt {
            field: "prior_contract_price".into(),
            value: 0.0,
        }];
        assert!(!eval.matches(&record, &rules).unwrap());
    }
}
