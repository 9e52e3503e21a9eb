//! Metric Computation Engine
//!
//! Turns raw per-system rows plus a declarative metric definition into the
//! governed number and each source system's deliberately divergent number.
//! One routine interprets every rule; adding a fourth source system or a
//! fourth metric is a catalog edit, not a code change here.
//!
//! `compute` is a pure function over already-loaded data: no I/O, no shared
//! state, identical results on identical inputs. A failure for one system
//! is reported in the output and never aborts the other systems.

use crate::catalog::metric::{
    FieldRules, FilterRule, GovernedRule, GovernedSource, MetricDefinition, GOVERNED_ID,
};
use crate::engine::context::ComputeContext;
use crate::engine::filter::FilterEval;
use crate::engine::result::{ComputationResult, MetricReport, MetricValue, SkippedSystem};
use crate::engine::value::eval_value;
use crate::error::{MetricError, Result};
use crate::records::loader::SystemData;
use crate::records::record::{FieldValue, SourceRecord};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Compute a metric for every source system named by its definition, plus
/// the governed value when the definition carries a governed rule.
pub fn compute(
    definition: &MetricDefinition,
    data: &SystemData,
    ctx: &ComputeContext,
) -> MetricReport {
    let mut results = BTreeMap::new();
    let mut skipped = Vec::new();

    for (system_id, rule) in &definition.systems {
        let records = match data.get(system_id) {
            Some(set) if !set.is_empty() => set.records(),
            _ => {
                skipped.push(SkippedSystem {
                    system: system_id.clone(),
                    reason: MetricError::NoData {
                        metric: definition.id.clone(),
                        system: system_id.clone(),
                    }
                    .to_string(),
                });
                continue;
            }
        };

        match compute_rule(
            definition,
            system_id,
            &rule.filters,
            &rule.fields,
            rule.narrative.as_deref(),
            records,
            ctx,
        ) {
            Ok(result) => {
                debug!(
                    "metric '{}' system '{}': {} ({} rows in, {} out)",
                    definition.id, system_id, result.value, result.rows_included,
                    result.rows_excluded
                );
                results.insert(system_id.clone(), result);
            }
            Err(err) => skipped.push(SkippedSystem {
                system: system_id.clone(),
                reason: err.to_string(),
            }),
        }
    }

    if let Some(governed) = &definition.governed {
        match compute_governed(definition, governed, data, ctx) {
            Ok(result) => {
                results.insert(GOVERNED_ID.to_string(), result);
            }
            Err(err) => skipped.push(SkippedSystem {
                system: GOVERNED_ID.to_string(),
                reason: err.to_string(),
            }),
        }
    }

    MetricReport {
        metric_id: definition.id.clone(),
        metric_name: definition.name.clone(),
        results,
        skipped,
    }
}

fn compute_governed(
    definition: &MetricDefinition,
    governed: &GovernedRule,
    data: &SystemData,
    ctx: &ComputeContext,
) -> Result<ComputationResult> {
    let rows = governed_rows(definition, governed, data, ctx)?;
    if rows.is_empty() {
        return Err(MetricError::NoData {
            metric: definition.id.clone(),
            system: GOVERNED_ID.to_string(),
        });
    }

    compute_rule(
        definition,
        GOVERNED_ID,
        &governed.filters,
        &governed.fields,
        governed.narrative.as_deref(),
        &rows,
        ctx,
    )
}

/// Materialize the row set the governed rule runs over.
pub(crate) fn governed_rows(
    definition: &MetricDefinition,
    governed: &GovernedRule,
    data: &SystemData,
    ctx: &ComputeContext,
) -> Result<Vec<SourceRecord>> {
    let required = |system_id: &str| {
        data.get(system_id)
            .filter(|set| !set.is_empty())
            .ok_or_else(|| MetricError::NoData {
                metric: definition.id.clone(),
                system: system_id.to_string(),
            })
    };

    match &governed.source {
        GovernedSource::System(system_id) => {
            Ok(required(system_id)?.records().to_vec())
        }
        GovernedSource::Join {
            left,
            right,
            on,
            right_where,
        } => {
            let left_set = required(left)?;
            let right_set = required(right)?;
            let right_eval = FilterEval {
                metric: &definition.id,
                system: right,
                ctx,
            };

            // Dedup the right side by the join key, first match wins.
            let mut by_key: HashMap<String, &SourceRecord> = HashMap::new();
            for record in right_set.records() {
                if !right_eval.matches(record, right_where)? {
                    continue;
                }
                if let Some(key) = record.get(on).and_then(FieldValue::key_string) {
                    by_key.entry(key).or_insert(record);
                }
            }

            let mut rows = Vec::new();
            for record in left_set.records() {
                let Some(key) = record.get(on).and_then(FieldValue::key_string) else {
                    continue;
                };
                if let Some(matched) = by_key.get(&key) {
                    rows.push(record.merged_with(matched));
                }
            }
            Ok(rows)
        }
    }
}

/// Run one rule over one row set. Shared by every system and the governed
/// rule; the caller supplies the filters and field selection as data.
fn compute_rule(
    definition: &MetricDefinition,
    system: &str,
    filters: &[FilterRule],
    fields: &FieldRules,
    narrative: Option<&str>,
    rows: &[SourceRecord],
    ctx: &ComputeContext,
) -> Result<ComputationResult> {
    let eval = FilterEval {
        metric: &definition.id,
        system,
        ctx,
    };

    // Dimension filters restrict every system identically.
    let dimension_rules = ctx.dimension_rules();
    let mut scoped = Vec::new();
    for record in rows {
        if eval.matches(record, &dimension_rules)? {
            scoped.push(record);
        }
    }

    let mut included = Vec::new();
    for record in &scoped {
        if eval.matches(record, filters)? {
            included.push(*record);
        }
    }
    let rows_excluded = scoped.len() - included.len();

    let value = match fields {
        FieldRules::Ratio { numerator } => {
            if included.is_empty() {
                MetricValue::Undefined
            } else {
                let mut hits = 0usize;
                for record in &included {
                    if eval.matches(record, numerator)? {
                        hits += 1;
                    }
                }
                MetricValue::Percent(round2(hits as f64 * 100.0 / included.len() as f64))
            }
        }
        FieldRules::Savings {
            baseline,
            actual,
            quantity,
        } => {
            let mut total = 0.0;
            for record in &included {
                let baseline = eval.numeric(record, baseline)?;
                let actual = eval.numeric(record, actual)?;
                let quantity = eval.numeric(record, quantity)?;
                // A row with any of the three missing as a value (not as a
                // column) contributes nothing.
                if let (Some(b), Some(a), Some(q)) = (baseline, actual, quantity) {
                    total += (b - a) * q;
                }
            }
            MetricValue::Amount(round2(total))
        }
        FieldRules::Aggregate { value } => {
            let mut total = 0.0;
            for record in &included {
                total += eval_value(&eval, record, value)?;
            }
            MetricValue::Amount(round2(total))
        }
    };

    Ok(ComputationResult {
        value,
        rows_included: included.len(),
        rows_excluded,
        narrative: narrative.map(str::to_string),
    })
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(87.499999), 87.5);
        assert_eq!(round2(100.0 / 3.0), 33.33);
    }
}
