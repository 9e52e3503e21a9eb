//! Supplier Flags
//!
//! Per-entity drill-down of a ratio metric under its governed rule: group
//! the governed row set by the definition's entity key and report the
//! entities whose rate falls below a review threshold.

use crate::catalog::metric::{FieldRules, MetricDefinition, GOVERNED_ID};
use crate::engine::compute::governed_rows;
use crate::engine::context::ComputeContext;
use crate::engine::filter::FilterEval;
use crate::error::{MetricError, Result};
use crate::records::loader::SystemData;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entity's governed rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRate {
    pub entity: String,
    /// Percent, 0..100.
    pub rate: f64,
    pub rows: usize,
}

/// Entities flagged for review under a threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierFlags {
    pub metric_id: String,
    pub threshold: f64,
    /// Entities evaluated after filtering.
    pub evaluated: usize,
    /// Entities below the threshold, ordered by id.
    pub flagged: Vec<EntityRate>,
}

pub fn flag_suppliers(
    definition: &MetricDefinition,
    data: &SystemData,
    threshold: f64,
    ctx: &ComputeContext,
) -> Result<SupplierFlags> {
    let governed = definition.governed.as_ref().ok_or_else(|| {
        MetricError::Configuration {
            metric: definition.id.clone(),
            detail: "supplier flags require a governed rule".to_string(),
        }
    })?;

    let FieldRules::Ratio { numerator } = &governed.fields else {
        return Err(MetricError::Configuration {
            metric: definition.id.clone(),
            detail: "supplier flags apply to ratio metrics only".to_string(),
        });
    };

    let entity_key = definition.entity_key.as_deref().ok_or_else(|| {
        MetricError::Configuration {
            metric: definition.id.clone(),
            detail: "missing required field 'entity_key'".to_string(),
        }
    })?;

    let rows = governed_rows(definition, governed, data, ctx)?;
    let eval = FilterEval {
        metric: &definition.id,
        system: GOVERNED_ID,
        ctx,
    };

    let dimension_rules = ctx.dimension_rules();
    let mut included = Vec::new();
    for record in &rows {
        if eval.matches(record, &dimension_rules)? && eval.matches(record, &governed.filters)? {
            included.push(record);
        }
    }

    let groups = included
        .into_iter()
        .map(|record| {
            let key = record
                .get(entity_key)
                .ok_or_else(|| MetricError::MissingField {
                    metric: definition.id.clone(),
                    system: GOVERNED_ID.to_string(),
                    field: entity_key.to_string(),
                })?
                .key_string();
            Ok((key, record))
        })
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .filter_map(|(key, record)| key.map(|k| (k, record)))
        .into_group_map();

    // BTreeMap for a stable report order.
    let mut rates: BTreeMap<String, EntityRate> = BTreeMap::new();
    for (entity, records) in groups {
        let mut hits = 0usize;
        for record in &records {
            if eval.matches(record, numerator)? {
                hits += 1;
            }
        }
        let rate = hits as f64 * 100.0 / records.len() as f64;
        rates.insert(
            entity.clone(),
            EntityRate {
                entity,
                rate: (rate * 100.0).round() / 100.0,
                rows: records.len(),
            },
        );
    }

    let evaluated = rates.len();
    let flagged = rates
        .into_values()
        .filter(|r| r.rate < threshold)
        .collect();

    Ok(SupplierFlags {
        metric_id: definition.id.clone(),
        threshold,
        evaluated,
        flagged,
    })
}
