//! Catalog Loader
//!
//! Parses the YAML metric catalog into the in-memory registry. Entries are
//! validated on the way in: an entry must carry an id and at least one
//! per-system rule, and every rule's field selection must match the entry's
//! formula family. A rejected entry names the metric and the offending
//! field so the catalog author can fix the document.

use crate::catalog::metric::{
    FieldRules, FormulaFamily, GovernedRule, MetricDefinition, SystemRule,
};
use crate::catalog::registry::MetricCatalog;
use crate::error::{MetricError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// YAML representation of the catalog document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogYaml {
    pub metrics: Vec<MetricYaml>,
}

/// YAML representation of one metric entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricYaml {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub formula: Option<String>,
    pub family: String, // "ratio", "savings", "aggregate_value"
    #[serde(default)]
    pub systems: Vec<SystemRuleYaml>,
    #[serde(default)]
    pub governed: Option<GovernedRule>,
    #[serde(default)]
    pub entity_key: Option<String>,
    #[serde(default)]
    pub narrative: Option<String>,
}

/// YAML representation of one per-system rule. A list entry rather than a
/// mapping so the document's system order survives the load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemRuleYaml {
    #[serde(default)]
    pub system: Option<String>,
    #[serde(flatten)]
    pub rule: SystemRule,
}

/// Load a metric catalog from YAML text.
pub fn load_from_yaml(text: &str) -> Result<MetricCatalog> {
    let doc: CatalogYaml = serde_yaml::from_str(text)?;

    let mut catalog = MetricCatalog::new();
    for entry in doc.metrics {
        let definition = convert_entry(entry)?;
        let id = definition.id.clone();
        if !catalog.insert(definition) {
            return Err(MetricError::Configuration {
                metric: id,
                detail: "duplicate metric id".to_string(),
            });
        }
    }

    Ok(catalog)
}

/// Load a metric catalog from a YAML file.
pub fn load_from_file(path: &Path) -> Result<MetricCatalog> {
    let contents = std::fs::read_to_string(path)?;
    let catalog = load_from_yaml(&contents)?;
    info!(
        "loaded {} metric definitions from {}",
        catalog.len(),
        path.display()
    );
    Ok(catalog)
}

fn convert_entry(entry: MetricYaml) -> Result<MetricDefinition> {
    let id = match entry.id {
        Some(id) if !id.trim().is_empty() => id,
        _ => {
            return Err(MetricError::Configuration {
                metric: entry.name.unwrap_or_else(|| "<unnamed>".to_string()),
                detail: "missing required field 'id'".to_string(),
            })
        }
    };

    let family = match entry.family.as_str() {
        "ratio" => FormulaFamily::Ratio,
        "savings" => FormulaFamily::Savings,
        "aggregate_value" => FormulaFamily::AggregateValue,
        other => {
            return Err(MetricError::Configuration {
                metric: id,
                detail: format!("unknown formula family: {}", other),
            })
        }
    };

    if entry.systems.is_empty() {
        return Err(MetricError::Configuration {
            metric: id,
            detail: "missing required field 'systems': at least one per-system rule is required"
                .to_string(),
        });
    }

    let mut systems: Vec<(String, SystemRule)> = Vec::with_capacity(entry.systems.len());
    for system_entry in entry.systems {
        let system_id = match system_entry.system {
            Some(sys) if !sys.trim().is_empty() => sys,
            _ => {
                return Err(MetricError::Configuration {
                    metric: id,
                    detail: "missing required field 'system' in a per-system rule".to_string(),
                })
            }
        };

        if systems.iter().any(|(existing, _)| *existing == system_id) {
            return Err(MetricError::Configuration {
                metric: id,
                detail: format!("duplicate rule for system '{}'", system_id),
            });
        }

        check_family(&id, &system_id, family, &system_entry.rule.fields)?;
        systems.push((system_id, system_entry.rule));
    }

    if let Some(governed) = &entry.governed {
        check_family(&id, "governed", family, &governed.fields)?;
    }

    Ok(MetricDefinition {
        name: entry.name.unwrap_or_else(|| id.clone()),
        formula: entry.formula.unwrap_or_default(),
        family,
        systems,
        governed: entry.governed,
        entity_key: entry.entity_key,
        narrative: entry.narrative,
        id,
    })
}

fn check_family(
    metric: &str,
    system: &str,
    family: FormulaFamily,
    fields: &FieldRules,
) -> Result<()> {
    if fields.family() != family {
        return Err(MetricError::Configuration {
            metric: metric.to_string(),
            detail: format!(
                "system '{}' declares {} field rules but the metric family is {}",
                system,
                fields.family().as_str(),
                family.as_str()
            ),
        });
    }
    Ok(())
}
