//! Metric Definitions
//!
//! The in-memory model of the governed metric catalog. Each definition is a
//! declarative description of one metric: its formula family plus one rule
//! per source system and an optional governed rule. The engine interprets
//! these rules uniformly, so the divergence between systems lives entirely
//! in catalog data, never in per-system code branches.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Reserved result key for the governed value.
pub const GOVERNED_ID: &str = "governed";

/// Formula family for a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaFamily {
    /// Numerator count over denominator count, as a percentage.
    Ratio,
    /// Sum of (baseline - actual) x quantity over included rows.
    Savings,
    /// Sum of a selected value expression over included rows.
    AggregateValue,
}

impl FormulaFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormulaFamily::Ratio => "ratio",
            FormulaFamily::Savings => "savings",
            FormulaFamily::AggregateValue => "aggregate_value",
        }
    }
}

/// A single filter predicate, interpreted uniformly by the engine.
///
/// Rules within a list are ANDed. Comparisons against a null or mistyped
/// value exclude the row; only a column that is absent from the record
/// altogether raises a data error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FilterRule {
    IsTrue { field: String },
    IsFalse { field: String },
    NotNull { field: String },
    Eq { field: String, value: serde_json::Value },
    Ne { field: String, value: serde_json::Value },
    OneOf { field: String, values: Vec<serde_json::Value> },
    Gt { field: String, value: f64 },
    Ge { field: String, value: f64 },
    Lt { field: String, value: f64 },
    Le { field: String, value: f64 },
    /// Field strictly greater than another field, numeric or date.
    GtField { field: String, other: String },
    /// Date field inside the window spanned by two other date fields.
    WithinWindow {
        field: String,
        start: String,
        end: String,
    },
    /// The as-of date falls inside the window spanned by two date fields.
    ActiveAsOf { start: String, end: String },
}

impl FilterRule {
    /// Columns this rule reads.
    pub fn referenced_fields(&self) -> Vec<&str> {
        match self {
            FilterRule::IsTrue { field }
            | FilterRule::IsFalse { field }
            | FilterRule::NotNull { field }
            | FilterRule::Eq { field, .. }
            | FilterRule::Ne { field, .. }
            | FilterRule::OneOf { field, .. }
            | FilterRule::Gt { field, .. }
            | FilterRule::Ge { field, .. }
            | FilterRule::Lt { field, .. }
            | FilterRule::Le { field, .. } => vec![field],
            FilterRule::GtField { field, other } => vec![field, other],
            FilterRule::WithinWindow { field, start, end } => vec![field, start, end],
            FilterRule::ActiveAsOf { start, end } => vec![start, end],
        }
    }

    /// Short human-readable description for reports and lineage labels.
    pub fn describe(&self) -> String {
        match self {
            FilterRule::IsTrue { field } => format!("{} is true", field),
            FilterRule::IsFalse { field } => format!("{} is false", field),
            FilterRule::NotNull { field } => format!("{} is present", field),
            FilterRule::Eq { field, value } => format!("{} = {}", field, literal(value)),
            FilterRule::Ne { field, value } => format!("{} != {}", field, literal(value)),
            FilterRule::OneOf { field, values } => {
                format!("{} in [{}]", field, values.iter().map(literal).join(", "))
            }
            FilterRule::Gt { field, value } => format!("{} > {}", field, value),
            FilterRule::Ge { field, value } => format!("{} >= {}", field, value),
            FilterRule::Lt { field, value } => format!("{} < {}", field, value),
            FilterRule::Le { field, value } => format!("{} <= {}", field, value),
            FilterRule::GtField { field, other } => format!("{} > {}", field, other),
            FilterRule::WithinWindow { field, start, end } => {
                format!("{} within [{}, {}]", field, start, end)
            }
            FilterRule::ActiveAsOf { start, end } => {
                format!("as-of date within [{}, {}]", start, end)
            }
        }
    }
}

fn literal(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Value selection for aggregate-value metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueExpr {
    Column(String),
    Add { add: Vec<ValueExpr> },
}

impl ValueExpr {
    pub fn referenced_fields(&self) -> Vec<&str> {
        match self {
            ValueExpr::Column(name) => vec![name],
            ValueExpr::Add { add } => add.iter().flat_map(|e| e.referenced_fields()).collect(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ValueExpr::Column(name) => name.clone(),
            ValueExpr::Add { add } => {
                format!("({})", add.iter().map(|e| e.describe()).join(" + "))
            }
        }
    }
}

/// Family-specific field selection rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRules {
    Ratio { numerator: Vec<FilterRule> },
    Savings {
        baseline: String,
        actual: String,
        quantity: String,
    },
    Aggregate { value: ValueExpr },
}

impl FieldRules {
    pub fn family(&self) -> FormulaFamily {
        match self {
            FieldRules::Ratio { .. } => FormulaFamily::Ratio,
            FieldRules::Savings { .. } => FormulaFamily::Savings,
            FieldRules::Aggregate { .. } => FormulaFamily::AggregateValue,
        }
    }

    pub fn referenced_fields(&self) -> Vec<&str> {
        match self {
            FieldRules::Ratio { numerator } => numerator
                .iter()
                .flat_map(|r| r.referenced_fields())
                .collect(),
            FieldRules::Savings {
                baseline,
                actual,
                quantity,
            } => vec![baseline, actual, quantity],
            FieldRules::Aggregate { value } => value.referenced_fields(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            FieldRules::Ratio { numerator } => format!(
                "share of rows where {}",
                numerator.iter().map(|r| r.describe()).join(" and ")
            ),
            FieldRules::Savings {
                baseline,
                actual,
                quantity,
            } => format!("sum of ({} - {}) x {}", baseline, actual, quantity),
            FieldRules::Aggregate { value } => format!("sum of {}", value.describe()),
        }
    }
}

/// One source system's divergent rule for a metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemRule {
    /// Display label, e.g. "SI+" for system id `si`.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub filters: Vec<FilterRule>,
    pub fields: FieldRules,
    #[serde(default)]
    pub narrative: Option<String>,
}

impl SystemRule {
    /// Every column this rule reads, filters first, without duplicates.
    pub fn referenced_fields(&self) -> Vec<&str> {
        self.filters
            .iter()
            .flat_map(|r| r.referenced_fields())
            .chain(self.fields.referenced_fields())
            .unique()
            .collect()
    }
}

/// Where the governed rule draws its rows from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernedSource {
    /// A single system's record set.
    System(String),
    /// An inner join of two systems' record sets on a key column. The right
    /// side is filtered by `right_where`, then deduplicated by the key, then
    /// joined column-wise onto each left row (left columns win).
    Join {
        left: String,
        right: String,
        on: String,
        #[serde(default)]
        right_where: Vec<FilterRule>,
    },
}

impl GovernedSource {
    /// Source systems feeding the governed rule.
    pub fn system_ids(&self) -> Vec<&str> {
        match self {
            GovernedSource::System(id) => vec![id],
            GovernedSource::Join { left, right, .. } => vec![left, right],
        }
    }
}

/// The canonical, catalog-defined computation for a metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernedRule {
    pub source: GovernedSource,
    #[serde(default)]
    pub filters: Vec<FilterRule>,
    pub fields: FieldRules,
    #[serde(default)]
    pub narrative: Option<String>,
}

/// A governed metric definition. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDefinition {
    pub id: String,
    pub name: String,
    /// Canonical formula description, free text.
    pub formula: String,
    pub family: FormulaFamily,
    /// Per-system override rules, in catalog order.
    pub systems: Vec<(String, SystemRule)>,
    pub governed: Option<GovernedRule>,
    /// Grouping key for per-entity drill-down, e.g. `supplier_id`.
    pub entity_key: Option<String>,
    pub narrative: Option<String>,
}

impl MetricDefinition {
    pub fn system_rule(&self, system_id: &str) -> Option<&SystemRule> {
        self.systems
            .iter()
            .find(|(id, _)| id == system_id)
            .map(|(_, rule)| rule)
    }

    pub fn system_ids(&self) -> impl Iterator<Item = &str> {
        self.systems.iter().map(|(id, _)| id.as_str())
    }

    /// Display label for a system, falling back to the id.
    pub fn system_label<'a>(&'a self, system_id: &'a str) -> &'a str {
        self.system_rule(system_id)
            .and_then(|rule| rule.label.as_deref())
            .unwrap_or(system_id)
    }
}
