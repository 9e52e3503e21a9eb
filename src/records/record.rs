//! Source Records
//!
//! Typed rows loaded from the per-system CSV files. Rows are immutable once
//! loaded; every computation reads them through field lookups so that a rule
//! referencing an absent column can be reported with full context.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single typed cell value coerced from CSV text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Text(String),
}

impl FieldValue {
    /// Coerce a raw CSV cell into a typed value.
    ///
    /// Empty cells become `Null`; `true`/`false` (any case) become `Bool`;
    /// integers and floats parse numerically; `YYYY-MM-DD` becomes `Date`;
    /// everything else stays `Text`.
    pub fn coerce(cell: &str) -> FieldValue {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return FieldValue::Null;
        }

        if trimmed.eq_ignore_ascii_case("true") {
            return FieldValue::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return FieldValue::Bool(false);
        }

        if let Ok(i) = trimmed.parse::<i64>() {
            return FieldValue::Int(i);
        }

        if let Ok(f) = trimmed.parse::<f64>() {
            return FieldValue::Float(f);
        }

        if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return FieldValue::Date(d);
        }

        FieldValue::Text(trimmed.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Canonical string for use as a join key. Null has no key.
    pub fn key_string(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Bool(b) => Some(b.to_string()),
            FieldValue::Int(i) => Some(i.to_string()),
            FieldValue::Float(f) => Some(f.to_string()),
            FieldValue::Date(d) => Some(d.to_string()),
            FieldValue::Text(s) => Some(s.clone()),
        }
    }
}

/// One row of procurement data belonging to exactly one source system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl SourceRecord {
    pub fn new(fields: BTreeMap<String, FieldValue>) -> Self {
        Self { fields }
    }

    pub fn empty() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    pub fn with(mut self, field: &str, value: FieldValue) -> Self {
        self.fields.insert(field.to_string(), value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// This record's fields plus the other record's fields. On a column
    /// collision this record's value wins.
    pub fn merged_with(&self, other: &SourceRecord) -> SourceRecord {
        let mut fields = self.fields.clone();
        for (key, value) in &other.fields {
            fields.entry(key.clone()).or_insert_with(|| value.clone());
        }
        SourceRecord::new(fields)
    }
}

/// An ordered collection of records for one source system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    system_id: String,
    records: Vec<SourceRecord>,
}

impl RecordSet {
    pub fn new(system_id: String, records: Vec<SourceRecord>) -> Self {
        Self { system_id, records }
    }

    pub fn system_id(&self) -> &str {
        &self.system_id
    }

    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
