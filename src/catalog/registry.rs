//! Metric Catalog
//!
//! Id-keyed, read-only registry of metric definitions. Loaded once at
//! startup and passed around as an immutable value.

use crate::catalog::metric::MetricDefinition;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct MetricCatalog {
    metrics: Vec<MetricDefinition>,
    by_id: HashMap<String, usize>,
}

impl MetricCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition, preserving catalog order. Returns false when
    /// the id is already taken.
    pub(crate) fn insert(&mut self, definition: MetricDefinition) -> bool {
        if self.by_id.contains_key(&definition.id) {
            return false;
        }
        self.by_id
            .insert(definition.id.clone(), self.metrics.len());
        self.metrics.push(definition);
        true
    }

    /// Lookup by id, exact match first, then case-insensitive.
    pub fn metric(&self, id: &str) -> Option<&MetricDefinition> {
        if let Some(idx) = self.by_id.get(id) {
            return self.metrics.get(*idx);
        }

        self.metrics
            .iter()
            .find(|m| m.id.eq_ignore_ascii_case(id))
    }

    pub fn list_metrics(&self) -> Vec<&str> {
        self.metrics.iter().map(|m| m.id.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricDefinition> {
        self.metrics.iter()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}
