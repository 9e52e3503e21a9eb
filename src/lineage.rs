//! Lineage Graphs
//!
//! Derives a directed lineage description from a metric definition: source
//! system nodes feed the fields their rule reads, the fields feed the
//! filter step, the filter feeds the calculation, and every computed value
//! feeds the governed metric. Consumers render the graph however they
//! like; `to_dot` is provided for Graphviz-based ones.

use crate::catalog::metric::{FieldRules, FilterRule, MetricDefinition, GOVERNED_ID};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    SourceSystem,
    Field,
    Filter,
    Calculation,
    Metric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageEdge {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineageGraph {
    pub nodes: Vec<LineageNode>,
    pub edges: Vec<LineageEdge>,
}

impl LineageGraph {
    fn ensure_node(&mut self, id: &str, label: &str, kind: NodeKind) {
        if self.nodes.iter().any(|n| n.id == id) {
            return;
        }
        self.nodes.push(LineageNode {
            id: id.to_string(),
            label: label.to_string(),
            kind,
        });
    }

    fn add_edge(&mut self, from: &str, to: &str) {
        if self
            .edges
            .iter()
            .any(|e| e.from == from && e.to == to)
        {
            return;
        }
        self.edges.push(LineageEdge {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    /// Render the graph as Graphviz DOT text.
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        out.push_str("digraph lineage {\n");
        out.push_str("  rankdir=TB;\n");
        out.push_str("  node [shape=box, style=\"rounded,filled\", fontname=\"Arial\"];\n");
        out.push_str("  edge [fontname=\"Arial\"];\n");

        for node in &self.nodes {
            let (fill, font, shape) = match node.kind {
                NodeKind::SourceSystem => ("#4472C4", "white", "box"),
                NodeKind::Field => ("#E8F4F8", "#2C3E50", "box"),
                NodeKind::Filter => ("#F4A261", "white", "box"),
                NodeKind::Calculation => ("#2A9D8F", "white", "box"),
                NodeKind::Metric => ("#27AE60", "white", "ellipse"),
            };
            out.push_str(&format!(
                "  \"{}\" [label=\"{}\", fillcolor=\"{}\", fontcolor=\"{}\", shape={}];\n",
                escape(&node.id),
                escape(&node.label),
                fill,
                font,
                shape
            ));
        }

        for edge in &self.edges {
            out.push_str(&format!(
                "  \"{}\" -> \"{}\";\n",
                escape(&edge.from),
                escape(&edge.to)
            ));
        }

        out.push_str("}\n");
        out
    }
}

fn escape(text: &str) -> String {
    text.replace('"', "\\\"")
}

/// Build the lineage graph for one metric definition.
pub fn lineage_graph(definition: &MetricDefinition) -> LineageGraph {
    let mut graph = LineageGraph::default();

    let metric_node = format!("metric:{}", GOVERNED_ID);
    graph.ensure_node(
        &metric_node,
        &format!("Governed\\n{}", definition.name),
        NodeKind::Metric,
    );

    for (system_id, rule) in &definition.systems {
        let sys_node = format!("sys:{}", system_id);
        graph.ensure_node(
            &sys_node,
            definition.system_label(system_id),
            NodeKind::SourceSystem,
        );

        let filter_node = format!("filter:{}", system_id);
        graph.ensure_node(
            &filter_node,
            &filter_label(&rule.filters),
            NodeKind::Filter,
        );

        let fields = rule.referenced_fields();
        for field in &fields {
            let field_node = format!("field:{}:{}", system_id, field);
            graph.ensure_node(&field_node, field, NodeKind::Field);
            graph.add_edge(&sys_node, &field_node);
            graph.add_edge(&field_node, &filter_node);
        }
        if fields.is_empty() {
            graph.add_edge(&sys_node, &filter_node);
        }

        let calc_node = format!("calc:{}", system_id);
        graph.ensure_node(&calc_node, &calc_label(&rule.fields), NodeKind::Calculation);
        graph.add_edge(&filter_node, &calc_node);

        let value_node = format!("value:{}", system_id);
        graph.ensure_node(
            &value_node,
            &format!("{} value", definition.system_label(system_id)),
            NodeKind::Metric,
        );
        graph.add_edge(&calc_node, &value_node);
        graph.add_edge(&value_node, &metric_node);
    }

    if let Some(governed) = &definition.governed {
        let filter_node = format!("filter:{}", GOVERNED_ID);
        graph.ensure_node(
            &filter_node,
            &filter_label(&governed.filters),
            NodeKind::Filter,
        );

        for source in governed.source.system_ids() {
            let sys_node = format!("sys:{}", source);
            graph.ensure_node(
                &sys_node,
                definition.system_label(source),
                NodeKind::SourceSystem,
            );
            graph.add_edge(&sys_node, &filter_node);
        }

        let calc_node = format!("calc:{}", GOVERNED_ID);
        graph.ensure_node(
            &calc_node,
            &calc_label(&governed.fields),
            NodeKind::Calculation,
        );
        graph.add_edge(&filter_node, &calc_node);
        graph.add_edge(&calc_node, &metric_node);
    }

    graph
}

fn filter_label(filters: &[FilterRule]) -> String {
    if filters.is_empty() {
        return "no filter".to_string();
    }
    format!(
        "Filter:\\n{}",
        filters.iter().map(|r| r.describe()).join("\\n")
    )
}

fn calc_label(fields: &FieldRules) -> String {
    format!("Calculate:\\n{}", fields.describe())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::loader::load_from_yaml;

    #[test]
    fn test_lineage_covers_fields_and_governed_sink() {
        let yaml = r#"
metrics:
  - id: on_time_delivery_rate
    name: Supplier On-Time Delivery Rate
    family: ratio
    systems:
      - system: vgs
        label: VGS
        filters:
          - { op: is_false, field: is_partial_delivery }
        fields:
          ratio:
            numerator:
              - op: within_window
                field: delivery_date
                start: agreed_window_start
                end: agreed_window_end
    governed:
      source:
        join: { left: si, right: vgs, on: supplier_id }
      fields:
        ratio:
          numerator:
            - op: within_window
              field: actual_receipt_date
              start: agreed_window_start
              end: agreed_window_end
"#;
        let catalog = load_from_yaml(yaml).unwrap();
        let definition = catalog.metric("on_time_delivery_rate").unwrap();
        let graph = lineage_graph(definition);

        assert!(graph.nodes.iter().any(|n| n.id == "field:vgs:delivery_date"));
        assert!(graph.nodes.iter().any(|n| n.id == "metric:governed"));
        assert!(graph.edges.iter().any(|e| e.to == "metric:governed"));

        let dot = graph.to_dot();
        assert!(dot.starts_with("digraph lineage {"));
        assert!(dot.contains("delivery_date"));
        assert!(dot.contains("ellipse"));
    }
}
