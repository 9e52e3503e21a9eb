//! Report Rendering
//!
//! Terminal comparison view for a computed metric: one row per source
//! system, the governed value last, then the skips and narratives.

use crate::catalog::metric::{MetricDefinition, GOVERNED_ID};
use crate::engine::flags::SupplierFlags;
use crate::engine::result::{ComputationResult, MetricReport};
use itertools::Itertools;

pub fn render_table(definition: &MetricDefinition, report: &MetricReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} ({})\n", definition.name, definition.id));
    if !definition.formula.is_empty() {
        out.push_str(&format!("  formula: {}\n", definition.formula.trim()));
    }
    out.push('\n');
    out.push_str(&format!(
        "  {:<12} {:<30} {:>10} {:>14}\n",
        "system", "value", "rows used", "rows excluded"
    ));

    for (system_id, _) in &definition.systems {
        if let Some(result) = report.results.get(system_id) {
            out.push_str(&row(definition.system_label(system_id), result));
        }
    }
    if let Some(result) = report.results.get(GOVERNED_ID) {
        out.push_str(&row("governed", result));
    }

    for skip in &report.skipped {
        out.push_str(&format!("  skipped {}: {}\n", skip.system, skip.reason));
    }

    let notes = definition
        .systems
        .iter()
        .filter_map(|(id, rule)| {
            rule.narrative
                .as_deref()
                .map(|n| format!("  {}: {}", definition.system_label(id), n))
        })
        .chain(
            definition
                .governed
                .as_ref()
                .and_then(|g| g.narrative.as_deref())
                .map(|n| format!("  governed: {}", n)),
        )
        .chain(
            definition
                .narrative
                .as_deref()
                .map(|n| format!("  why they differ: {}", n)),
        )
        .collect::<Vec<_>>();
    if !notes.is_empty() {
        out.push('\n');
        out.push_str(&notes.iter().join("\n"));
        out.push('\n');
    }

    out
}

fn row(label: &str, result: &ComputationResult) -> String {
    format!(
        "  {:<12} {:<30} {:>10} {:>14}\n",
        label,
        result.value.to_string(),
        result.rows_included,
        result.rows_excluded
    )
}

pub fn render_flags(flags: &SupplierFlags) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "  suppliers below {:.1}% on '{}': {} of {}\n",
        flags.threshold,
        flags.metric_id,
        flags.flagged.len(),
        flags.evaluated
    ));
    for entity in &flags.flagged {
        out.push_str(&format!(
            "    {} at {:.2}% ({} rows)\n",
            entity.entity, entity.rate, entity.rows
        ));
    }
    out
}
