use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{info, warn};

use metric_trust::catalog::loader::load_from_file;
use metric_trust::catalog::metric::{FormulaFamily, MetricDefinition};
use metric_trust::datagen;
use metric_trust::engine::compute::compute;
use metric_trust::engine::context::ComputeContext;
use metric_trust::engine::flags::flag_suppliers;
use metric_trust::lineage::lineage_graph;
use metric_trust::records::loader::load_system_data;
use metric_trust::report::{render_flags, render_table};

#[derive(Parser)]
#[command(name = "metric-trust")]
#[command(about = "Governed metric computation across divergent procurement source systems")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the synthetic source-system CSV files
    Generate {
        /// Output directory for the CSV files
        #[arg(short, long, default_value = "data")]
        out: PathBuf,

        /// Seed for deterministic output
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Compute metrics and print the comparison report
    Run {
        /// Directory holding the system_<id>.csv files
        #[arg(short, long, default_value = "data")]
        data_dir: PathBuf,

        /// Path to the metric catalog
        #[arg(short, long, default_value = "metrics/definitions.yml")]
        catalog: PathBuf,

        /// Compute a single metric instead of the whole catalog
        #[arg(short, long)]
        metric: Option<String>,

        /// Restrict to one quarter, e.g. Q2
        #[arg(long)]
        quarter: Option<String>,

        /// Restrict to a region; repeat for several
        #[arg(long = "region")]
        regions: Vec<String>,

        /// As-of date for active-window rules (default: today)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Flag suppliers whose governed rate falls below this percentage
        #[arg(long)]
        threshold: Option<f64>,

        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Dot,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    match args.command {
        Command::Generate { out, seed } => {
            let summary = datagen::generate(&out, seed)
                .with_context(|| format!("failed to generate data in {}", out.display()))?;
            println!(
                "Generated {} VGS, {} VPC, {} SI+ rows in {}",
                summary.vgs_rows,
                summary.vpc_rows,
                summary.si_rows,
                out.display()
            );
            Ok(())
        }
        Command::Run {
            data_dir,
            catalog,
            metric,
            quarter,
            regions,
            as_of,
            threshold,
            format,
        } => run(
            data_dir, catalog, metric, quarter, regions, as_of, threshold, format,
        ),
    }
}

#[allow(clippy::too_many_arguments)]
fn run(
    data_dir: PathBuf,
    catalog_path: PathBuf,
    metric: Option<String>,
    quarter: Option<String>,
    regions: Vec<String>,
    as_of: Option<NaiveDate>,
    threshold: Option<f64>,
    format: OutputFormat,
) -> Result<()> {
    let catalog = load_from_file(&catalog_path)
        .with_context(|| format!("failed to load catalog {}", catalog_path.display()))?;
    let data = load_system_data(&data_dir)
        .with_context(|| format!("failed to load data from {}", data_dir.display()))?;

    let mut ctx = ComputeContext::new(as_of.unwrap_or_else(|| chrono::Local::now().date_naive()));
    if let Some(quarter) = quarter {
        ctx = ctx.with_quarter(quarter);
    }
    if !regions.is_empty() {
        ctx = ctx.with_regions(regions);
    }

    let definitions: Vec<&MetricDefinition> = match &metric {
        Some(id) => match catalog.metric(id) {
            Some(definition) => vec![definition],
            None => bail!(
                "metric '{}' not found in catalog (available: {})",
                id,
                catalog.list_metrics().join(", ")
            ),
        },
        None => catalog.iter().collect(),
    };

    info!(
        "computing {} metric(s) as of {}",
        definitions.len(),
        ctx.as_of
    );

    match format {
        OutputFormat::Table => {
            for definition in &definitions {
                let report = compute(definition, &data, &ctx);
                println!("{}", render_table(definition, &report));

                if let Some(threshold) = threshold {
                    print_flags(definition, &data, threshold, &ctx);
                }
            }
        }
        OutputFormat::Json => {
            let reports = definitions
                .iter()
                .map(|definition| compute(definition, &data, &ctx))
                .collect::<Vec<_>>();
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        OutputFormat::Dot => {
            for definition in &definitions {
                println!("{}", lineage_graph(definition).to_dot());
            }
        }
    }

    Ok(())
}

fn print_flags(
    definition: &MetricDefinition,
    data: &metric_trust::records::loader::SystemData,
    threshold: f64,
    ctx: &ComputeContext,
) {
    if definition.family != FormulaFamily::Ratio
        || definition.governed.is_none()
        || definition.entity_key.is_none()
    {
        return;
    }

    match flag_suppliers(definition, data, threshold, ctx) {
        Ok(flags) => print!("{}", render_flags(&flags)),
        Err(err) => warn!("supplier flags unavailable for '{}': {}", definition.id, err),
    }
}
