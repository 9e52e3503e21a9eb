//! Synthetic Data Generator
//!
//! Writes the three source-system CSV files with deliberate discrepancies:
//! VGS carries delivery events with agreed windows plus contract lines with
//! amendments and prior prices, VPC carries contract lines priced against
//! list price, SI+ carries receipt events with committed spend. Output is
//! deterministic for a given seed.

use crate::error::Result;
use chrono::{Datelike, Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use tracing::info;

const REGIONS: [&str; 4] = ["Europe", "Asia", "Americas", "Other"];
const QUARTERS: [&str; 4] = ["Q1", "Q2", "Q3", "Q4"];
const SUPPLIER_COUNT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSummary {
    pub vgs_rows: usize,
    pub vpc_rows: usize,
    pub si_rows: usize,
}

struct Supplier {
    id: String,
    name: String,
    region: &'static str,
}

fn suppliers() -> Vec<Supplier> {
    (1..=SUPPLIER_COUNT)
        .map(|i| Supplier {
            id: format!("SUP{:03}", i),
            name: format!("Supplier {}{}", (b'A' + ((i % 26) as u8)) as char, i),
            region: REGIONS[i % REGIONS.len()],
        })
        .collect()
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date")
}

fn quarter_range(quarter: &str) -> (NaiveDate, NaiveDate) {
    match quarter {
        "Q1" => (ymd(2025, 1, 1), ymd(2025, 3, 31)),
        "Q2" => (ymd(2025, 4, 1), ymd(2025, 6, 30)),
        "Q3" => (ymd(2025, 7, 1), ymd(2025, 9, 30)),
        _ => (ymd(2025, 10, 1), ymd(2025, 12, 31)),
    }
}

fn quarter_of(date: NaiveDate) -> &'static str {
    QUARTERS[((date.month() - 1) / 3) as usize]
}

fn random_date(rng: &mut StdRng, start: NaiveDate, end: NaiveDate) -> NaiveDate {
    let span = (end - start).num_days().max(0);
    start + Duration::days(rng.gen_range(0..=span))
}

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

fn flag(value: bool) -> String {
    value.to_string()
}

/// Generate the three system CSVs into `dir`.
pub fn generate(dir: &Path, seed: u64) -> Result<GenerationSummary> {
    std::fs::create_dir_all(dir)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let suppliers = suppliers();

    let vgs_rows = generate_vgs(dir, &mut rng, &suppliers)?;
    let vpc_rows = generate_vpc(dir, &mut rng, &suppliers)?;
    let si_rows = generate_si(dir, &mut rng, &suppliers)?;

    info!(
        "generated {} VGS, {} VPC, {} SI+ rows in {}",
        vgs_rows,
        vpc_rows,
        si_rows,
        dir.display()
    );

    Ok(GenerationSummary {
        vgs_rows,
        vpc_rows,
        si_rows,
    })
}

/// VGS: delivery events plus contract lines, one file.
fn generate_vgs(dir: &Path, rng: &mut StdRng, suppliers: &[Supplier]) -> Result<usize> {
    let mut wtr = csv::Writer::from_path(dir.join("system_vgs.csv"))?;
    wtr.write_record([
        "supplier_id",
        "supplier_name",
        "region",
        "quarter",
        "record_type",
        "contract_id",
        "contract_start",
        "contract_end",
        "line_value",
        "is_amendment",
        "prior_contract_price",
        "unit_price",
        "volume",
        "delivery_date",
        "agreed_window_start",
        "agreed_window_end",
        "is_partial_delivery",
        "force_majeure_flag",
    ])?;

    let mut rows = 0usize;
    for supplier in suppliers {
        let contracts = rng.gen_range(1..=3);
        for c in 0..contracts {
            let contract_id = format!("VGS-{}-{:02}", supplier.id, c + 1);
            let contract_start = random_date(rng, ymd(2024, 1, 1), ymd(2024, 12, 28));
            let contract_end = random_date(rng, ymd(2025, 7, 1), ymd(2025, 12, 28));
            let original_value = rng.gen_range(500_000.0..5_000_000.0);
            let prior_price = rng.gen_range(100.0..500.0);
            let unit_price = prior_price * rng.gen_range(0.85..0.98);
            let volume = rng.gen_range(1_000..10_000);

            // Original contract line.
            wtr.write_record([
                supplier.id.clone(),
                supplier.name.clone(),
                supplier.region.to_string(),
                quarter_of(contract_start).to_string(),
                "contract_line".to_string(),
                contract_id.clone(),
                contract_start.to_string(),
                contract_end.to_string(),
                money(original_value),
                flag(false),
                money(prior_price),
                money(unit_price),
                volume.to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
            ])?;
            rows += 1;

            // Zero to two amendment lines.
            for _ in 0..rng.gen_range(0..=2) {
                let amendment_value = original_value * rng.gen_range(0.05..0.3);
                wtr.write_record([
                    supplier.id.clone(),
                    supplier.name.clone(),
                    supplier.region.to_string(),
                    quarter_of(contract_start).to_string(),
                    "contract_line".to_string(),
                    contract_id.clone(),
                    contract_start.to_string(),
                    contract_end.to_string(),
                    money(amendment_value),
                    flag(true),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                ])?;
                rows += 1;
            }

            // Delivery events across the quarters.
            for quarter in QUARTERS {
                let (q_start, q_end) = quarter_range(quarter);
                for _ in 0..rng.gen_range(1..=4) {
                    let delivery_date = random_date(rng, q_start, q_end);
                    let window_start = delivery_date - Duration::days(rng.gen_range(0..=5));
                    let window_end = delivery_date + Duration::days(rng.gen_range(0..=3));

                    wtr.write_record([
                        supplier.id.clone(),
                        supplier.name.clone(),
                        supplier.region.to_string(),
                        quarter.to_string(),
                        "delivery".to_string(),
                        contract_id.clone(),
                        String::new(),
                        String::new(),
                        String::new(),
                        String::new(),
                        String::new(),
                        String::new(),
                        String::new(),
                        delivery_date.to_string(),
                        window_start.to_string(),
                        window_end.to_string(),
                        flag(rng.gen_bool(0.15)),
                        flag(rng.gen_bool(0.05)),
                    ])?;
                    rows += 1;
                }
            }
        }
    }

    wtr.flush()?;
    Ok(rows)
}

/// VPC: contract lines priced against list price.
fn generate_vpc(dir: &Path, rng: &mut StdRng, suppliers: &[Supplier]) -> Result<usize> {
    let mut wtr = csv::Writer::from_path(dir.join("system_vpc.csv"))?;
    wtr.write_record([
        "supplier_id",
        "supplier_name",
        "region",
        "quarter",
        "record_type",
        "contract_id",
        "contract_start",
        "contract_end",
        "line_value",
        "is_amendment",
        "list_price",
        "unit_price",
        "volume",
    ])?;

    let mut rows = 0usize;
    for supplier in suppliers {
        let contracts = rng.gen_range(1..=2);
        for c in 0..contracts {
            let contract_id = format!("VPC-{}-{:02}", supplier.id, c + 1);
            let contract_start = random_date(rng, ymd(2024, 1, 1), ymd(2024, 12, 28));
            let contract_end = random_date(rng, ymd(2025, 7, 1), ymd(2025, 12, 28));
            let original_value = rng.gen_range(500_000.0..5_000_000.0);
            let list_price = rng.gen_range(150.0..600.0);
            let unit_price = list_price * rng.gen_range(0.7..0.95);
            let volume = rng.gen_range(1_000..10_000);

            wtr.write_record([
                supplier.id.clone(),
                supplier.name.clone(),
                supplier.region.to_string(),
                quarter_of(contract_start).to_string(),
                "contract_line".to_string(),
                contract_id.clone(),
                contract_start.to_string(),
                contract_end.to_string(),
                money(original_value),
                flag(false),
                money(list_price),
                money(unit_price),
                volume.to_string(),
            ])?;
            rows += 1;

            // VPC records amendments too; its rules exclude them.
            if rng.gen_bool(0.4) {
                let amendment_value = original_value * rng.gen_range(0.05..0.2);
                wtr.write_record([
                    supplier.id.clone(),
                    supplier.name.clone(),
                    supplier.region.to_string(),
                    quarter_of(contract_start).to_string(),
                    "contract_line".to_string(),
                    contract_id.clone(),
                    contract_start.to_string(),
                    contract_end.to_string(),
                    money(amendment_value),
                    flag(true),
                    money(list_price),
                    money(unit_price),
                    rng.gen_range(100..1_000).to_string(),
                ])?;
                rows += 1;
            }
        }
    }

    wtr.flush()?;
    Ok(rows)
}

/// SI+: receipt events with committed spend.
fn generate_si(dir: &Path, rng: &mut StdRng, suppliers: &[Supplier]) -> Result<usize> {
    let mut wtr = csv::Writer::from_path(dir.join("system_si.csv"))?;
    wtr.write_record([
        "supplier_id",
        "supplier_name",
        "region",
        "quarter",
        "record_type",
        "delivery_id",
        "scheduled_date",
        "actual_receipt_date",
        "status",
        "is_partial",
        "committed_spend",
    ])?;

    let mut rows = 0usize;
    for supplier in suppliers {
        for quarter in QUARTERS {
            let (q_start, q_end) = quarter_range(quarter);
            let deliveries = rng.gen_range(3..=10);
            for d in 0..deliveries {
                let delivery_id = format!("SI-{}-{}-{:03}", supplier.id, quarter, d + 1);
                let scheduled = random_date(rng, q_start, q_end);
                let offset = rng.gen_range(-2i64..=5);
                let received = scheduled + Duration::days(offset);
                let status = if offset <= 1 {
                    "RECEIVED"
                } else if offset <= 3 {
                    "LATE"
                } else {
                    "DELAYED"
                };

                wtr.write_record([
                    supplier.id.clone(),
                    supplier.name.clone(),
                    supplier.region.to_string(),
                    quarter.to_string(),
                    "delivery".to_string(),
                    delivery_id.clone(),
                    scheduled.to_string(),
                    received.to_string(),
                    status.to_string(),
                    flag(rng.gen_bool(0.15)),
                    money(rng.gen_range(50_000.0..500_000.0)),
                ])?;
                rows += 1;
            }
        }
    }

    wtr.flush()?;
    Ok(rows)
}
