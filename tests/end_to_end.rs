use chrono::NaiveDate;
use metric_trust::catalog::loader::load_from_yaml;
use metric_trust::datagen;
use metric_trust::engine::compute::compute;
use metric_trust::engine::context::ComputeContext;
use metric_trust::engine::flags::flag_suppliers;
use metric_trust::engine::result::MetricValue;
use metric_trust::records::loader::load_system_data;
use std::fs;
use std::path::PathBuf;

const SHIPPED_CATALOG: &str = include_str!("../metrics/definitions.yml");

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("metric_trust_tests").join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn ctx() -> ComputeContext {
    // Inside every generated contract window.
    ComputeContext::new(NaiveDate::from_ymd_opt(2025, 8, 6).unwrap())
}

#[test]
fn test_generate_load_compute() {
    let dir = temp_dir("generate_load_compute");
    let summary = datagen::generate(&dir, 42).expect("generation should succeed");
    assert!(summary.vgs_rows > 0);
    assert!(summary.vpc_rows > 0);
    assert!(summary.si_rows > 0);

    let data = load_system_data(&dir).expect("generated data should load");
    assert_eq!(
        data.keys().cloned().collect::<Vec<_>>(),
        vec!["si", "vgs", "vpc"]
    );
    assert_eq!(data["vgs"].len(), summary.vgs_rows);

    let catalog = load_from_yaml(SHIPPED_CATALOG).unwrap();
    let ctx = ctx();

    for definition in catalog.iter() {
        let report = compute(definition, &data, &ctx);
        assert!(
            !report.results.is_empty(),
            "metric '{}' produced no results: {:?}",
            definition.id,
            report.skipped
        );

        for (system, result) in &report.results {
            if let MetricValue::Percent(rate) = result.value {
                assert!(
                    (0.0..=100.0).contains(&rate),
                    "metric '{}' system '{}' rate {} out of range",
                    definition.id,
                    system,
                    rate
                );
            }
        }

        // The report serializes for JSON consumers.
        serde_json::to_string(&report).expect("report should serialize");
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_each_shipped_metric_has_its_systems() {
    let dir = temp_dir("shipped_metric_systems");
    datagen::generate(&dir, 42).unwrap();
    let data = load_system_data(&dir).unwrap();
    let catalog = load_from_yaml(SHIPPED_CATALOG).unwrap();
    let ctx = ctx();

    let on_time = compute(catalog.metric("on_time_delivery_rate").unwrap(), &data, &ctx);
    assert!(on_time.results.contains_key("vgs"));
    assert!(on_time.results.contains_key("si"));
    assert!(on_time.results.contains_key("governed"));

    let savings = compute(catalog.metric("negotiated_savings").unwrap(), &data, &ctx);
    assert!(savings.results.contains_key("vgs"));
    assert!(savings.results.contains_key("vpc"));
    assert!(savings.results.contains_key("governed"));

    let contract_value = compute(catalog.metric("active_contract_value").unwrap(), &data, &ctx);
    assert!(contract_value.results.contains_key("vgs"));
    assert!(contract_value.results.contains_key("vpc"));
    assert!(contract_value.results.contains_key("si"));
    assert!(contract_value.results.contains_key("governed"));

    let vgs = contract_value.results["vgs"].value.as_f64().unwrap();
    let vpc = contract_value.results["vpc"].value.as_f64().unwrap();
    assert!(vgs > 0.0 && vpc > 0.0);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_generation_is_deterministic() {
    let first_dir = temp_dir("determinism_a");
    let second_dir = temp_dir("determinism_b");

    datagen::generate(&first_dir, 7).unwrap();
    datagen::generate(&second_dir, 7).unwrap();

    for file in ["system_vgs.csv", "system_vpc.csv", "system_si.csv"] {
        let first = fs::read_to_string(first_dir.join(file)).unwrap();
        let second = fs::read_to_string(second_dir.join(file)).unwrap();
        assert_eq!(first, second, "{} differs between equal seeds", file);
    }

    let _ = fs::remove_dir_all(&first_dir);
    let _ = fs::remove_dir_all(&second_dir);
}

#[test]
fn test_supplier_flags_over_generated_data() {
    let dir = temp_dir("supplier_flags");
    datagen::generate(&dir, 42).unwrap();
    let data = load_system_data(&dir).unwrap();
    let catalog = load_from_yaml(SHIPPED_CATALOG).unwrap();
    let definition = catalog.metric("on_time_delivery_rate").unwrap();

    let flags = flag_suppliers(definition, &data, 1000.0, &ctx()).unwrap();
    assert!(flags.evaluated > 0);
    // Every evaluated supplier sits below an impossible threshold.
    assert_eq!(flags.flagged.len(), flags.evaluated);

    let tightened = flag_suppliers(definition, &data, 0.0, &ctx()).unwrap();
    assert!(tightened.flagged.is_empty());

    let _ = fs::remove_dir_all(&dir);
}
