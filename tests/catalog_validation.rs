use metric_trust::catalog::loader::load_from_yaml;
use metric_trust::catalog::metric::{FormulaFamily, GovernedSource};

const SHIPPED_CATALOG: &str = include_str!("../metrics/definitions.yml");

#[test]
fn test_shipped_catalog_loads() {
    let catalog = load_from_yaml(SHIPPED_CATALOG).expect("shipped catalog should load");
    assert_eq!(
        catalog.list_metrics(),
        vec![
            "on_time_delivery_rate",
            "negotiated_savings",
            "active_contract_value"
        ]
    );
}

#[test]
fn test_shipped_catalog_structure() {
    let catalog = load_from_yaml(SHIPPED_CATALOG).unwrap();

    let on_time = catalog.metric("on_time_delivery_rate").unwrap();
    assert_eq!(on_time.family, FormulaFamily::Ratio);
    assert_eq!(on_time.system_label("si"), "SI+");
    assert_eq!(on_time.entity_key.as_deref(), Some("supplier_id"));
    let governed = on_time.governed.as_ref().unwrap();
    match &governed.source {
        GovernedSource::Join {
            left, right, on, ..
        } => {
            assert_eq!(left, "si");
            assert_eq!(right, "vgs");
            assert_eq!(on, "supplier_id");
        }
        other => panic!("expected a join source, got {:?}", other),
    }

    let savings = catalog.metric("negotiated_savings").unwrap();
    assert_eq!(savings.family, FormulaFamily::Savings);
    assert_eq!(savings.system_ids().collect::<Vec<_>>(), vec!["vgs", "vpc"]);

    let contract_value = catalog.metric("active_contract_value").unwrap();
    assert_eq!(contract_value.family, FormulaFamily::AggregateValue);
    assert_eq!(
        contract_value.system_ids().collect::<Vec<_>>(),
        vec!["vgs", "vpc", "si"]
    );
    match &contract_value.governed.as_ref().unwrap().source {
        GovernedSource::System(id) => assert_eq!(id, "vgs"),
        other => panic!("expected a system source, got {:?}", other),
    }
}

#[test]
fn test_duplicate_metric_id_rejected() {
    let yaml = r#"
metrics:
  - id: twice
    family: savings
    systems:
      - system: vgs
        fields:
          savings: { baseline: a, actual: b, quantity: c }
  - id: twice
    family: savings
    systems:
      - system: vpc
        fields:
          savings: { baseline: a, actual: b, quantity: c }
"#;
    let err = load_from_yaml(yaml).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("twice"), "{}", message);
    assert!(message.contains("duplicate"), "{}", message);
}

#[test]
fn test_duplicate_system_rule_rejected() {
    let yaml = r#"
metrics:
  - id: doubled_system
    family: savings
    systems:
      - system: vgs
        fields:
          savings: { baseline: a, actual: b, quantity: c }
      - system: vgs
        fields:
          savings: { baseline: a, actual: b, quantity: c }
"#;
    let err = load_from_yaml(yaml).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("doubled_system"), "{}", message);
    assert!(message.contains("vgs"), "{}", message);
}

#[test]
fn test_governed_family_mismatch_rejected() {
    let yaml = r#"
metrics:
  - id: governed_mismatch
    family: ratio
    systems:
      - system: vgs
        fields:
          ratio:
            numerator: []
    governed:
      source: { system: vgs }
      fields:
        aggregate:
          value: line_value
"#;
    let err = load_from_yaml(yaml).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("governed_mismatch"), "{}", message);
    assert!(message.contains("governed"), "{}", message);
}
