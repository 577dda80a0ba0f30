use fkseed_core::{SeedPlan, SeedValue};
use schemars::schema_for;

#[test]
fn json_schema_lists_plan_fields() {
    let generated = schema_for!(SeedPlan);
    let json = serde_json::to_value(&generated).expect("serialize generated schema");

    let properties = json
        .get("properties")
        .and_then(|value| value.as_object())
        .expect("plan properties");
    assert!(properties.contains_key("targets"));
    assert!(properties.contains_key("rules"));
    assert!(properties.contains_key("seed"));
}

#[test]
fn parses_toml_seed_file() {
    let plan: SeedPlan = toml::from_str(
        r#"
        targets = ["payments", "supplier_products", "order_items"]
        seed = 42

        [[rules]]
        table = "payments"
        column = "order_id"
        value = "11"

        [[rules]]
        table = "supplier_products"
        column = "supplier_id"
        value = 5
        "#,
    )
    .expect("parse seed file");

    assert_eq!(plan.targets.len(), 3);
    assert_eq!(plan.seed, Some(42));

    let rules = plan.rules().expect("typed rules");
    assert_eq!(rules[0].value, SeedValue::from("11"));
    assert_eq!(rules[1].value, SeedValue::Int(5));
}
