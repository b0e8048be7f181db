//! Model Round-Trip Tests
//!
//! - Models read back from their own JSON / YAML compare equal
//! - Excluded fields are never written and take their default on reading
//! - Output keys rename fields in both directions
//! - Forward references resolve once the type is registered

use related::{
    fields, walker, ElementType, FieldValue, MapKey, ModelRegistry, ModelType, WalkerConfig,
};
use serde_json::json;
use std::sync::Arc;

// =============================================================================
// Helper Functions
// =============================================================================

fn child_type() -> Arc<ModelType> {
    ModelType::builder("Child")
        .field("name", fields::string().build().unwrap())
        .field("values", fields::sequence(ElementType::String).optional().build().unwrap())
        .build()
        .unwrap()
}

fn root_type() -> Arc<ModelType> {
    ModelType::builder("Root")
        .field("children", fields::mapping(child_type(), "name").optional().build().unwrap())
        .build()
        .unwrap()
}

fn profile_type() -> Arc<ModelType> {
    ModelType::builder("Profile")
        .field("id", fields::uuid().build().unwrap())
        .field("user", fields::string().key("username").build().unwrap())
        .field("born", fields::date().optional().build().unwrap())
        .field("seen", fields::date_time().optional().build().unwrap())
        .field("balance", fields::decimal().default("0").build().unwrap())
        .field("home", fields::url().optional().build().unwrap())
        .field("tags", fields::set(ElementType::String).optional().build().unwrap())
        .field("password", fields::string().exclude().default("").build().unwrap())
        .build()
        .unwrap()
}

fn profile_json() -> serde_json::Value {
    json!({
        "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
        "username": "ada",
        "born": "1815-12-10",
        "seen": "2024-03-01T12:00:00.250",
        "balance": "10.75",
        "home": "https://example.com/ada",
        "tags": ["math", "engines"],
        "password": "hunter2",
    })
}

// =============================================================================
// JSON Round-Trip Tests
// =============================================================================

#[test]
fn test_json_round_trip() {
    let profile_type = profile_type();
    let profile = walker::from_value(&profile_type, &profile_json()).unwrap();
    let text = walker::to_json(&profile).unwrap();
    let again = walker::from_json(&profile_type, &text).unwrap();

    // The password was read but never written back
    assert_eq!(profile.get("password"), Some(&FieldValue::from("hunter2")));
    assert_eq!(again.get("password"), Some(&FieldValue::from("")));

    for field in ["id", "user", "born", "seen", "balance", "home", "tags"] {
        assert_eq!(profile.get(field), again.get(field), "{} changed", field);
    }
}

/// Keys that reuse declared names of other fields, next to excluded ones.
fn crossed_keys_type() -> Arc<ModelType> {
    ModelType::builder("Crossed")
        .field("a", fields::string().key("x").build().unwrap())
        .field("x", fields::integer().key("y").exclude().default(5).build().unwrap())
        .field("b", fields::integer().key("a").optional().build().unwrap())
        .field("when", fields::date_time_with("%Y-%m-%d").optional().build().unwrap())
        .field("tags", fields::set(ElementType::String).optional().build().unwrap())
        .build()
        .unwrap()
}

/// from(to(m)) == m when output keys overlap declared names.
#[test]
fn test_whole_model_round_trip_with_crossed_keys() {
    let crossed = crossed_keys_type();
    let model = crossed
        .construct(vec![
            ("a".to_string(), FieldValue::from("hello")),
            ("b".to_string(), FieldValue::Int(7)),
            ("when".to_string(), FieldValue::from("2024-01-01")),
            (
                "tags".to_string(),
                FieldValue::List(vec![FieldValue::from("p"), FieldValue::from("q")]),
            ),
        ])
        .unwrap();

    let value = walker::to_value(&model);
    assert_eq!(
        value,
        json!({"x": "hello", "a": 7, "when": "2024-01-01", "tags": ["p", "q"]})
    );

    let again = walker::from_value(&crossed, &value).unwrap();
    assert_eq!(again, model);
    assert_eq!(again.get("x"), Some(&FieldValue::Int(5)));

    let text = walker::to_yaml(&model).unwrap();
    assert_eq!(walker::from_yaml(&crossed, &text).unwrap(), model);
}

/// The excluded field takes its default even after holding another value.
#[test]
fn test_excluded_field_resets_on_round_trip() {
    let crossed = crossed_keys_type();
    let model = crossed
        .construct(vec![
            ("a".to_string(), FieldValue::from("hello")),
            ("x".to_string(), FieldValue::Int(9)),
        ])
        .unwrap();

    let again = walker::from_json(&crossed, &walker::to_json(&model).unwrap()).unwrap();
    assert_eq!(again.get("a"), Some(&FieldValue::from("hello")));
    assert_eq!(again.get("x"), Some(&FieldValue::Int(5)));
    assert_ne!(again, model);
}

#[test]
fn test_profile_whole_model_round_trip() {
    let profile_type = profile_type();
    let profile = walker::from_value(
        &profile_type,
        &json!({"id": "67e55044-10b1-426f-9247-bb680e5fe0c8", "username": "ada", "tags": ["math"]}),
    )
    .unwrap();
    let text = walker::to_json(&profile).unwrap();
    assert_eq!(walker::from_json(&profile_type, &text).unwrap(), profile);
}

#[test]
fn test_excluded_field_absent_from_output() {
    let profile = walker::from_value(&profile_type(), &profile_json()).unwrap();
    let value = walker::to_value(&profile);

    assert!(value.get("password").is_none());
    assert_eq!(value["username"], "ada");
    assert!(value.get("user").is_none());
    assert_eq!(value["seen"], "2024-03-01T12:00:00.250");
}

#[test]
fn test_pretty_json_reads_back() {
    let profile_type = profile_type();
    let profile = walker::from_value(&profile_type, &json!({"username": "bob"})).unwrap();
    let text = walker::to_json_pretty(&profile).unwrap();
    assert!(text.contains('\n'));
    assert_eq!(walker::from_json(&profile_type, &text).unwrap(), profile);
}

// =============================================================================
// YAML Tests
// =============================================================================

#[test]
fn test_yaml_round_trip() {
    let root_type = root_type();
    let yaml = "children:\n  a:\n    name: a\n    values: [x, y]\n  b:\n    name: b\n";
    let root = walker::from_yaml(&root_type, yaml).unwrap();

    let children = root.get("children").and_then(FieldValue::as_mapping).unwrap();
    assert_eq!(children.len(), 2);
    assert!(children.contains_key(&MapKey::from("a")));

    let text = walker::to_yaml(&root).unwrap();
    assert_eq!(walker::from_yaml(&root_type, &text).unwrap(), root);
}

/// A null mapping reads as empty and is written as `{}`.
#[test]
fn test_yaml_empty_mapping() {
    let root = walker::from_yaml(&root_type(), "children:").unwrap();
    assert_eq!(walker::to_yaml(&root).unwrap().trim(), "children: {}");
}

#[test]
fn test_yaml_invalid_mapping() {
    let err = walker::from_yaml(&root_type(), "children: 5").unwrap_err();
    assert_eq!(err.code(), "RELATED_CONVERSION_FAILED");
    assert_eq!(err.field(), Some("children"));
}

// =============================================================================
// Metadata Tests
// =============================================================================

/// Every kind honors an output key and the exclusion flag.
#[test]
fn test_every_kind_excluded_under_its_key() {
    let my_child = ModelType::builder("MyChild")
        .field("my_test_field", fields::integer().key("int").exclude().build().unwrap())
        .build()
        .unwrap();

    let model_type = ModelType::builder("MyModel")
        .field("boolean_field", fields::boolean().key("bool").exclude().optional().build().unwrap())
        .field("child_field", fields::child(my_child.clone()).key("type").exclude().optional().build().unwrap())
        .field("date_field", fields::date().key("date").exclude().optional().build().unwrap())
        .field("date_time_field", fields::date_time().key("date_time").exclude().optional().build().unwrap())
        .field("time_field", fields::time().key("time").exclude().optional().build().unwrap())
        .field("float_field", fields::float().key("float").exclude().optional().build().unwrap())
        .field("int_field", fields::integer().key("int").exclude().optional().build().unwrap())
        .field("mapping_field", fields::mapping(my_child, "my_test_field").key("dict").exclude().optional().build().unwrap())
        .field("regex_field", fields::regex("[^@]+@[^@]+").key("regex").exclude().optional().build().unwrap())
        .field("sequence_field", fields::sequence(ElementType::String).key("sequence").exclude().optional().build().unwrap())
        .field("set_field", fields::set(ElementType::String).key("set").exclude().optional().build().unwrap())
        .field("string_field", fields::string().key("string").exclude().optional().build().unwrap())
        .field("url_field", fields::url().key("url").exclude().optional().build().unwrap())
        .field("uuid_field", fields::uuid().key("uuid").exclude().build().unwrap())
        .field("decimal_field", fields::decimal().key("decimal").exclude().optional().build().unwrap())
        .build()
        .unwrap();

    for field in model_type.fields() {
        assert!(field.descriptor().is_excluded(), "{} not excluded", field.name());
        assert_ne!(field.output_key(), field.name());
    }

    let model = model_type
        .construct(vec![
            ("boolean_field".to_string(), FieldValue::Bool(true)),
            ("decimal_field".to_string(), FieldValue::Float(0.0)),
        ])
        .unwrap();
    assert_eq!(walker::to_value(&model), json!({}));
}

// =============================================================================
// Forward Reference Tests
// =============================================================================

#[test]
fn test_forward_reference_resolves_after_registration() {
    let registry = ModelRegistry::new();

    let tree = ModelType::builder("Tree")
        .field("label", fields::string().build().unwrap())
        .field("branches", fields::sequence(registry.reference("Tree")).optional().build().unwrap())
        .register(&registry)
        .unwrap();

    let value = json!({
        "label": "root",
        "branches": [
            {"label": "left"},
            {"label": "right", "branches": [{"label": "leaf"}]},
        ],
    });
    let root = walker::from_value(&tree, &value).unwrap();
    let branches = root.get("branches").and_then(FieldValue::as_sequence).unwrap();
    assert_eq!(branches.len(), 2);

    let back = walker::to_value(&root);
    assert_eq!(back["branches"][1]["branches"][0]["label"], "leaf");
}

#[test]
fn test_unresolved_forward_reference_fails() {
    let registry = ModelRegistry::new();
    let owner = ModelType::builder("Owner")
        .field("pet", fields::child(registry.reference("Pet")).optional().build().unwrap())
        .build()
        .unwrap();

    // Null never needs the type
    assert!(walker::from_value(&owner, &json!({})).is_ok());

    let err = walker::from_value(&owner, &json!({"pet": {"name": "rex"}})).unwrap_err();
    assert_eq!(err.code(), "RELATED_UNRESOLVED_TYPE");

    ModelType::builder("Pet")
        .field("name", fields::string().build().unwrap())
        .register(&registry)
        .unwrap();
    assert!(walker::from_value(&owner, &json!({"pet": {"name": "rex"}})).is_ok());
}

// =============================================================================
// Interface Tests
// =============================================================================

#[test]
fn test_child_field_accepts_implementations() {
    let shape = ModelType::interface("Shape").build().unwrap();
    let circle = ModelType::builder("Circle")
        .implements("Shape")
        .field("radius", fields::float().build().unwrap())
        .build()
        .unwrap();
    let label = ModelType::builder("Label")
        .field("text", fields::string().build().unwrap())
        .build()
        .unwrap();
    let drawing = ModelType::builder("Drawing")
        .field("shape", fields::child(shape).build().unwrap())
        .build()
        .unwrap();

    let unit = circle
        .construct(vec![("radius".to_string(), FieldValue::Int(1))])
        .unwrap();
    assert!(drawing
        .construct(vec![("shape".to_string(), FieldValue::Child(unit))])
        .is_ok());

    let text = label
        .construct(vec![("text".to_string(), FieldValue::from("hi"))])
        .unwrap();
    let err = drawing
        .construct(vec![("shape".to_string(), FieldValue::Child(text))])
        .unwrap_err();
    assert_eq!(err.code(), "RELATED_VALIDATION_FAILED");

    // A raw map cannot pick an implementation
    let err = walker::from_value(&drawing, &json!({"shape": {"radius": 1}})).unwrap_err();
    assert_eq!(err.code(), "RELATED_ABSTRACT_MODEL");
}

// =============================================================================
// Walker Configuration Tests
// =============================================================================

#[test]
fn test_strict_config_rejects_unknown_keys() {
    let value = json!({"username": "ada", "nickname": "A"});
    assert!(walker::from_value(&profile_type(), &value).is_ok());

    let err = walker::from_value_with(&profile_type(), &value, &WalkerConfig::strict()).unwrap_err();
    assert_eq!(err.code(), "RELATED_UNKNOWN_FIELD");
}

// =============================================================================
// Equality and Representation Tests
// =============================================================================

#[test]
fn test_cmp_and_repr_flags() {
    let note = ModelType::builder("Note")
        .field("text", fields::string().build().unwrap())
        .field("id", fields::uuid().cmp(false).repr(false).build().unwrap())
        .field("tags", fields::sequence(ElementType::String).optional().build().unwrap())
        .build()
        .unwrap();

    let a = walker::from_value(&note, &json!({"text": "hi", "tags": ["x"]})).unwrap();
    let b = walker::from_value(&note, &json!({"text": "hi", "tags": ["x"]})).unwrap();
    let c = walker::from_value(&note, &json!({"text": "hi", "tags": ["y"]})).unwrap();

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.to_string(), "Note(text=\"hi\")");
}
