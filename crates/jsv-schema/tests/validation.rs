//! # End-to-End Validation Tests
//!
//! Whole-validator behaviour: report contents, caching, call flags and
//! dialect selection.

use std::sync::Arc;

use jsv_schema::{
    DialectKind, SchemaValidator, ValidationReport, ValidationStatus, ValidatorConfig,
};
use serde_json::json;

fn validator() -> SchemaValidator {
    SchemaValidator::new(ValidatorConfig::default())
}

fn paths(report: &ValidationReport) -> Vec<String> {
    report
        .messages()
        .iter()
        .map(|m| m.instance_path.to_string())
        .collect()
}

#[test]
fn test_additional_properties_false_fails_once_citing_b() {
    let schema = json!({"properties": {"a": {}}, "additionalProperties": false});
    let report = validator().validate(&schema, &json!({"a": 1, "b": 2}));
    assert_eq!(report.status(), ValidationStatus::Failure);
    assert_eq!(report.len(), 1);
    assert_eq!(paths(&report), vec!["/b"]);
    assert!(report.messages()[0].message.contains("\"b\""));
}

#[test]
fn test_tuple_items_fail_on_index_two_only() {
    let schema = json!({
        "items": [{"type": "integer"}, {"type": "string"}],
        "additionalItems": false
    });
    let v = validator();
    assert!(v.validate(&schema, &json!([1, "x"])).is_success());
    let report = v.validate(&schema, &json!([1, "x", null]));
    assert_eq!(paths(&report), vec!["/2"]);
}

#[test]
fn test_large_integer_is_exact() {
    let schema = json!({"type": "integer", "multipleOf": 1});
    let instance: serde_json::Value = serde_json::from_str("9007199254740993").unwrap();
    assert!(validator().validate(&schema, &instance).is_success());

    let bounded = json!({"maximum": 9007199254740992u64});
    let report = validator().validate(&bounded, &instance);
    assert_eq!(report.status(), ValidationStatus::Failure);
}

#[test]
fn test_decimal_multiple_of_is_exact() {
    let schema: serde_json::Value = serde_json::from_str(r#"{"multipleOf": 0.01}"#).unwrap();
    let v = validator();
    for ok in ["19.99", "0.3", "100"] {
        let instance: serde_json::Value = serde_json::from_str(ok).unwrap();
        assert!(v.validate(&schema, &instance).is_success(), "{ok}");
    }
    let bad: serde_json::Value = serde_json::from_str("0.001").unwrap();
    assert!(!v.validate(&schema, &bad).is_success());
}

#[test]
fn test_repeated_validation_hits_cache() {
    let schema = json!({
        "type": "object",
        "properties": {"tags": {"type": "array", "items": {"type": "string"}}}
    });
    let instance = json!({"tags": ["a", "b", "c"]});
    let v = validator();

    assert!(v.validate(&schema, &instance).is_success());
    let first = v.cache_stats();
    assert_eq!(first.builds, 3);

    assert!(v.validate(&schema, &instance).is_success());
    let second = v.cache_stats();
    assert_eq!(second.builds, first.builds);
    assert!(second.hits > first.hits);
}

#[test]
fn test_fail_fast_stops_at_first_failure() {
    let schema = json!({"items": {"type": "string"}});
    let instance = json!([1, 2, 3]);

    assert_eq!(validator().validate(&schema, &instance).len(), 3);

    let v = SchemaValidator::new(ValidatorConfig::default().with_fail_fast(true));
    let report = v.validate(&schema, &instance);
    assert_eq!(report.status(), ValidationStatus::Failure);
    assert_eq!(paths(&report), vec!["/0"]);
}

#[test]
fn test_deep_check_visits_children_of_failed_container() {
    let schema = json!({
        "maxProperties": 1,
        "properties": {"a": {"type": "string"}, "b": {"type": "string"}}
    });
    let instance = json!({"a": 1, "b": 2});

    assert_eq!(paths(&validator().validate(&schema, &instance)), vec![""]);

    let deep = SchemaValidator::new(ValidatorConfig::default().with_deep_check(true));
    assert_eq!(paths(&deep.validate(&schema, &instance)), vec!["", "/a", "/b"]);
}

#[test]
fn test_dialect_selected_by_schema_uri() {
    let schema = json!({
        "$schema": "http://json-schema.org/draft-03/schema#",
        "properties": {"id": {"type": "integer", "required": true}}
    });
    let v = validator();
    assert!(v.validate(&schema, &json!({"id": 1})).is_success());
    assert!(!v.validate(&schema, &json!({})).is_success());
}

#[test]
fn test_default_dialect_from_config() {
    let schema = json!({"divisibleBy": 3});
    assert!(validator().validate(&schema, &json!(4)).is_success());

    let config = ValidatorConfig::default().with_default_dialect(DialectKind::Draft3);
    let v = SchemaValidator::new(config);
    assert!(!v.validate(&schema, &json!(4)).is_success());
}

#[test]
fn test_formats() {
    let v = validator();
    let schema = json!({"properties": {
        "when": {"format": "date-time"},
        "ip": {"format": "ipv4"},
        "mail": {"format": "email"},
        "custom": {"format": "x-unknown"}
    }});
    let good = json!({
        "when": "2024-02-29T12:00:00Z",
        "ip": "10.0.0.1",
        "mail": "a@example.com",
        "custom": "anything"
    });
    assert!(v.validate(&schema, &good).is_success());
    let bad = json!({"when": "yesterday", "ip": "10.0.0.256"});
    assert_eq!(paths(&v.validate(&schema, &bad)), vec!["/ip", "/when"]);
}

#[test]
fn test_report_serializes_to_json() {
    let report = validator().validate(&json!({"minLength": 2}), &json!("x"));
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["status"], "failure");
    assert_eq!(value["messages"][0]["keyword"], "minLength");
    assert_eq!(value["messages"][0]["instance_path"], "");
}

#[test]
fn test_report_display_matches_violation_format() {
    let report = validator().validate(&json!({"items": {"type": "null"}}), &json!([0]));
    let text = report.to_string();
    assert!(text.starts_with("failure"));
    assert!(text.contains("  /0: "), "{text}");
    assert!(text.contains("[type]"), "{text}");
}

#[test]
fn test_validator_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SchemaValidator>();

    let v = Arc::new(validator());
    let schema = json!({"type": "array", "items": {"minimum": 0}});
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let v = Arc::clone(&v);
            let schema = schema.clone();
            std::thread::spawn(move || v.validate(&schema, &json!([i, -1])).len())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 1);
    }
}
