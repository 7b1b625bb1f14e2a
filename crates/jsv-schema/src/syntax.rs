//! # Schema Syntax Checks
//!
//! Shape checks for keyword values, shared by the dialect tables. Each
//! helper appends messages to a buffer instead of returning early, so one
//! pass reports every problem in a schema node.
//!
//! Checks are shallow: a keyword holding subschemas verifies that they are
//! objects, and each subschema is checked on its own when validation first
//! reaches it.

use std::collections::BTreeSet;

use jsv_core::{node::is_integer, NodeType};
use serde_json::Value;

use crate::keyword::KeywordInput;

fn wrong_type(value: &Value, expected: &str) -> String {
    format!(
        "value has incorrect type (found {}, expected {expected})",
        NodeType::of(value)
    )
}

/// Accept anything.
pub fn any(_: &KeywordInput<'_>, _: &mut Vec<String>) {}

/// A string.
pub fn string(input: &KeywordInput<'_>, errors: &mut Vec<String>) {
    if !input.value.is_string() {
        errors.push(wrong_type(input.value, "string"));
    }
}

/// A boolean.
pub fn boolean(input: &KeywordInput<'_>, errors: &mut Vec<String>) {
    if !input.value.is_boolean() {
        errors.push(wrong_type(input.value, "boolean"));
    }
}

/// Any number.
pub fn number(input: &KeywordInput<'_>, errors: &mut Vec<String>) {
    if !input.value.is_number() {
        errors.push(wrong_type(input.value, "number"));
    }
}

/// A number strictly greater than zero.
pub fn positive_number(input: &KeywordInput<'_>, errors: &mut Vec<String>) {
    match input.value {
        Value::Number(n) => {
            let literal = n.to_string();
            let zero = literal
                .trim_start_matches('-')
                .split(['e', 'E'])
                .next()
                .is_some_and(|mantissa| mantissa.bytes().all(|b| b == b'0' || b == b'.'));
            if literal.starts_with('-') || zero {
                errors.push(format!("value must be strictly greater than 0 (found {literal})"));
            }
        }
        other => errors.push(wrong_type(other, "number")),
    }
}

/// A non-negative integer.
pub fn non_negative_integer(input: &KeywordInput<'_>, errors: &mut Vec<String>) {
    match input.value {
        Value::Number(n) if is_integer(n) => {
            if n.as_u64().is_none() {
                errors.push(format!("value must be a non-negative integer (found {n})"));
            }
        }
        other => errors.push(wrong_type(other, "integer")),
    }
}

/// A schema object.
pub fn schema(input: &KeywordInput<'_>, errors: &mut Vec<String>) {
    if !input.value.is_object() {
        errors.push(wrong_type(input.value, "object"));
    }
}

/// A boolean or a schema object.
pub fn boolean_or_schema(input: &KeywordInput<'_>, errors: &mut Vec<String>) {
    if !(input.value.is_boolean() || input.value.is_object()) {
        errors.push(wrong_type(input.value, "one of [boolean, object]"));
    }
}

fn schema_elements(items: &[Value], errors: &mut Vec<String>) {
    for (i, item) in items.iter().enumerate() {
        if !item.is_object() {
            errors.push(format!(
                "array element {i} has incorrect type (found {}, expected object)",
                NodeType::of(item)
            ));
        }
    }
}

/// A non-empty array of schema objects.
pub fn schema_array(input: &KeywordInput<'_>, errors: &mut Vec<String>) {
    match input.value {
        Value::Array(items) if items.is_empty() => {
            errors.push("array must have at least one element".to_string());
        }
        Value::Array(items) => schema_elements(items, errors),
        other => errors.push(wrong_type(other, "array")),
    }
}

/// A schema object or an array of schema objects.
pub fn schema_or_schema_array(input: &KeywordInput<'_>, errors: &mut Vec<String>) {
    match input.value {
        Value::Object(_) => {}
        Value::Array(items) => schema_elements(items, errors),
        other => errors.push(wrong_type(other, "one of [array, object]")),
    }
}

/// An object whose members are all schema objects.
pub fn schema_map(input: &KeywordInput<'_>, errors: &mut Vec<String>) {
    match input.value {
        Value::Object(map) => {
            for (name, member) in map {
                if !member.is_object() {
                    errors.push(format!(
                        "member {name:?} has incorrect type (found {}, expected object)",
                        NodeType::of(member)
                    ));
                }
            }
        }
        other => errors.push(wrong_type(other, "object")),
    }
}

/// Like [`schema_map`], with every member name an ECMA-262 regex.
pub fn pattern_schema_map(input: &KeywordInput<'_>, errors: &mut Vec<String>) {
    schema_map(input, errors);
    if let Value::Object(map) = input.value {
        for name in map.keys() {
            if let Err(e) = regress::Regex::new(name) {
                errors.push(format!("member name {name:?} is not a valid ECMA 262 regex: {e}"));
            }
        }
    }
}

/// An ECMA-262 regular expression.
pub fn regex(input: &KeywordInput<'_>, errors: &mut Vec<String>) {
    match input.value {
        Value::String(s) => {
            if let Err(e) = regress::Regex::new(s) {
                errors.push(format!("{s:?} is not a valid ECMA 262 regex: {e}"));
            }
        }
        other => errors.push(wrong_type(other, "string")),
    }
}

/// Check an array of strings for element type and duplicates.
pub fn string_elements(items: &[Value], errors: &mut Vec<String>) {
    let mut seen = BTreeSet::new();
    for (i, item) in items.iter().enumerate() {
        match item.as_str() {
            Some(s) => {
                if !seen.insert(s) {
                    errors.push(format!("array elements must be unique (duplicate {s:?})"));
                }
            }
            None => errors.push(format!(
                "array element {i} has incorrect type (found {}, expected string)",
                NodeType::of(item)
            )),
        }
    }
}

/// A non-empty array of unique strings.
pub fn string_array(input: &KeywordInput<'_>, errors: &mut Vec<String>) {
    match input.value {
        Value::Array(items) if items.is_empty() => {
            errors.push("array must have at least one element".to_string());
        }
        Value::Array(items) => string_elements(items, errors),
        other => errors.push(wrong_type(other, "array")),
    }
}

/// A minimum/maximum exclusion flag, which needs its bound beside it.
pub fn exclusive_flag(input: &KeywordInput<'_>, errors: &mut Vec<String>) {
    boolean(input, errors);
    let bound = if input.name == "exclusiveMinimum" {
        "minimum"
    } else {
        "maximum"
    };
    if !input.schema.contains_key(bound) {
        errors.push(format!("keyword requires \"{bound}\" to be present"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FormatRegistry;
    use jsv_core::JsonPointer;
    use serde_json::{json, Map};

    fn run(check: fn(&KeywordInput<'_>, &mut Vec<String>), name: &'static str, value: Value) -> Vec<String> {
        let schema: Map<String, Value> = Map::new();
        run_in(check, name, value, &schema)
    }

    fn run_in(
        check: fn(&KeywordInput<'_>, &mut Vec<String>),
        name: &'static str,
        value: Value,
        schema: &Map<String, Value>,
    ) -> Vec<String> {
        let formats = FormatRegistry::empty();
        let pointer = JsonPointer::root();
        let input = KeywordInput {
            name,
            value: &value,
            schema,
            pointer: &pointer,
            formats: &formats,
        };
        let mut errors = Vec::new();
        check(&input, &mut errors);
        errors
    }

    #[test]
    fn test_non_negative_integer() {
        assert!(run(non_negative_integer, "minLength", json!(3)).is_empty());
        assert_eq!(run(non_negative_integer, "minLength", json!(-1)).len(), 1);
        assert_eq!(
            run(non_negative_integer, "minLength", json!("3")),
            vec!["value has incorrect type (found string, expected integer)".to_string()]
        );
        let decimal: Value = serde_json::from_str("3.0").unwrap();
        assert_eq!(run(non_negative_integer, "minLength", decimal).len(), 1);
    }

    #[test]
    fn test_positive_number() {
        assert!(run(positive_number, "multipleOf", json!(0.5)).is_empty());
        assert_eq!(run(positive_number, "multipleOf", json!(0)).len(), 1);
        let zero: Value = serde_json::from_str("0.0e3").unwrap();
        assert_eq!(run(positive_number, "multipleOf", zero).len(), 1);
        assert_eq!(run(positive_number, "multipleOf", json!(-2)).len(), 1);
    }

    #[test]
    fn test_schema_array_requires_objects() {
        assert!(run(schema_array, "allOf", json!([{}, {"type": "string"}])).is_empty());
        assert_eq!(run(schema_array, "allOf", json!([])).len(), 1);
        assert_eq!(run(schema_array, "allOf", json!([{}, 3, "x"])).len(), 2);
    }

    #[test]
    fn test_pattern_schema_map_checks_regexes() {
        assert!(run(pattern_schema_map, "patternProperties", json!({"^a": {}})).is_empty());
        let errors = run(pattern_schema_map, "patternProperties", json!({"(": {}}));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("ECMA 262"));
    }

    #[test]
    fn test_string_array_unique() {
        assert!(run(string_array, "required", json!(["a", "b"])).is_empty());
        assert_eq!(run(string_array, "required", json!(["a", "a"])).len(), 1);
        assert_eq!(run(string_array, "required", json!([])).len(), 1);
    }

    #[test]
    fn test_exclusive_flag_needs_bound() {
        let mut schema = Map::new();
        assert_eq!(run_in(exclusive_flag, "exclusiveMinimum", json!(true), &schema).len(), 1);
        schema.insert("minimum".into(), json!(1));
        assert!(run_in(exclusive_flag, "exclusiveMinimum", json!(true), &schema).is_empty());
    }
}
