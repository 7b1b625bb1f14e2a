//! Keywords that apply to every instance type: draft-4 `type`, `enum`
//! and `format`.

use std::sync::Arc;

use jsv_core::{json_equals, NodeType};
use serde_json::Value;

use super::{name_list, Keyword, KeywordInput};
use crate::context::ValidationContext;
use crate::engine::InstanceValidator;
use crate::format::FormatAttribute;
use crate::report::ValidationReport;

/// Draft-4 `type`: one primitive type name or an array of them.
#[derive(Debug)]
pub struct TypeKeyword {
    allowed: Vec<NodeType>,
}

/// Build draft-4 `type`.
pub fn build_type(input: &KeywordInput<'_>) -> Option<Box<dyn Keyword>> {
    let allowed = match input.value {
        Value::String(s) => NodeType::from_name(s).into_iter().collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(NodeType::from_name)
            .collect(),
        _ => return None,
    };
    Some(Box::new(TypeKeyword { allowed }))
}

/// Syntax of draft-4 `type`.
pub fn check_type(input: &KeywordInput<'_>, errors: &mut Vec<String>) {
    let names: Vec<&Value> = match input.value {
        Value::String(_) => vec![input.value],
        Value::Array(items) if items.is_empty() => {
            errors.push("array must have at least one element".to_string());
            return;
        }
        Value::Array(items) => {
            crate::syntax::string_elements(items, errors);
            items.iter().collect()
        }
        other => {
            errors.push(format!(
                "value has incorrect type (found {}, expected one of [array, string])",
                NodeType::of(other)
            ));
            return;
        }
    };
    for name in names.into_iter().filter_map(Value::as_str) {
        if NodeType::from_name(name).is_none() {
            errors.push(format!("unknown simple type {name:?}"));
        }
    }
}

impl Keyword for TypeKeyword {
    fn validate(
        &self,
        _: &InstanceValidator<'_>,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        instance: &Value,
    ) {
        let found = NodeType::of(instance);
        if !self.allowed.iter().any(|t| found.satisfies(*t)) {
            report.fail(
                ctx,
                format!(
                    "instance type ({found}) does not match any allowed primitive type (allowed: {})",
                    name_list(self.allowed.iter().map(NodeType::as_str))
                ),
            );
        }
    }
}

/// `enum`: the instance must equal one of the listed values.
#[derive(Debug)]
pub struct EnumKeyword {
    values: Vec<Value>,
}

/// Build `enum`.
pub fn build_enum(input: &KeywordInput<'_>) -> Option<Box<dyn Keyword>> {
    let values = input.value.as_array()?.clone();
    Some(Box::new(EnumKeyword { values }))
}

/// Syntax of `enum`: a non-empty array of distinct values.
pub fn check_enum(input: &KeywordInput<'_>, errors: &mut Vec<String>) {
    match input.value {
        Value::Array(items) if items.is_empty() => {
            errors.push("array must have at least one element".to_string());
        }
        Value::Array(items) => {
            for (i, a) in items.iter().enumerate() {
                if items[..i].iter().any(|b| json_equals(a, b)) {
                    errors.push(format!("array elements must be unique (duplicate {a})"));
                }
            }
        }
        other => errors.push(format!(
            "value has incorrect type (found {}, expected array)",
            NodeType::of(other)
        )),
    }
}

impl Keyword for EnumKeyword {
    fn validate(
        &self,
        _: &InstanceValidator<'_>,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        instance: &Value,
    ) {
        if !self.values.iter().any(|v| json_equals(v, instance)) {
            report.fail(
                ctx,
                format!(
                    "instance value ({instance}) not found in enum (possible values: {})",
                    Value::Array(self.values.clone())
                ),
            );
        }
    }
}

/// `format`: delegates to the named attribute.
#[derive(Debug)]
pub struct FormatKeyword {
    attribute: Arc<dyn FormatAttribute>,
}

/// Build `format`. Unknown names build nothing.
pub fn build_format(input: &KeywordInput<'_>) -> Option<Box<dyn Keyword>> {
    let name = input.value.as_str()?;
    match input.formats.get(name) {
        Some(attribute) => Some(Box::new(FormatKeyword {
            attribute: attribute.clone(),
        })),
        None => {
            tracing::debug!(format = name, "no format attribute registered; ignoring");
            None
        }
    }
}

impl Keyword for FormatKeyword {
    fn validate(
        &self,
        _: &InstanceValidator<'_>,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        instance: &Value,
    ) {
        if self.attribute.types().contains(NodeType::of(instance)) {
            for message in self.attribute.check(instance) {
                report.fail(ctx, message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::{draft4, failures};
    use serde_json::json;

    #[test]
    fn test_type_single_and_union() {
        assert!(draft4(&json!({"type": "string"}), &json!("x")).is_success());
        assert!(draft4(&json!({"type": ["string", "null"]}), &json!(null)).is_success());
        let report = draft4(&json!({"type": ["string", "null"]}), &json!(1));
        assert_eq!(
            failures(&report),
            vec![r#"instance type (integer) does not match any allowed primitive type (allowed: ["string", "null"])"#]
        );
    }

    #[test]
    fn test_integer_satisfies_number_but_not_reverse() {
        assert!(draft4(&json!({"type": "number"}), &json!(3)).is_success());
        assert!(!draft4(&json!({"type": "integer"}), &json!(3.5)).is_success());
    }

    #[test]
    fn test_enum_uses_numeric_equality() {
        let schema = json!({"enum": [1, "a", {"k": [true]}]});
        assert!(draft4(&schema, &json!(1.0)).is_success());
        assert!(draft4(&schema, &json!({"k": [true]})).is_success());
        assert!(!draft4(&schema, &json!({"k": [false]})).is_success());
    }

    #[test]
    fn test_format_applies_only_to_declared_types() {
        let schema = json!({"format": "ipv4"});
        assert!(draft4(&schema, &json!("10.0.0.1")).is_success());
        assert!(!draft4(&schema, &json!("10.0.0")).is_success());
        assert!(draft4(&schema, &json!(42)).is_success());
    }

    #[test]
    fn test_unknown_format_is_ignored() {
        assert!(draft4(&json!({"format": "no-such-format"}), &json!("x")).is_success());
    }

    #[test]
    fn test_malformed_type_is_a_syntax_failure() {
        let report = draft4(&json!({"type": "strnig"}), &json!("x"));
        assert_eq!(failures(&report), vec![r#"unknown simple type "strnig""#]);
    }
}
