//! Array keywords: `minItems`, `maxItems`, `uniqueItems`, and
//! `additionalItems: false` on tuples.
//!
//! `items` and `additionalItems` as schemas are applied during descent by
//! the [`InstanceValidator`]; only the hard cap is a keyword-level check.

use jsv_core::json_equals;
use serde_json::Value;

use super::{Keyword, KeywordInput};
use crate::context::ValidationContext;
use crate::engine::InstanceValidator;
use crate::report::ValidationReport;

/// `minItems` or `maxItems`.
#[derive(Debug)]
pub struct ItemCountKeyword {
    limit: u64,
    minimum: bool,
}

/// Build `minItems`.
pub fn build_min_items(input: &KeywordInput<'_>) -> Option<Box<dyn Keyword>> {
    Some(Box::new(ItemCountKeyword {
        limit: input.value.as_u64()?,
        minimum: true,
    }))
}

/// Build `maxItems`.
pub fn build_max_items(input: &KeywordInput<'_>) -> Option<Box<dyn Keyword>> {
    Some(Box::new(ItemCountKeyword {
        limit: input.value.as_u64()?,
        minimum: false,
    }))
}

impl Keyword for ItemCountKeyword {
    fn validate(
        &self,
        _: &InstanceValidator<'_>,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        instance: &Value,
    ) {
        let Value::Array(items) = instance else {
            return;
        };
        let count = items.len() as u64;
        if self.minimum && count < self.limit {
            report.fail(
                ctx,
                format!(
                    "array is too short: must have at least {} elements but instance has {count} elements",
                    self.limit
                ),
            );
        } else if !self.minimum && count > self.limit {
            report.fail(
                ctx,
                format!(
                    "array is too long: must have at most {} elements but instance has {count} elements",
                    self.limit
                ),
            );
        }
    }
}

/// `uniqueItems: true`.
#[derive(Debug)]
pub struct UniqueItemsKeyword;

/// Build `uniqueItems`; `false` checks nothing.
pub fn build_unique_items(input: &KeywordInput<'_>) -> Option<Box<dyn Keyword>> {
    match input.value {
        Value::Bool(true) => Some(Box::new(UniqueItemsKeyword)),
        _ => None,
    }
}

impl Keyword for UniqueItemsKeyword {
    fn validate(
        &self,
        _: &InstanceValidator<'_>,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        instance: &Value,
    ) {
        let Value::Array(items) = instance else {
            return;
        };
        let duplicate = items
            .iter()
            .enumerate()
            .any(|(i, a)| items[..i].iter().any(|b| json_equals(a, b)));
        if duplicate {
            report.fail(ctx, "array must not contain duplicate elements");
        }
    }
}

/// `additionalItems: false` beside a tuple `items`.
#[derive(Debug)]
pub struct AdditionalItemsKeyword {
    allowed: usize,
}

/// Build `additionalItems`. Only `false` beside an array-valued `items`
/// caps anything; a single `items` schema already covers every element.
pub fn build_additional_items(input: &KeywordInput<'_>) -> Option<Box<dyn Keyword>> {
    if input.value != &Value::Bool(false) {
        return None;
    }
    let allowed = input.schema.get("items").and_then(Value::as_array)?.len();
    Some(Box::new(AdditionalItemsKeyword { allowed }))
}

impl Keyword for AdditionalItemsKeyword {
    fn validate(
        &self,
        _: &InstanceValidator<'_>,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        instance: &Value,
    ) {
        let Value::Array(items) = instance else {
            return;
        };
        for index in self.allowed..items.len() {
            let allowed = self.allowed;
            ctx.descend(index.to_string(), |ctx| {
                report.fail(
                    ctx,
                    format!(
                        "array element is not allowed: the schema allows at most {allowed} elements"
                    ),
                );
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::report::ValidationStatus;
    use crate::testing::{draft4, failures};
    use serde_json::json;

    #[test]
    fn test_item_counts() {
        let schema = json!({"minItems": 1, "maxItems": 2});
        assert!(draft4(&schema, &json!([1])).is_success());
        assert!(!draft4(&schema, &json!([])).is_success());
        assert!(!draft4(&schema, &json!([1, 2, 3])).is_success());
        assert!(draft4(&schema, &json!({"not": "an array"})).is_success());
    }

    #[test]
    fn test_unique_items_deep_equality() {
        let schema = json!({"uniqueItems": true});
        assert!(draft4(&schema, &json!([1, "1", [1]])).is_success());
        assert!(!draft4(&schema, &json!([{"a": [1]}, {"a": [1.0]}])).is_success());
        assert!(draft4(&json!({"uniqueItems": false}), &json!([1, 1])).is_success());
    }

    #[test]
    fn test_tuple_overflow_fails_at_extra_index_only() {
        let schema = json!({
            "items": [{"type": "integer"}, {"type": "string"}],
            "additionalItems": false
        });
        let report = draft4(&schema, &json!([1, "x", true]));
        assert_eq!(report.status(), ValidationStatus::Failure);
        assert_eq!(report.len(), 1);
        assert_eq!(report.messages()[0].instance_path.to_string(), "/2");
        assert_eq!(report.messages()[0].keyword.as_deref(), Some("additionalItems"));
    }

    #[test]
    fn test_additional_items_ignored_without_tuple() {
        let schema = json!({"items": {"type": "integer"}, "additionalItems": false});
        assert!(draft4(&schema, &json!([1, 2, 3, 4])).is_success());
    }

    #[test]
    fn test_additional_items_schema_applies_to_overflow() {
        let schema = json!({"items": [{}], "additionalItems": {"type": "string"}});
        let report = draft4(&schema, &json!([1, "a", 2]));
        assert_eq!(report.len(), 1);
        assert_eq!(report.messages()[0].instance_path.to_string(), "/2");
        assert!(failures(&report)[0].contains("integer"));
    }
}
