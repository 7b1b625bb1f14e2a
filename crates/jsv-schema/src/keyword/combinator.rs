//! Keywords that validate the instance against subschemas and combine the
//! outcomes: `allOf`/`extends`, `anyOf`, `oneOf`, `not`, and draft-3
//! `type`/`disallow` with schema members.
//!
//! Each branch runs into its own sub-report through
//! [`InstanceValidator::branch`], so `$ref` inside a branch is resolved like
//! anywhere else. A branch that hits a fatal error is merged into the
//! parent report as is, which lifts it to `Error`, and otherwise counts as
//! a branch that did not match. The other branches still run.

use jsv_core::{JsonPointer, NodeType};
use serde_json::Value;

use super::{name_list, Keyword, KeywordInput};
use crate::context::ValidationContext;
use crate::engine::InstanceValidator;
use crate::report::{ValidationMessage, ValidationReport};

/// The branch report, or `None` once a fatal branch report has been merged
/// into `report`.
fn run_branch(
    engine: &InstanceValidator<'_>,
    ctx: &mut ValidationContext,
    report: &mut ValidationReport,
    instance: &Value,
    schema: &JsonPointer,
) -> Option<ValidationReport> {
    let sub = engine.branch(ctx, instance, schema);
    if sub.is_error() {
        report.merge(sub);
        return None;
    }
    Some(sub)
}

/// `allOf` (draft-4) and `extends` (draft-3): every branch must pass.
/// Stops at the first failing branch.
#[derive(Debug)]
pub struct AllOfKeyword {
    schemas: Vec<JsonPointer>,
}

/// Build `allOf` / `extends`.
pub fn build_all_of(input: &KeywordInput<'_>) -> Option<Box<dyn Keyword>> {
    Some(Box::new(AllOfKeyword {
        schemas: input.schema_elements(),
    }))
}

impl Keyword for AllOfKeyword {
    fn validate(
        &self,
        engine: &InstanceValidator<'_>,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        instance: &Value,
    ) {
        for schema in &self.schemas {
            let Some(sub) = run_branch(engine, ctx, report, instance, schema) else {
                break;
            };
            if !sub.is_success() {
                report.merge(sub);
                break;
            }
        }
    }
}

/// `anyOf`: at least one branch must pass.
#[derive(Debug)]
pub struct AnyOfKeyword {
    schemas: Vec<JsonPointer>,
}

/// Build `anyOf`.
pub fn build_any_of(input: &KeywordInput<'_>) -> Option<Box<dyn Keyword>> {
    Some(Box::new(AnyOfKeyword {
        schemas: input.schema_elements(),
    }))
}

impl Keyword for AnyOfKeyword {
    fn validate(
        &self,
        engine: &InstanceValidator<'_>,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        instance: &Value,
    ) {
        let mut causes = Vec::new();
        for schema in &self.schemas {
            let Some(sub) = run_branch(engine, ctx, report, instance, schema) else {
                continue;
            };
            if sub.is_success() {
                return;
            }
            causes.extend(sub.into_messages());
        }
        report.fail_with(
            ctx,
            format!(
                "instance failed to match at least one required schema among {}",
                self.schemas.len()
            ),
            causes,
        );
    }
}

/// `oneOf`: exactly one branch must pass.
#[derive(Debug)]
pub struct OneOfKeyword {
    schemas: Vec<JsonPointer>,
}

/// Build `oneOf`.
pub fn build_one_of(input: &KeywordInput<'_>) -> Option<Box<dyn Keyword>> {
    Some(Box::new(OneOfKeyword {
        schemas: input.schema_elements(),
    }))
}

impl Keyword for OneOfKeyword {
    fn validate(
        &self,
        engine: &InstanceValidator<'_>,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        instance: &Value,
    ) {
        let mut matched = Vec::new();
        let mut causes = Vec::new();
        for (i, schema) in self.schemas.iter().enumerate() {
            let Some(sub) = run_branch(engine, ctx, report, instance, schema) else {
                continue;
            };
            if sub.is_success() {
                matched.push(i);
            } else {
                causes.extend(sub.into_messages());
            }
        }
        match matched.len() {
            1 => {}
            0 => report.fail_with(
                ctx,
                format!(
                    "instance failed to match exactly one schema (matched 0 out of {})",
                    self.schemas.len()
                ),
                causes,
            ),
            n => report.fail(
                ctx,
                format!(
                    "instance failed to match exactly one schema (matched {n} out of {}, indices {matched:?})",
                    self.schemas.len()
                ),
            ),
        }
    }
}

/// `not`: the branch must fail.
#[derive(Debug)]
pub struct NotKeyword {
    schema: JsonPointer,
}

/// Build `not`.
pub fn build_not(input: &KeywordInput<'_>) -> Option<Box<dyn Keyword>> {
    Some(Box::new(NotKeyword {
        schema: input.value_pointer(),
    }))
}

impl Keyword for NotKeyword {
    fn validate(
        &self,
        engine: &InstanceValidator<'_>,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        instance: &Value,
    ) {
        let Some(sub) = run_branch(engine, ctx, report, instance, &self.schema) else {
            return;
        };
        if sub.is_success() {
            report.fail(ctx, "instance matched a schema which it should not");
        }
    }
}

/// Members of a draft-3 `type` or `disallow` value.
#[derive(Debug, Default)]
struct TypeUnion {
    any: bool,
    primitives: Vec<NodeType>,
    schemas: Vec<JsonPointer>,
}

impl TypeUnion {
    fn parse(input: &KeywordInput<'_>) -> Self {
        let mut union = TypeUnion::default();
        let base = input.value_pointer();
        let mut add = |member: &Value, pointer: JsonPointer| match member {
            Value::String(name) if name == "any" => union.any = true,
            Value::String(name) => union.primitives.extend(NodeType::from_name(name)),
            Value::Object(_) => union.schemas.push(pointer),
            _ => {}
        };
        match input.value {
            Value::Array(members) => {
                for (i, member) in members.iter().enumerate() {
                    add(member, base.append_index(i));
                }
            }
            other => add(other, base),
        }
        union
    }

    fn names(&self) -> String {
        let mut names: Vec<&str> = self.primitives.iter().map(NodeType::as_str).collect();
        if self.any {
            names.push("any");
        }
        name_list(names)
    }

    fn primitive_match(&self, found: NodeType) -> bool {
        self.any || self.primitives.iter().any(|t| found.satisfies(*t))
    }

    /// The first passing schema member, if any, plus the failures of the
    /// members tried before it.
    fn schema_match(
        &self,
        engine: &InstanceValidator<'_>,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        instance: &Value,
    ) -> (Option<usize>, Vec<ValidationMessage>) {
        let mut causes = Vec::new();
        for (i, schema) in self.schemas.iter().enumerate() {
            let Some(sub) = run_branch(engine, ctx, report, instance, schema) else {
                continue;
            };
            if sub.is_success() {
                return (Some(i), causes);
            }
            causes.extend(sub.into_messages());
        }
        (None, causes)
    }
}

/// Draft-3 `type`: a primitive name, `"any"`, a schema, or an array of
/// these. Passes on the first member that matches.
#[derive(Debug)]
pub struct UnionTypeKeyword {
    union: TypeUnion,
}

/// Build draft-3 `type`.
pub fn build_union_type(input: &KeywordInput<'_>) -> Option<Box<dyn Keyword>> {
    Some(Box::new(UnionTypeKeyword {
        union: TypeUnion::parse(input),
    }))
}

/// Syntax of draft-3 `type` and `disallow`.
pub fn check_union_type(input: &KeywordInput<'_>, errors: &mut Vec<String>) {
    let members: Vec<&Value> = match input.value {
        Value::Array(items) => {
            let names: Vec<Value> = items.iter().filter(|v| v.is_string()).cloned().collect();
            crate::syntax::string_elements(&names, errors);
            items.iter().collect()
        }
        other => vec![other],
    };
    for member in members {
        match member {
            Value::String(name) if name == "any" || NodeType::from_name(name).is_some() => {}
            Value::String(name) => errors.push(format!("unknown simple type {name:?}")),
            Value::Object(_) => {}
            other => errors.push(format!(
                "type member has incorrect type (found {}, expected one of [object, string])",
                NodeType::of(other)
            )),
        }
    }
}

impl Keyword for UnionTypeKeyword {
    fn validate(
        &self,
        engine: &InstanceValidator<'_>,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        instance: &Value,
    ) {
        let found = NodeType::of(instance);
        if self.union.primitive_match(found) {
            return;
        }
        let (matched, causes) = self.union.schema_match(engine, ctx, report, instance);
        if matched.is_none() {
            report.fail_with(
                ctx,
                format!(
                    "instance type ({found}) does not match any allowed primitive type or schema (allowed: {}, schemas: {})",
                    self.union.names(),
                    self.union.schemas.len()
                ),
                causes,
            );
        }
    }
}

/// Draft-3 `disallow`: the inverse of draft-3 `type`.
#[derive(Debug)]
pub struct DisallowKeyword {
    union: TypeUnion,
}

/// Build draft-3 `disallow`.
pub fn build_disallow(input: &KeywordInput<'_>) -> Option<Box<dyn Keyword>> {
    Some(Box::new(DisallowKeyword {
        union: TypeUnion::parse(input),
    }))
}

impl Keyword for DisallowKeyword {
    fn validate(
        &self,
        engine: &InstanceValidator<'_>,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        instance: &Value,
    ) {
        let found = NodeType::of(instance);
        if self.union.primitive_match(found) {
            report.fail(
                ctx,
                format!(
                    "instance type ({found}) is disallowed (disallowed: {})",
                    self.union.names()
                ),
            );
            return;
        }
        if let (Some(index), _) = self.union.schema_match(engine, ctx, report, instance) {
            report.fail(
                ctx,
                format!("instance matched disallowed schema at index {index}"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::report::ValidationStatus;
    use crate::testing::{draft3, draft4, failures};
    use serde_json::json;

    #[test]
    fn test_all_of_stops_at_first_failure() {
        let schema = json!({"allOf": [{"type": "string"}, {"minLength": 10}, {"maxLength": 1}]});
        let report = draft4(&schema, &json!("abc"));
        assert_eq!(report.len(), 1);
        assert!(failures(&report)[0].contains("too short"));
        assert!(draft4(&json!({"allOf": [{"type": "string"}, {}]}), &json!("x")).is_success());
    }

    #[test]
    fn test_any_of_reports_causes() {
        let schema = json!({"anyOf": [{"type": "string"}, {"minimum": 10}]});
        assert!(draft4(&schema, &json!("x")).is_success());
        assert!(draft4(&schema, &json!(11)).is_success());
        let report = draft4(&schema, &json!(3));
        assert_eq!(report.len(), 1);
        assert_eq!(report.messages()[0].causes.len(), 2);
    }

    #[test]
    fn test_one_of_requires_exactly_one() {
        let schema = json!({"oneOf": [{"type": "integer"}, {"minimum": 2}]});
        assert!(draft4(&schema, &json!(1)).is_success());
        assert!(draft4(&schema, &json!(2.5)).is_success());
        let both = draft4(&schema, &json!(3));
        assert!(failures(&both)[0].contains("matched 2 out of 2"));
        let neither = draft4(&schema, &json!(1.5));
        assert!(failures(&neither)[0].contains("matched 0 out of 2"));
    }

    #[test]
    fn test_not() {
        let schema = json!({"not": {"type": "null"}});
        assert!(draft4(&schema, &json!(1)).is_success());
        assert_eq!(draft4(&schema, &json!(null)).status(), ValidationStatus::Failure);
    }

    #[test]
    fn test_draft3_extends() {
        let schema = json!({"extends": {"type": "object", "properties": {"a": {"type": "string"}}}});
        assert!(draft3(&schema, &json!({"a": "x"})).is_success());
        assert!(!draft3(&schema, &json!({"a": 1})).is_success());
    }

    #[test]
    fn test_draft3_type_union_with_schema() {
        let schema = json!({"type": ["null", {"type": "string", "minLength": 2}]});
        assert!(draft3(&schema, &json!(null)).is_success());
        assert!(draft3(&schema, &json!("ab")).is_success());
        let report = draft3(&schema, &json!("a"));
        assert_eq!(report.len(), 1);
        assert_eq!(report.messages()[0].causes.len(), 1);
        assert!(draft3(&json!({"type": "any"}), &json!([1])).is_success());
    }

    #[test]
    fn test_draft3_disallow() {
        let schema = json!({"disallow": ["string", {"type": "integer", "minimum": 5}]});
        assert!(draft3(&schema, &json!(3)).is_success());
        assert!(!draft3(&schema, &json!("x")).is_success());
        let report = draft3(&schema, &json!(7));
        assert_eq!(failures(&report), vec!["instance matched disallowed schema at index 0"]);
    }

    #[test]
    fn test_combinator_branch_ref_is_resolved() {
        let schema = json!({
            "definitions": {"s": {"type": "string"}},
            "anyOf": [{"$ref": "#/definitions/s"}, {"type": "null"}]
        });
        assert!(draft4(&schema, &json!("x")).is_success());
        assert!(!draft4(&schema, &json!(1)).is_success());
    }

    #[test]
    fn test_any_of_dangling_member_is_error_beside_sibling_failures() {
        let schema = json!({"anyOf": [{"$ref": "#/definitions/missing"}, {"type": "string"}]});
        let report = draft4(&schema, &json!(1));
        assert_eq!(report.status(), ValidationStatus::Error);
        assert_eq!(report.len(), 2);
        assert_eq!(report.messages()[0].level, ValidationStatus::Error);
        assert!(failures(&report)[0].contains("#/definitions/missing"));
        assert_eq!(report.messages()[1].level, ValidationStatus::Failure);
        assert_eq!(report.messages()[1].keyword.as_deref(), Some("anyOf"));
        assert_eq!(report.messages()[1].causes.len(), 1);
    }

    #[test]
    fn test_any_of_error_survives_matching_sibling() {
        let schema = json!({"anyOf": [{"$ref": "#/nope"}, {"type": "integer"}]});
        let report = draft4(&schema, &json!(1));
        assert_eq!(report.status(), ValidationStatus::Error);
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_all_of_dangling_member_keeps_sibling_property_failures() {
        let schema = json!({
            "properties": {
                "a": {"type": "string"},
                "b": {"allOf": [{"type": "integer"}, {"$ref": "#/nope"}]}
            }
        });
        let report = draft4(&schema, &json!({"a": 1, "b": 2}));
        assert_eq!(report.status(), ValidationStatus::Error);
        let levels: Vec<(String, ValidationStatus)> = report
            .messages()
            .iter()
            .map(|m| (m.instance_path.to_string(), m.level))
            .collect();
        assert_eq!(
            levels,
            vec![
                ("/a".to_string(), ValidationStatus::Failure),
                ("/b".to_string(), ValidationStatus::Error),
            ]
        );
    }

    #[test]
    fn test_one_of_dangling_member_does_not_count_as_match() {
        let schema = json!({"oneOf": [{"$ref": "#/nope"}, {"type": "integer"}, {"minimum": 0}]});
        let report = draft4(&schema, &json!(1));
        assert_eq!(report.status(), ValidationStatus::Error);
        assert!(failures(&report)[1].contains("matched 2 out of 3"));
    }

    #[test]
    fn test_not_with_dangling_member_is_error_only() {
        let report = draft4(&json!({"not": {"$ref": "#/nope"}}), &json!(null));
        assert_eq!(report.status(), ValidationStatus::Error);
        assert_eq!(report.len(), 1);
    }
}
