//! Object keywords: `required` (draft-4 array form and draft-3 boolean form
//! inside `properties`), `minProperties`, `maxProperties`,
//! `additionalProperties: false` and `dependencies`.

use std::collections::{BTreeMap, BTreeSet};

use jsv_core::{JsonPointer, NodeType};
use serde_json::Value;

use super::{name_list, Keyword, KeywordInput};
use crate::context::ValidationContext;
use crate::engine::InstanceValidator;
use crate::report::ValidationReport;

/// Required member names, from either draft's syntax.
#[derive(Debug)]
pub struct RequiredKeyword {
    names: Vec<String>,
}

impl RequiredKeyword {
    fn boxed(names: Vec<String>) -> Option<Box<dyn Keyword>> {
        if names.is_empty() {
            None
        } else {
            Some(Box::new(RequiredKeyword { names }))
        }
    }
}

/// Build draft-4 `required`.
pub fn build_required(input: &KeywordInput<'_>) -> Option<Box<dyn Keyword>> {
    let names = input
        .value
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();
    RequiredKeyword::boxed(names)
}

/// Build draft-3 `properties`: collects members declaring `"required": true`.
pub fn build_draft3_properties(input: &KeywordInput<'_>) -> Option<Box<dyn Keyword>> {
    let names = input
        .value
        .as_object()?
        .iter()
        .filter(|(_, schema)| schema.get("required") == Some(&Value::Bool(true)))
        .map(|(name, _)| name.clone())
        .collect();
    RequiredKeyword::boxed(names)
}

impl Keyword for RequiredKeyword {
    fn validate(
        &self,
        _: &InstanceValidator<'_>,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        instance: &Value,
    ) {
        let Value::Object(map) = instance else {
            return;
        };
        let missing: Vec<&str> = self
            .names
            .iter()
            .filter(|name| !map.contains_key(name.as_str()))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            report.fail(
                ctx,
                format!(
                    "object has missing required properties ({})",
                    name_list(missing)
                ),
            );
        }
    }
}

/// `minProperties` or `maxProperties`.
#[derive(Debug)]
pub struct PropertyCountKeyword {
    limit: u64,
    minimum: bool,
}

/// Build `minProperties`.
pub fn build_min_properties(input: &KeywordInput<'_>) -> Option<Box<dyn Keyword>> {
    Some(Box::new(PropertyCountKeyword {
        limit: input.value.as_u64()?,
        minimum: true,
    }))
}

/// Build `maxProperties`.
pub fn build_max_properties(input: &KeywordInput<'_>) -> Option<Box<dyn Keyword>> {
    Some(Box::new(PropertyCountKeyword {
        limit: input.value.as_u64()?,
        minimum: false,
    }))
}

impl Keyword for PropertyCountKeyword {
    fn validate(
        &self,
        _: &InstanceValidator<'_>,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        instance: &Value,
    ) {
        let Value::Object(map) = instance else {
            return;
        };
        let count = map.len() as u64;
        if self.minimum && count < self.limit {
            report.fail(
                ctx,
                format!(
                    "object has too few properties (found {count} but schema requires at least {})",
                    self.limit
                ),
            );
        } else if !self.minimum && count > self.limit {
            report.fail(
                ctx,
                format!(
                    "object has too many properties (found {count} but schema requires at most {})",
                    self.limit
                ),
            );
        }
    }
}

/// `additionalProperties: false`.
#[derive(Debug)]
pub struct AdditionalPropertiesKeyword {
    properties: BTreeSet<String>,
    patterns: Vec<regress::Regex>,
}

/// Build `additionalProperties`. Only `false` checks anything here; a
/// schema value is applied during descent.
pub fn build_additional_properties(input: &KeywordInput<'_>) -> Option<Box<dyn Keyword>> {
    if input.value != &Value::Bool(false) {
        return None;
    }
    let properties = input
        .schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_default();
    let patterns = input
        .schema
        .get("patternProperties")
        .and_then(Value::as_object)
        .map(|m| {
            m.keys()
                .filter_map(|p| regress::Regex::new(p).ok())
                .collect()
        })
        .unwrap_or_default();
    Some(Box::new(AdditionalPropertiesKeyword {
        properties,
        patterns,
    }))
}

impl Keyword for AdditionalPropertiesKeyword {
    fn validate(
        &self,
        _: &InstanceValidator<'_>,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        instance: &Value,
    ) {
        let Value::Object(map) = instance else {
            return;
        };
        for name in map.keys() {
            if self.properties.contains(name)
                || self.patterns.iter().any(|re| re.find(name).is_some())
            {
                continue;
            }
            ctx.descend(name.as_str(), |ctx| {
                report.fail(
                    ctx,
                    format!("property {name:?} is not allowed by the schema (additionalProperties is false)"),
                );
            });
        }
    }
}

#[derive(Debug)]
enum Dependency {
    Members(Vec<String>),
    Schema(JsonPointer),
}

/// `dependencies`: member-list and schema dependencies.
#[derive(Debug)]
pub struct DependenciesKeyword {
    dependencies: BTreeMap<String, Dependency>,
}

/// Build `dependencies`.
pub fn build_dependencies(input: &KeywordInput<'_>) -> Option<Box<dyn Keyword>> {
    let base = input.value_pointer();
    let dependencies: BTreeMap<String, Dependency> = input
        .value
        .as_object()?
        .iter()
        .filter_map(|(name, value)| {
            let dependency = match value {
                Value::String(member) => Dependency::Members(vec![member.clone()]),
                Value::Array(members) => Dependency::Members(
                    members
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect(),
                ),
                Value::Object(_) => Dependency::Schema(base.append(name.as_str())),
                _ => return None,
            };
            Some((name.clone(), dependency))
        })
        .collect();
    if dependencies.is_empty() {
        None
    } else {
        Some(Box::new(DependenciesKeyword { dependencies }))
    }
}

/// Syntax of `dependencies`. Draft-3 also accepts a single member name.
pub fn check_dependencies(input: &KeywordInput<'_>, errors: &mut Vec<String>, allow_string: bool) {
    let Value::Object(map) = input.value else {
        errors.push(format!(
            "value has incorrect type (found {}, expected object)",
            NodeType::of(input.value)
        ));
        return;
    };
    for (name, value) in map {
        match value {
            Value::Object(_) => {}
            Value::String(_) if allow_string => {}
            Value::Array(members) if !allow_string && members.is_empty() => {
                errors.push(format!("dependency {name:?} must list at least one property"));
            }
            Value::Array(members) => crate::syntax::string_elements(members, errors),
            other => errors.push(format!(
                "dependency {name:?} has incorrect type ({})",
                NodeType::of(other)
            )),
        }
    }
}

/// Draft-3 `dependencies` syntax.
pub fn check_dependencies_draft3(input: &KeywordInput<'_>, errors: &mut Vec<String>) {
    check_dependencies(input, errors, true);
}

/// Draft-4 `dependencies` syntax.
pub fn check_dependencies_draft4(input: &KeywordInput<'_>, errors: &mut Vec<String>) {
    check_dependencies(input, errors, false);
}

impl Keyword for DependenciesKeyword {
    fn validate(
        &self,
        engine: &InstanceValidator<'_>,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        instance: &Value,
    ) {
        let Value::Object(map) = instance else {
            return;
        };
        for (name, dependency) in &self.dependencies {
            if !map.contains_key(name.as_str()) {
                continue;
            }
            match dependency {
                Dependency::Members(members) => {
                    let missing: Vec<&str> = members
                        .iter()
                        .filter(|m| !map.contains_key(m.as_str()))
                        .map(String::as_str)
                        .collect();
                    if !missing.is_empty() {
                        report.fail(
                            ctx,
                            format!(
                                "property {name:?} depends on missing properties {}",
                                name_list(missing)
                            ),
                        );
                    }
                }
                Dependency::Schema(pointer) => {
                    let sub = engine.branch(ctx, instance, pointer);
                    if sub.is_error() {
                        report.merge(sub);
                    } else if !sub.is_success() {
                        report.fail_with(
                            ctx,
                            format!("property {name:?} is present but its schema dependency is not satisfied"),
                            sub.into_messages(),
                        );
                    }
                }
            }
            if engine.should_stop(ctx, report) {
                break;
            }
        }
    }
}
