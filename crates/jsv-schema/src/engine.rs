//! # Instance Validator — Recursive Descent
//!
//! Applies one schema node to one instance node, then descends into the
//! instance's children with the subschemas the node assigns them.
//!
//! ## Algorithm
//!
//! 1. Fetch the compiled schema for `(ctx.container(), pointer)` from the
//!    [`ValidatorCache`], resolving `$ref` on a miss. A resolution error
//!    is fatal for the branch being validated.
//! 2. A node that failed syntax checking reports its errors and stops.
//! 3. Every keyword whose type set contains the instance type runs.
//! 4. Arrays descend per index; objects descend per member name. Scalars
//!    stop after their keywords.
//!
//! ## Branches
//!
//! Each child instance node and each combinator member is a branch,
//! validated by [`InstanceValidator::branch`] into its own report. A fatal
//! error inside a branch replaces that report's messages with the error
//! and gives it `Error` status; merging it into the parent carries the
//! status upward while sibling branches keep their own results.
//!
//! Subschema pointers are relative to the container of the compiled
//! schema, so the context switches container on every node. A `$ref` into
//! another document therefore carries relative references with it.

use std::sync::Arc;

use jsv_core::{JsonPointer, NodeType};
use serde_json::Value;

use crate::cache::{ChildSchemas, CompiledBody, CompiledSchema, ValidatorCache};
use crate::context::ValidationContext;
use crate::dialect::DialectSet;
use crate::error::FatalError;
use crate::registry::SchemaRegistry;
use crate::report::ValidationReport;
use crate::resolver::Resolver;

/// Borrowed view over the state a validation call needs.
#[derive(Debug, Clone, Copy)]
pub struct InstanceValidator<'v> {
    registry: &'v SchemaRegistry,
    cache: &'v ValidatorCache,
    dialects: &'v DialectSet,
}

impl<'v> InstanceValidator<'v> {
    /// A validator over `registry`, `cache` and `dialects`.
    pub fn new(
        registry: &'v SchemaRegistry,
        cache: &'v ValidatorCache,
        dialects: &'v DialectSet,
    ) -> Self {
        Self {
            registry,
            cache,
            dialects,
        }
    }

    /// Validate `instance` against the node at `pointer` in the context's
    /// current container, appending failures to `report`.
    ///
    /// # Errors
    ///
    /// A [`FatalError`] when the node itself cannot be resolved. Errors
    /// below it are contained in the branch reports merged into `report`.
    pub fn validate(
        &self,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        instance: &Value,
        pointer: &JsonPointer,
    ) -> Result<(), FatalError> {
        let compiled = self.compiled(ctx, pointer)?;
        ctx.with_schema(compiled.clone(), |ctx| {
            self.apply(ctx, report, instance, &compiled)
        });
        Ok(())
    }

    /// Validate one branch into a report of its own. A fatal error leaves
    /// the branch report holding only that error, with `Error` status.
    pub fn branch(
        &self,
        ctx: &mut ValidationContext,
        instance: &Value,
        pointer: &JsonPointer,
    ) -> ValidationReport {
        let mut sub = ValidationReport::new();
        if let Err(fatal) = self.validate(ctx, &mut sub, instance, pointer) {
            tracing::debug!(error = %fatal, "branch aborted");
            sub.abort(fatal);
        }
        sub
    }

    /// True once a fail-fast call has seen a failure.
    pub fn should_stop(&self, ctx: &ValidationContext, report: &ValidationReport) -> bool {
        ctx.fail_fast() && !report.is_success()
    }

    fn compiled(
        &self,
        ctx: &ValidationContext,
        pointer: &JsonPointer,
    ) -> Result<Arc<CompiledSchema>, FatalError> {
        let resolver = Resolver::new(self.registry);
        self.cache
            .get_or_build(
                &resolver,
                |container| self.dialects.for_container(container).clone(),
                ctx.container(),
                pointer,
            )
            .map_err(|error| FatalError {
                instance_path: ctx.path().clone(),
                error,
            })
    }

    fn apply(
        &self,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        instance: &Value,
        compiled: &CompiledSchema,
    ) {
        let (keywords, children) = match compiled.body() {
            CompiledBody::Invalid(errors) => {
                for (keyword, message) in errors {
                    ctx.with_keyword(*keyword, |ctx| {
                        report.fail(ctx, format!("invalid schema: {message}"));
                    });
                }
                return;
            }
            CompiledBody::Valid { keywords, children } => (keywords, children),
        };

        let found = NodeType::of(instance);
        let before = report.len();
        for keyword in keywords.iter().filter(|k| k.types.contains(found)) {
            ctx.with_keyword(keyword.name, |ctx| {
                keyword.validator.validate(self, ctx, report, instance)
            });
            if self.should_stop(ctx, report) {
                return;
            }
        }
        if !ctx.deep_check() && report.len() > before {
            return;
        }

        match instance {
            Value::Array(elements) => self.descend_array(ctx, report, elements, children),
            Value::Object(members) => self.descend_object(ctx, report, members, children),
            _ => {}
        }
    }

    fn descend_array(
        &self,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        elements: &[Value],
        children: &ChildSchemas,
    ) {
        for (index, element) in elements.iter().enumerate() {
            let Some(schema) = children.for_index(index) else {
                continue;
            };
            let sub = ctx.descend(index.to_string(), |ctx| self.branch(ctx, element, schema));
            report.merge(sub);
            if self.should_stop(ctx, report) {
                break;
            }
        }
    }

    fn descend_object(
        &self,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        members: &serde_json::Map<String, Value>,
        children: &ChildSchemas,
    ) {
        for (name, member) in members {
            for schema in children.for_member(name) {
                let sub = ctx.descend(name.as_str(), |ctx| self.branch(ctx, member, schema));
                report.merge(sub);
                if self.should_stop(ctx, report) {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::report::ValidationStatus;
    use crate::testing::{draft4, failures};
    use serde_json::json;

    #[test]
    fn test_children_get_extended_paths() {
        let schema = json!({
            "properties": {"list": {"items": {"type": "integer"}}}
        });
        let report = draft4(&schema, &json!({"list": [1, "two", 3]}));
        assert_eq!(report.len(), 1);
        assert_eq!(report.messages()[0].instance_path.to_string(), "/list/1");
    }

    #[test]
    fn test_property_and_pattern_both_apply() {
        let schema = json!({
            "properties": {"aa": {"minLength": 2}},
            "patternProperties": {"a": {"maxLength": 3}}
        });
        assert!(draft4(&schema, &json!({"aa": "abc"})).is_success());
        assert!(!draft4(&schema, &json!({"aa": "a"})).is_success());
        assert!(!draft4(&schema, &json!({"aa": "abcd"})).is_success());
    }

    #[test]
    fn test_additional_properties_schema_only_without_match() {
        let schema = json!({
            "properties": {"a": {}},
            "additionalProperties": {"type": "boolean"}
        });
        assert!(draft4(&schema, &json!({"a": 1, "b": true})).is_success());
        let report = draft4(&schema, &json!({"a": 1, "b": 2}));
        assert_eq!(report.messages()[0].instance_path.to_string(), "/b");
    }

    #[test]
    fn test_keywords_skip_other_types() {
        let schema = json!({"minLength": 3, "minimum": 10, "required": ["x"]});
        assert!(draft4(&schema, &json!(true)).is_success());
        assert!(draft4(&schema, &json!(null)).is_success());
    }

    #[test]
    fn test_invalid_schema_reported_as_failure() {
        let schema = json!({"properties": {"a": {"minLength": "three"}}});
        let report = draft4(&schema, &json!({"a": "x"}));
        assert_eq!(report.status(), ValidationStatus::Failure);
        assert_eq!(report.messages()[0].keyword.as_deref(), Some("minLength"));
        assert!(failures(&report)[0].starts_with("invalid schema:"));
        assert!(draft4(&schema, &json!({"b": "x"})).is_success());
    }

    #[test]
    fn test_shallow_check_skips_children_of_failed_node() {
        let schema = json!({
            "required": ["id"],
            "properties": {"name": {"type": "string"}}
        });
        let report = draft4(&schema, &json!({"name": 5}));
        assert_eq!(report.len(), 1);
        assert!(failures(&report)[0].contains("missing required"));
    }

    #[test]
    fn test_ref_to_root_recurses_by_instance_depth() {
        let schema = json!({
            "type": "object",
            "properties": {"child": {"$ref": "#"}}
        });
        let instance = json!({"child": {"child": {"child": {}}}});
        assert!(draft4(&schema, &instance).is_success());
        let report = draft4(&schema, &json!({"child": {"child": 3}}));
        assert_eq!(report.messages()[0].instance_path.to_string(), "/child/child");
    }
}
