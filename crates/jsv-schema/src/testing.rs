//! Shorthands for unit tests.

use serde_json::Value;

use crate::config::ValidatorConfig;
use crate::dialect::DialectKind;
use crate::report::ValidationReport;
use crate::validate::SchemaValidator;

fn run(kind: DialectKind, schema: &Value, instance: &Value) -> ValidationReport {
    SchemaValidator::new(ValidatorConfig::default().with_default_dialect(kind))
        .validate(schema, instance)
}

/// Validate with draft 3 as the default dialect.
pub(crate) fn draft3(schema: &Value, instance: &Value) -> ValidationReport {
    run(DialectKind::Draft3, schema, instance)
}

/// Validate with draft 4 as the default dialect.
pub(crate) fn draft4(schema: &Value, instance: &Value) -> ValidationReport {
    run(DialectKind::Draft4, schema, instance)
}

/// The message texts of a report, top level only.
pub(crate) fn failures(report: &ValidationReport) -> Vec<&str> {
    report.messages().iter().map(|m| m.message.as_str()).collect()
}
