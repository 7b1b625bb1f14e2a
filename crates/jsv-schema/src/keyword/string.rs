//! String keywords: `minLength`, `maxLength`, `pattern`.
//!
//! Lengths count Unicode scalar values (`char`s), so `"\u{1F600}"` has
//! length 1 even though it is two UTF-16 code units.

use serde_json::Value;

use super::{Keyword, KeywordInput};
use crate::context::ValidationContext;
use crate::engine::InstanceValidator;
use crate::report::ValidationReport;

/// `minLength` or `maxLength`.
#[derive(Debug)]
pub struct LengthKeyword {
    limit: u64,
    minimum: bool,
}

/// Build `minLength`.
pub fn build_min_length(input: &KeywordInput<'_>) -> Option<Box<dyn Keyword>> {
    let limit = input.value.as_u64()?;
    Some(Box::new(LengthKeyword {
        limit,
        minimum: true,
    }))
}

/// Build `maxLength`.
pub fn build_max_length(input: &KeywordInput<'_>) -> Option<Box<dyn Keyword>> {
    let limit = input.value.as_u64()?;
    Some(Box::new(LengthKeyword {
        limit,
        minimum: false,
    }))
}

impl Keyword for LengthKeyword {
    fn validate(
        &self,
        _: &InstanceValidator<'_>,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        instance: &Value,
    ) {
        let Value::String(s) = instance else {
            return;
        };
        let length = s.chars().count() as u64;
        if self.minimum && length < self.limit {
            report.fail(
                ctx,
                format!(
                    "string {instance} is too short (length: {length}, required minimum: {})",
                    self.limit
                ),
            );
        } else if !self.minimum && length > self.limit {
            report.fail(
                ctx,
                format!(
                    "string {instance} is too long (length: {length}, maximum allowed: {})",
                    self.limit
                ),
            );
        }
    }
}

/// `pattern`: an unanchored ECMA-262 search.
#[derive(Debug)]
pub struct PatternKeyword {
    source: String,
    regex: regress::Regex,
}

/// Build `pattern`.
pub fn build_pattern(input: &KeywordInput<'_>) -> Option<Box<dyn Keyword>> {
    let source = input.value.as_str()?;
    let regex = regress::Regex::new(source).ok()?;
    Some(Box::new(PatternKeyword {
        source: source.to_string(),
        regex,
    }))
}

impl Keyword for PatternKeyword {
    fn validate(
        &self,
        _: &InstanceValidator<'_>,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        instance: &Value,
    ) {
        if let Value::String(s) = instance {
            if self.regex.find(s).is_none() {
                report.fail(
                    ctx,
                    format!("ECMA 262 regex {:?} does not match input string {instance}", self.source),
                );
            }
        }
    }
}
