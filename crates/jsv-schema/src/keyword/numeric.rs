//! Numeric keywords: `minimum`/`maximum` with their exclusion flags, and
//! `multipleOf` (draft-4) / `divisibleBy` (draft-3).
//!
//! All comparisons go through [`jsv_core::compare_numbers`] and
//! [`jsv_core::is_multiple_of`], which never round through `f64`.

use std::cmp::Ordering;

use jsv_core::{compare_numbers, is_multiple_of};
use serde_json::{Number, Value};

use super::{Keyword, KeywordInput};
use crate::context::ValidationContext;
use crate::engine::InstanceValidator;
use crate::report::ValidationReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Lower,
    Upper,
}

/// `minimum` or `maximum`, with the sibling exclusion flag folded in.
#[derive(Debug)]
pub struct LimitKeyword {
    bound: Bound,
    limit: Number,
    exclusive: bool,
}

fn build_limit(input: &KeywordInput<'_>, bound: Bound, flag: &str) -> Option<Box<dyn Keyword>> {
    let limit = match input.value {
        Value::Number(n) => n.clone(),
        _ => return None,
    };
    let exclusive = input
        .schema
        .get(flag)
        .and_then(Value::as_bool)
        .unwrap_or(false);
    Some(Box::new(LimitKeyword {
        bound,
        limit,
        exclusive,
    }))
}

/// Build `minimum`.
pub fn build_minimum(input: &KeywordInput<'_>) -> Option<Box<dyn Keyword>> {
    build_limit(input, Bound::Lower, "exclusiveMinimum")
}

/// Build `maximum`.
pub fn build_maximum(input: &KeywordInput<'_>) -> Option<Box<dyn Keyword>> {
    build_limit(input, Bound::Upper, "exclusiveMaximum")
}

impl Keyword for LimitKeyword {
    fn validate(
        &self,
        _: &InstanceValidator<'_>,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        instance: &Value,
    ) {
        let Value::Number(n) = instance else {
            return;
        };
        let ord = compare_numbers(n, &self.limit);
        let message = match (self.bound, ord, self.exclusive) {
            (Bound::Lower, Ordering::Less, _) => "numeric instance is lower than the required minimum",
            (Bound::Lower, Ordering::Equal, true) => {
                "numeric instance is not strictly greater than the required minimum"
            }
            (Bound::Upper, Ordering::Greater, _) => {
                "numeric instance is greater than the required maximum"
            }
            (Bound::Upper, Ordering::Equal, true) => {
                "numeric instance is not strictly lower than the required maximum"
            }
            _ => return,
        };
        let name = match self.bound {
            Bound::Lower => "minimum",
            Bound::Upper => "maximum",
        };
        report.fail(ctx, format!("{message} ({name}: {}, found: {n})", self.limit));
    }
}

/// `multipleOf` / `divisibleBy`.
#[derive(Debug)]
pub struct MultipleKeyword {
    divisor: Number,
}

/// Build `multipleOf` or `divisibleBy`.
pub fn build_multiple(input: &KeywordInput<'_>) -> Option<Box<dyn Keyword>> {
    match input.value {
        Value::Number(divisor) => Some(Box::new(MultipleKeyword {
            divisor: divisor.clone(),
        })),
        _ => None,
    }
}

impl Keyword for MultipleKeyword {
    fn validate(
        &self,
        _: &InstanceValidator<'_>,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        instance: &Value,
    ) {
        if let Value::Number(n) = instance {
            if !is_multiple_of(n, &self.divisor) {
                report.fail(
                    ctx,
                    format!(
                        "remainder of division is not zero ({n} / {})",
                        self.divisor
                    ),
                );
            }
        }
    }
}
