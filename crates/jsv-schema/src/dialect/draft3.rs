//! JSON Schema draft 3 keyword table.
//!
//! Differs from draft 4 in `type` (unions may hold schemas and `"any"`),
//! `disallow`, `extends`, `divisibleBy`, the boolean `required` inside
//! `properties`, and single-name string `dependencies`.

use jsv_core::TypeSet;

use super::draft4::{shared, OBJECT};
use super::Dialect;
use crate::format::FormatRegistry;
use crate::keyword::{combinator, numeric, object, KeywordSpec};
use crate::syntax;

pub(super) fn dialect() -> Dialect {
    shared(Dialect::new(
        "draft3",
        &["http://json-schema.org/draft-03/schema"],
        FormatRegistry::draft3(),
    ))
    .with_keyword(
        "type",
        KeywordSpec::new(TypeSet::ALL, combinator::build_union_type, combinator::check_union_type),
    )
    .with_keyword(
        "disallow",
        KeywordSpec::new(TypeSet::ALL, combinator::build_disallow, combinator::check_union_type),
    )
    .with_keyword(
        "extends",
        KeywordSpec::new(TypeSet::ALL, combinator::build_all_of, syntax::schema_or_schema_array),
    )
    .with_keyword(
        "divisibleBy",
        KeywordSpec::new(TypeSet::NUMERIC, numeric::build_multiple, syntax::positive_number),
    )
    .with_keyword(
        "properties",
        KeywordSpec::new(OBJECT, object::build_draft3_properties, syntax::schema_map),
    )
    .with_keyword("required", KeywordSpec::syntax_only(syntax::boolean))
    .with_keyword(
        "dependencies",
        KeywordSpec::new(OBJECT, object::build_dependencies, object::check_dependencies_draft3),
    )
}
