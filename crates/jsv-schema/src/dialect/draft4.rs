//! JSON Schema draft 4 keyword table.

use jsv_core::{NodeType, TypeSet};

use super::Dialect;
use crate::format::FormatRegistry;
use crate::keyword::{array, combinator, common, numeric, object, string, KeywordSpec};
use crate::syntax;

pub(super) const ARRAY: TypeSet = TypeSet::of(&[NodeType::Array]);
pub(super) const OBJECT: TypeSet = TypeSet::of(&[NodeType::Object]);
pub(super) const STRING: TypeSet = TypeSet::of(&[NodeType::String]);

/// Keywords whose meaning is the same in drafts 3 and 4.
pub(super) fn shared(dialect: Dialect) -> Dialect {
    dialect
        .with_keyword("$schema", KeywordSpec::syntax_only(syntax::string))
        .with_keyword("id", KeywordSpec::syntax_only(syntax::string))
        .with_keyword("title", KeywordSpec::syntax_only(syntax::string))
        .with_keyword("description", KeywordSpec::syntax_only(syntax::string))
        .with_keyword("default", KeywordSpec::syntax_only(syntax::any))
        .with_keyword("definitions", KeywordSpec::syntax_only(syntax::schema_map))
        .with_keyword("enum", KeywordSpec::new(TypeSet::ALL, common::build_enum, common::check_enum))
        .with_keyword("format", KeywordSpec::new(TypeSet::ALL, common::build_format, syntax::string))
        // numbers
        .with_keyword("minimum", KeywordSpec::new(TypeSet::NUMERIC, numeric::build_minimum, syntax::number))
        .with_keyword("maximum", KeywordSpec::new(TypeSet::NUMERIC, numeric::build_maximum, syntax::number))
        .with_keyword("exclusiveMinimum", KeywordSpec::syntax_only(syntax::exclusive_flag))
        .with_keyword("exclusiveMaximum", KeywordSpec::syntax_only(syntax::exclusive_flag))
        // strings
        .with_keyword("minLength", KeywordSpec::new(STRING, string::build_min_length, syntax::non_negative_integer))
        .with_keyword("maxLength", KeywordSpec::new(STRING, string::build_max_length, syntax::non_negative_integer))
        .with_keyword("pattern", KeywordSpec::new(STRING, string::build_pattern, syntax::regex))
        // arrays
        .with_keyword("items", KeywordSpec::syntax_only(syntax::schema_or_schema_array))
        .with_keyword(
            "additionalItems",
            KeywordSpec::new(ARRAY, array::build_additional_items, syntax::boolean_or_schema),
        )
        .with_keyword("minItems", KeywordSpec::new(ARRAY, array::build_min_items, syntax::non_negative_integer))
        .with_keyword("maxItems", KeywordSpec::new(ARRAY, array::build_max_items, syntax::non_negative_integer))
        .with_keyword("uniqueItems", KeywordSpec::new(ARRAY, array::build_unique_items, syntax::boolean))
        // objects
        .with_keyword("patternProperties", KeywordSpec::syntax_only(syntax::pattern_schema_map))
        .with_keyword(
            "additionalProperties",
            KeywordSpec::new(OBJECT, object::build_additional_properties, syntax::boolean_or_schema),
        )
}

pub(super) fn dialect() -> Dialect {
    shared(Dialect::new(
        "draft4",
        &["http://json-schema.org/draft-04/schema"],
        FormatRegistry::draft4(),
    ))
    .with_keyword("type", KeywordSpec::new(TypeSet::ALL, common::build_type, common::check_type))
    .with_keyword("multipleOf", KeywordSpec::new(TypeSet::NUMERIC, numeric::build_multiple, syntax::positive_number))
    .with_keyword("properties", KeywordSpec::syntax_only(syntax::schema_map))
    .with_keyword("required", KeywordSpec::new(OBJECT, object::build_required, syntax::string_array))
    .with_keyword("minProperties", KeywordSpec::new(OBJECT, object::build_min_properties, syntax::non_negative_integer))
    .with_keyword("maxProperties", KeywordSpec::new(OBJECT, object::build_max_properties, syntax::non_negative_integer))
    .with_keyword(
        "dependencies",
        KeywordSpec::new(OBJECT, object::build_dependencies, object::check_dependencies_draft4),
    )
    .with_keyword("allOf", KeywordSpec::new(TypeSet::ALL, combinator::build_all_of, syntax::schema_array))
    .with_keyword("anyOf", KeywordSpec::new(TypeSet::ALL, combinator::build_any_of, syntax::schema_array))
    .with_keyword("oneOf", KeywordSpec::new(TypeSet::ALL, combinator::build_one_of, syntax::schema_array))
    .with_keyword("not", KeywordSpec::new(TypeSet::ALL, combinator::build_not, syntax::schema))
}
