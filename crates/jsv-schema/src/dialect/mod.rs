//! # Dialects — Keyword Tables per Draft
//!
//! A [`Dialect`] is an immutable table from keyword name to
//! [`KeywordSpec`], plus the format attributes the `format` keyword can
//! use. Two ship with the crate: [`Dialect::draft3`] and
//! [`Dialect::draft4`]. Custom keywords are added with
//! [`Dialect::with_keyword`] before the dialect is handed to a validator.
//!
//! A [`DialectSet`] picks the dialect for a schema document from its root
//! `$schema`, falling back to a configured default.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::container::SchemaContainer;
use crate::format::FormatRegistry;
use crate::keyword::KeywordSpec;

mod draft3;
mod draft4;

/// The built-in dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialectKind {
    /// JSON Schema draft 3.
    Draft3,
    /// JSON Schema draft 4.
    #[default]
    Draft4,
}

impl DialectKind {
    /// The dialect table for this kind.
    pub fn dialect(self) -> Dialect {
        match self {
            DialectKind::Draft3 => Dialect::draft3(),
            DialectKind::Draft4 => Dialect::draft4(),
        }
    }
}

/// A named keyword table.
#[derive(Debug, Clone)]
pub struct Dialect {
    name: &'static str,
    uris: Vec<String>,
    keywords: BTreeMap<&'static str, KeywordSpec>,
    formats: Arc<FormatRegistry>,
}

impl Dialect {
    /// An empty dialect answering to `uris`.
    pub fn new(name: &'static str, uris: &[&str], formats: FormatRegistry) -> Self {
        Self {
            name,
            uris: uris.iter().map(|u| normalize_uri(u).to_string()).collect(),
            keywords: BTreeMap::new(),
            formats: Arc::new(formats),
        }
    }

    /// JSON Schema draft 3.
    pub fn draft3() -> Self {
        draft3::dialect()
    }

    /// JSON Schema draft 4.
    pub fn draft4() -> Self {
        draft4::dialect()
    }

    /// Add or replace a keyword.
    pub fn with_keyword(mut self, name: &'static str, spec: KeywordSpec) -> Self {
        self.keywords.insert(name, spec);
        self
    }

    /// Remove a keyword.
    pub fn without_keyword(mut self, name: &str) -> Self {
        self.keywords.remove(name);
        self
    }

    /// Replace the format attributes.
    pub fn with_formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = Arc::new(formats);
        self
    }

    /// Dialect name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// `$schema` URIs selecting this dialect, without trailing `#`.
    pub fn uris(&self) -> &[String] {
        &self.uris
    }

    /// The keyword entry for `name`, with the table's own copy of the name.
    pub fn keyword(&self, name: &str) -> Option<(&'static str, &KeywordSpec)> {
        self.keywords.get_key_value(name).map(|(k, v)| (*k, v))
    }

    /// Keyword names, sorted.
    pub fn keyword_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.keywords.keys().copied()
    }

    /// Format attributes.
    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    fn answers_to(&self, uri: &str) -> bool {
        let uri = normalize_uri(uri);
        self.uris.iter().any(|u| u == uri)
    }
}

fn normalize_uri(uri: &str) -> &str {
    uri.trim_end_matches('#')
}

/// The dialects a validator knows, with a default.
#[derive(Debug, Clone)]
pub struct DialectSet {
    default: Arc<Dialect>,
    dialects: Vec<Arc<Dialect>>,
}

impl DialectSet {
    /// Both built-in dialects, defaulting to `default`.
    pub fn new(default: DialectKind) -> Self {
        let draft3 = Arc::new(Dialect::draft3());
        let draft4 = Arc::new(Dialect::draft4());
        let default = match default {
            DialectKind::Draft3 => draft3.clone(),
            DialectKind::Draft4 => draft4.clone(),
        };
        Self {
            default,
            dialects: vec![draft4, draft3],
        }
    }

    /// A set with a single dialect.
    pub fn single(dialect: Dialect) -> Self {
        let dialect = Arc::new(dialect);
        Self {
            default: dialect.clone(),
            dialects: vec![dialect],
        }
    }

    /// Add a dialect, consulted before the existing ones.
    pub fn with(mut self, dialect: Dialect) -> Self {
        self.dialects.insert(0, Arc::new(dialect));
        self
    }

    /// Replace the default dialect. Dialects already in the set keep
    /// answering to their own `$schema` URIs.
    pub fn with_default(mut self, dialect: Dialect) -> Self {
        let dialect = Arc::new(dialect);
        self.dialects.push(dialect.clone());
        self.default = dialect;
        self
    }

    /// The default dialect.
    pub fn default_dialect(&self) -> &Arc<Dialect> {
        &self.default
    }

    /// The dialect named by `schema_uri`, else the default.
    pub fn select(&self, schema_uri: Option<&str>) -> &Arc<Dialect> {
        schema_uri
            .and_then(|uri| self.dialects.iter().find(|d| d.answers_to(uri)))
            .unwrap_or(&self.default)
    }

    /// The dialect for a container, from its root `$schema`.
    pub fn for_container(&self, container: &SchemaContainer) -> &Arc<Dialect> {
        self.select(container.schema_uri())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_by_schema_uri() {
        let set = DialectSet::new(DialectKind::Draft4);
        assert_eq!(set.select(None).name(), "draft4");
        assert_eq!(
            set.select(Some("http://json-schema.org/draft-03/schema#")).name(),
            "draft3"
        );
        assert_eq!(
            set.select(Some("http://json-schema.org/draft-04/schema")).name(),
            "draft4"
        );
        assert_eq!(set.select(Some("http://example.com/unknown")).name(), "draft4");
    }

    #[test]
    fn test_default_can_be_draft3() {
        let set = DialectSet::new(DialectKind::Draft3);
        assert_eq!(set.select(None).name(), "draft3");
    }

    #[test]
    fn test_tables_differ_by_draft() {
        let d3 = Dialect::draft3();
        let d4 = Dialect::draft4();
        for name in ["extends", "disallow", "divisibleBy"] {
            assert!(d3.keyword(name).is_some(), "draft3 lacks {name}");
            assert!(d4.keyword(name).is_none(), "draft4 has {name}");
        }
        for name in ["allOf", "anyOf", "oneOf", "not", "multipleOf", "minProperties"] {
            assert!(d4.keyword(name).is_some(), "draft4 lacks {name}");
            assert!(d3.keyword(name).is_none(), "draft3 has {name}");
        }
    }

    #[test]
    fn test_with_keyword_extends_table() {
        let spec = KeywordSpec::syntax_only(crate::syntax::string);
        let dialect = Dialect::draft4()
            .with_keyword("x-note", spec)
            .without_keyword("format");
        assert!(dialect.keyword("x-note").is_some());
        assert!(dialect.keyword("format").is_none());
    }
}
