//! # Keyword Validators
//!
//! A keyword validator is built once from one keyword value in one schema
//! node and then shared by every validation that reaches that node. The
//! dialect tables map each keyword name to a [`KeywordSpec`]: the instance
//! types it applies to, a syntax check for its value, and an optional
//! constructor.
//!
//! ## Design
//!
//! Constructors are plain `fn` pointers resolved when a dialect table is
//! assembled. A constructor returning `None` means the keyword has nothing
//! to check at its own level (for example `properties`, whose work happens
//! during descent, or `uniqueItems: false`).
//!
//! Constructors only run on values that passed the syntax check, so they
//! can rely on the value's shape.
//!
//! Keyword validators never see `$ref`: subschemas are stored as pointers
//! and handed back to the [`InstanceValidator`], which resolves them.

use std::fmt;

use jsv_core::{JsonPointer, TypeSet};
use serde_json::{Map, Value};

use crate::context::ValidationContext;
use crate::engine::InstanceValidator;
use crate::format::FormatRegistry;
use crate::report::ValidationReport;

pub mod array;
pub mod combinator;
pub mod common;
pub mod numeric;
pub mod object;
pub mod string;

/// A compiled check for one keyword.
pub trait Keyword: Send + Sync + fmt::Debug {
    /// Check `instance`, appending failures to `report`. Subschemas go
    /// through [`InstanceValidator::branch`], which turns a resolution error
    /// into an `Error`-status report for that branch.
    fn validate(
        &self,
        engine: &InstanceValidator<'_>,
        ctx: &mut ValidationContext,
        report: &mut ValidationReport,
        instance: &Value,
    );
}

/// What a keyword constructor or syntax check sees.
#[derive(Debug, Clone, Copy)]
pub struct KeywordInput<'a> {
    /// Keyword name, as it appears in the dialect table.
    pub name: &'static str,
    /// The keyword's value.
    pub value: &'a Value,
    /// The whole schema node, for keywords that read their siblings.
    pub schema: &'a Map<String, Value>,
    /// Address of the schema node in its container.
    pub pointer: &'a JsonPointer,
    /// Format attributes of the active dialect.
    pub formats: &'a FormatRegistry,
}

impl KeywordInput<'_> {
    /// Address of the keyword value.
    pub fn value_pointer(&self) -> JsonPointer {
        self.pointer.append(self.name)
    }

    /// Address of every schema element of an array-valued keyword.
    pub fn schema_elements(&self) -> Vec<JsonPointer> {
        let base = self.value_pointer();
        match self.value {
            Value::Array(items) => (0..items.len()).map(|i| base.append_index(i)).collect(),
            Value::Object(_) => vec![base],
            _ => Vec::new(),
        }
    }
}

/// Builds a keyword validator from a well-formed value.
pub type BuildFn = fn(&KeywordInput<'_>) -> Option<Box<dyn Keyword>>;

/// Appends syntax errors for a keyword value.
pub type SyntaxFn = fn(&KeywordInput<'_>, &mut Vec<String>);

/// One row of a dialect's keyword table.
#[derive(Clone, Copy)]
pub struct KeywordSpec {
    /// Instance types the keyword applies to.
    pub types: TypeSet,
    /// Constructor; `None` for keywords checked only during descent.
    pub build: Option<BuildFn>,
    /// Syntax check for the keyword value.
    pub syntax: SyntaxFn,
}

impl KeywordSpec {
    /// A keyword with a validator.
    pub const fn new(types: TypeSet, build: BuildFn, syntax: SyntaxFn) -> Self {
        Self {
            types,
            build: Some(build),
            syntax,
        }
    }

    /// A keyword that is only syntax-checked.
    pub const fn syntax_only(syntax: SyntaxFn) -> Self {
        Self {
            types: TypeSet::ALL,
            build: None,
            syntax,
        }
    }
}

impl fmt::Debug for KeywordSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeywordSpec")
            .field("types", &self.types)
            .field("builds", &self.build.is_some())
            .finish()
    }
}

/// Render a list of names as a JSON array for messages.
pub(crate) fn name_list<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let quoted: Vec<String> = names.into_iter().map(|n| format!("{n:?}")).collect();
    format!("[{}]", quoted.join(", "))
}
