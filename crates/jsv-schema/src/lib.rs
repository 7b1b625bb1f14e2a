//! # jsv-schema — JSON Schema Validation Engine
//!
//! Validates JSON (and YAML) instances against JSON Schema draft 3 and
//! draft 4 schemas.
//!
//! ## Architecture
//!
//! ```text
//! SchemaValidator ─┬─ SchemaRegistry ── DocumentSource (map, dir, file:)
//!                  ├─ ValidatorCache ── Resolver ($ref chains, loop check)
//!                  └─ DialectSet ────── keyword tables, format attributes
//!
//! InstanceValidator: compiled schema → keywords → children (recursive)
//! ```
//!
//! - [`container`]: one parsed schema document with its `id` index.
//! - [`registry`]: locator → container, fetching through a
//!   [`DocumentSource`] on a miss.
//! - [`resolver`]: follows `$ref` chains to a concrete schema node.
//! - [`cache`]: compiled keyword validators per schema node.
//! - [`engine`]: the recursive descent.
//! - [`report`] / [`context`]: per-call output and traversal state.
//!
//! ## Crate Policy
//!
//! - Depends only on `jsv-core` internally.
//! - Schema and instance problems are report entries, never panics or
//!   `Err`s. A resolution failure aborts the branch it occurs in and lifts
//!   the report to status `error`.
//! - No global state: every cache belongs to one [`SchemaValidator`].

pub mod bounded;
pub mod cache;
pub mod config;
pub mod container;
pub mod context;
pub mod dialect;
pub mod document;
pub mod engine;
pub mod error;
pub mod format;
pub mod keyword;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod syntax;
pub mod validate;

#[cfg(test)]
mod testing;

pub use cache::{CacheStats, CompiledSchema, ValidatorCache};
pub use config::ValidatorConfig;
pub use container::{AddressingMode, SchemaContainer};
pub use context::ValidationContext;
pub use dialect::{Dialect, DialectKind, DialectSet};
pub use document::{load_document, yaml_to_json_value};
pub use engine::InstanceValidator;
pub use error::{FatalError, ResolutionError, SchemaValidationError, SourceError};
pub use format::{FormatAttribute, FormatRegistry};
pub use keyword::{Keyword, KeywordInput, KeywordSpec};
pub use registry::{
    ChainSource, DirectorySource, DocumentSource, FileSource, MapSource, NoRemoteSource,
    RegistryStats, SchemaRegistry,
};
pub use report::{ValidationMessage, ValidationReport, ValidationStatus};
pub use resolver::{ResolvedSchema, Resolver};
pub use validate::SchemaValidator;
