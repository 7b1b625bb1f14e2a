//! # Validation Context
//!
//! Mutable per-call state threaded through the recursive descent: the
//! container the current schema node belongs to, the instance path, the
//! compiled schema and keyword currently running, and the call's flags.
//!
//! Every change is scoped. [`ValidationContext::descend`] and
//! [`ValidationContext::with_schema`] run a closure and restore the prior
//! state when it returns, whether the closure succeeded or not.

use std::sync::Arc;

use jsv_core::JsonPointer;

use crate::cache::CompiledSchema;
use crate::container::SchemaContainer;

/// Per-call traversal state.
#[derive(Debug)]
pub struct ValidationContext {
    container: Arc<SchemaContainer>,
    path: JsonPointer,
    schema: Option<Arc<CompiledSchema>>,
    keyword: Option<&'static str>,
    deep_check: bool,
    fail_fast: bool,
}

impl ValidationContext {
    /// A context positioned at the instance root, in `container`.
    pub fn new(container: Arc<SchemaContainer>, deep_check: bool, fail_fast: bool) -> Self {
        Self {
            container,
            path: JsonPointer::root(),
            schema: None,
            keyword: None,
            deep_check,
            fail_fast,
        }
    }

    /// Container owning the schema node being applied.
    pub fn container(&self) -> &Arc<SchemaContainer> {
        &self.container
    }

    /// Current instance path.
    pub fn path(&self) -> &JsonPointer {
        &self.path
    }

    /// Compiled schema currently being applied.
    pub fn schema(&self) -> Option<&Arc<CompiledSchema>> {
        self.schema.as_ref()
    }

    /// Rendered location of the current schema node.
    pub fn schema_location(&self) -> Option<&str> {
        self.schema.as_ref().map(|s| s.location())
    }

    /// Keyword currently running.
    pub fn keyword(&self) -> Option<&'static str> {
        self.keyword
    }

    /// Whether children of a failed container are still visited.
    pub fn deep_check(&self) -> bool {
        self.deep_check
    }

    /// Whether the call stops at the first failure.
    pub fn fail_fast(&self) -> bool {
        self.fail_fast
    }

    /// Run `f` with the instance path extended by `token`.
    pub fn descend<T>(&mut self, token: impl Into<String>, f: impl FnOnce(&mut Self) -> T) -> T {
        let child = self.path.append(token);
        let saved = std::mem::replace(&mut self.path, child);
        let out = f(self);
        self.path = saved;
        out
    }

    /// Run `f` with `schema` (and its container) as the current schema.
    pub fn with_schema<T>(
        &mut self,
        schema: Arc<CompiledSchema>,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        let saved_container = std::mem::replace(&mut self.container, schema.container().clone());
        let saved_schema = self.schema.replace(schema);
        let saved_keyword = self.keyword.take();
        let out = f(self);
        self.container = saved_container;
        self.schema = saved_schema;
        self.keyword = saved_keyword;
        out
    }

    /// Run `f` with `keyword` recorded as the running keyword.
    pub fn with_keyword<T>(&mut self, keyword: &'static str, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.keyword.replace(keyword);
        let out = f(self);
        self.keyword = saved;
        out
    }
}
