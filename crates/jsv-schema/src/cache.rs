//! # Validator Cache — Compiled Schema Nodes
//!
//! Compiling a schema node means resolving its `$ref` chain, checking the
//! syntax of every keyword it carries, and building one validator per
//! keyword the dialect knows. The result, a [`CompiledSchema`], is
//! immutable and shared by every validation that reaches the node.
//!
//! ## Keys
//!
//! A schema node is identified by its container (locator plus content
//! digest) and its pointer within it. The same raw JSON reached through
//! two documents is two nodes, since relative references inside it mean
//! different things.
//!
//! ## Two levels
//!
//! - `by_reference`: the node as reached, possibly a `$ref`.
//! - `by_target`: the node after `$ref` resolution.
//!
//! Two references to one target share one compiled schema, so syntax
//! checking and keyword construction happen once per target.
//!
//! A `by_reference` entry is only stored when the chain stays inside the
//! referring container. Such a chain depends on nothing but that
//! container's content, which its key already pins. A chain that reaches
//! another document is resolved again on every lookup, because the
//! registry may since map that locator to different content; the target
//! key carries the digest, so unchanged content still hits `by_target`.
//!
//! Resolution
//! failures are never cached: a fatal error is reported on every call that
//! hits it, and a document that failed to fetch is fetched again.
//!
//! Builds run outside the cache lock. Two threads missing on the same key
//! may both build; both results are equivalent and the later insert wins.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use jsv_core::{JsonPointer, TypeSet};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::bounded::BoundedCache;
use crate::container::{ContainerKey, SchemaContainer};
use crate::dialect::Dialect;
use crate::error::ResolutionError;
use crate::keyword::{Keyword, KeywordInput};
use crate::resolver::{ResolvedSchema, Resolver};

/// Identity of one schema node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaKey {
    container: ContainerKey,
    pointer: JsonPointer,
}

impl SchemaKey {
    /// Key for the node at `pointer` in `container`.
    pub fn new(container: &SchemaContainer, pointer: &JsonPointer) -> Self {
        Self {
            container: container.key(),
            pointer: pointer.clone(),
        }
    }
}

/// One keyword validator with its applicability.
pub struct CompiledKeyword {
    /// Keyword name.
    pub name: &'static str,
    /// Instance types it applies to.
    pub types: TypeSet,
    /// The validator.
    pub validator: Box<dyn Keyword>,
}

impl fmt::Debug for CompiledKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledKeyword")
            .field("name", &self.name)
            .field("validator", &self.validator)
            .finish()
    }
}

/// Subschema for array elements.
#[derive(Debug, Clone, Default)]
pub enum Items {
    /// No `items`: elements are unconstrained.
    #[default]
    None,
    /// One schema for every element.
    Single(JsonPointer),
    /// One schema per position.
    Tuple(Vec<JsonPointer>),
}

/// Subschemas applied to the children of container instances.
#[derive(Debug, Default)]
pub struct ChildSchemas {
    /// `items`.
    pub items: Items,
    /// `additionalItems`, when it is a schema.
    pub additional_items: Option<JsonPointer>,
    /// `properties`.
    pub properties: BTreeMap<String, JsonPointer>,
    /// `patternProperties`, compiled.
    pub pattern_properties: Vec<(regress::Regex, JsonPointer)>,
    /// `additionalProperties`, when it is a schema.
    pub additional_properties: Option<JsonPointer>,
}

impl ChildSchemas {
    fn from_node(node: &Map<String, Value>, pointer: &JsonPointer) -> Self {
        let items = match node.get("items") {
            Some(Value::Object(_)) => Items::Single(pointer.append("items")),
            Some(Value::Array(elements)) => {
                let base = pointer.append("items");
                Items::Tuple((0..elements.len()).map(|i| base.append_index(i)).collect())
            }
            _ => Items::None,
        };
        let schema_at = |keyword: &str| match node.get(keyword) {
            Some(Value::Object(_)) => Some(pointer.append(keyword)),
            _ => None,
        };
        let members = |keyword: &str| -> Vec<(String, JsonPointer)> {
            let base = pointer.append(keyword);
            node.get(keyword)
                .and_then(Value::as_object)
                .map(|m| {
                    m.keys()
                        .map(|name| (name.clone(), base.append(name.as_str())))
                        .collect()
                })
                .unwrap_or_default()
        };

        let pattern_properties = members("patternProperties")
            .into_iter()
            .filter_map(|(pattern, ptr)| regress::Regex::new(&pattern).ok().map(|re| (re, ptr)))
            .collect();

        Self {
            items,
            additional_items: schema_at("additionalItems"),
            properties: members("properties").into_iter().collect(),
            pattern_properties,
            additional_properties: schema_at("additionalProperties"),
        }
    }

    /// Schemas for the array element at `index`.
    pub fn for_index(&self, index: usize) -> Option<&JsonPointer> {
        match &self.items {
            Items::None => None,
            Items::Single(schema) => Some(schema),
            Items::Tuple(schemas) => schemas.get(index).or(self.additional_items.as_ref()),
        }
    }

    /// Schemas for the object member `name`: the `properties` match plus
    /// every matching pattern, or `additionalProperties` if there are none.
    pub fn for_member(&self, name: &str) -> Vec<&JsonPointer> {
        let mut schemas: Vec<&JsonPointer> = self.properties.get(name).into_iter().collect();
        schemas.extend(
            self.pattern_properties
                .iter()
                .filter(|(re, _)| re.find(name).is_some())
                .map(|(_, ptr)| ptr),
        );
        if schemas.is_empty() {
            schemas.extend(self.additional_properties.as_ref());
        }
        schemas
    }
}

/// What compilation produced.
#[derive(Debug)]
pub enum CompiledBody {
    /// The node failed syntax checking: `(keyword, message)` pairs.
    Invalid(Vec<(&'static str, String)>),
    /// Keyword validators and child schemas.
    Valid {
        /// Keyword validators, in keyword name order.
        keywords: Vec<CompiledKeyword>,
        /// Subschemas for descent.
        children: ChildSchemas,
    },
}

/// An immutable, shareable compiled schema node.
#[derive(Debug)]
pub struct CompiledSchema {
    container: Arc<SchemaContainer>,
    pointer: JsonPointer,
    location: String,
    dialect: &'static str,
    body: CompiledBody,
}

impl CompiledSchema {
    /// Compile the resolved node with `dialect`.
    pub fn compile(resolved: ResolvedSchema, dialect: &Dialect) -> Self {
        let ResolvedSchema { container, pointer } = resolved;
        let location = if pointer.is_empty() {
            format!("{}#", container.locator())
        } else {
            container.reference_to(&pointer).to_string()
        };
        let body = match container.node(&pointer).and_then(Value::as_object) {
            Some(node) => compile_body(node, &pointer, dialect),
            None => CompiledBody::Invalid(Vec::new()),
        };
        Self {
            container,
            pointer,
            location,
            dialect: dialect.name(),
            body,
        }
    }

    /// Container owning the node.
    pub fn container(&self) -> &Arc<SchemaContainer> {
        &self.container
    }

    /// Address of the node.
    pub fn pointer(&self) -> &JsonPointer {
        &self.pointer
    }

    /// Rendered location, `locator#pointer`.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Name of the dialect it was compiled with.
    pub fn dialect(&self) -> &'static str {
        self.dialect
    }

    /// Compilation result.
    pub fn body(&self) -> &CompiledBody {
        &self.body
    }

    /// True if the node failed syntax checking.
    pub fn is_invalid(&self) -> bool {
        matches!(self.body, CompiledBody::Invalid(_))
    }
}

fn compile_body(node: &Map<String, Value>, pointer: &JsonPointer, dialect: &Dialect) -> CompiledBody {
    let inputs: Vec<_> = node
        .iter()
        .filter_map(|(name, value)| {
            dialect.keyword(name).map(|(name, spec)| {
                (
                    spec,
                    KeywordInput {
                        name,
                        value,
                        schema: node,
                        pointer,
                        formats: dialect.formats(),
                    },
                )
            })
        })
        .collect();

    let mut errors = Vec::new();
    for (spec, input) in &inputs {
        let mut messages = Vec::new();
        (spec.syntax)(input, &mut messages);
        errors.extend(messages.into_iter().map(|m| (input.name, m)));
    }
    if !errors.is_empty() {
        tracing::debug!(
            pointer = %pointer,
            errors = errors.len(),
            "schema node failed syntax check"
        );
        return CompiledBody::Invalid(errors);
    }

    let keywords = inputs
        .iter()
        .filter_map(|(spec, input)| {
            let build = spec.build?;
            build(input).map(|validator| CompiledKeyword {
                name: input.name,
                types: spec.types,
                validator,
            })
        })
        .collect();
    CompiledBody::Valid {
        keywords,
        children: ChildSchemas::from_node(node, pointer),
    }
}

/// Cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    /// Lookups answered without compiling.
    pub hits: u64,
    /// Lookups that had to resolve.
    pub misses: u64,
    /// Nodes compiled.
    pub builds: u64,
}

/// Bounded cache of compiled schema nodes.
#[derive(Debug)]
pub struct ValidatorCache {
    by_reference: BoundedCache<SchemaKey, Arc<CompiledSchema>>,
    by_target: BoundedCache<SchemaKey, Arc<CompiledSchema>>,
    hits: AtomicU64,
    misses: AtomicU64,
    builds: AtomicU64,
}

impl ValidatorCache {
    /// A cache holding at most `capacity` entries per level.
    pub fn new(capacity: usize) -> Self {
        Self {
            by_reference: BoundedCache::new(capacity),
            by_target: BoundedCache::new(capacity),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            builds: AtomicU64::new(0),
        }
    }

    /// The compiled schema for the node at `pointer` in `container`.
    ///
    /// # Errors
    ///
    /// Any [`ResolutionError`] raised while following `$ref`.
    pub fn get_or_build(
        &self,
        resolver: &Resolver<'_>,
        select: impl FnOnce(&SchemaContainer) -> Arc<Dialect>,
        container: &Arc<SchemaContainer>,
        pointer: &JsonPointer,
    ) -> Result<Arc<CompiledSchema>, ResolutionError> {
        let reference_key = SchemaKey::new(container, pointer);
        if let Some(compiled) = self.by_reference.get(&reference_key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(compiled);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let resolved = resolver.resolve(container, pointer)?;
        let same_document = resolved.container.key() == reference_key.container;
        let target_key = SchemaKey::new(&resolved.container, &resolved.pointer);
        let compiled = match self.by_target.get(&target_key) {
            Some(compiled) => compiled,
            None => {
                let dialect = select(&resolved.container);
                let compiled = Arc::new(CompiledSchema::compile(resolved, &dialect));
                self.builds.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    location = %compiled.location(),
                    dialect = compiled.dialect(),
                    invalid = compiled.is_invalid(),
                    "compiled schema node"
                );
                self.by_target.put(target_key, compiled.clone());
                compiled
            }
        };
        if same_document {
            self.by_reference.put(reference_key, compiled.clone());
        }
        Ok(compiled)
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
        }
    }

    /// Number of compiled targets held.
    pub fn len(&self) -> usize {
        self.by_target.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }

    /// Drop every compiled schema.
    pub fn clear(&self) {
        self.by_reference.clear();
        self.by_target.clear();
    }
}
