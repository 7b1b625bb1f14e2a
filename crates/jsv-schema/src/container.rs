//! # Schema Container
//!
//! One loaded schema document: its locator, its root node with the root
//! `id` stripped, and an index of every `id`-bearing subschema.
//!
//! ## Addressing
//!
//! Schema nodes are never copied out of their container. They are
//! addressed by JSON Pointer relative to the container root, so the
//! container owns the whole tree and everything else holds
//! `(Arc<SchemaContainer>, JsonPointer)` pairs.
//!
//! In [`AddressingMode::Inline`] the constructor walks the schema through
//! the keyword positions that hold subschemas and records each nested `id`,
//! resolved against the container locator. In [`AddressingMode::Canonical`]
//! only the root `id` is trusted.
//!
//! A document without an absolute root `id` is anonymous: it can still be
//! validated against and can reference itself by fragment, but relative
//! `$ref`s that leave it cannot be followed.

use std::collections::HashMap;

use jsv_core::{
    sha256_digest, CanonicalBytes, CanonicalizationError, ContentDigest, Fragment, JsonPointer,
    JsonRef,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keywords whose value is a map of name → subschema.
const SCHEMA_MAP_KEYWORDS: &[&str] = &["properties", "patternProperties", "definitions", "dependencies"];

/// Keywords whose value may be a single subschema.
const SCHEMA_KEYWORDS: &[&str] = &[
    "additionalItems",
    "additionalProperties",
    "not",
    "items",
    "extends",
];

/// Keywords whose value may be an array with subschema elements.
const SCHEMA_ARRAY_KEYWORDS: &[&str] = &["allOf", "anyOf", "oneOf", "items", "extends", "type", "disallow"];

/// How `id` keywords inside a document are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressingMode {
    /// Every nested `id` is indexed and addressable.
    #[default]
    Inline,
    /// Only the root `id` identifies the document.
    Canonical,
}

/// Identity of a container for cache keys: locator plus content digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerKey {
    locator: JsonRef,
    digest: ContentDigest,
}

/// A loaded schema document.
#[derive(Debug)]
pub struct SchemaContainer {
    locator: JsonRef,
    root: Value,
    ids: HashMap<JsonRef, JsonPointer>,
    digest: ContentDigest,
    schema_uri: Option<String>,
}

impl SchemaContainer {
    /// Build a container whose locator is the document's own root `id`.
    ///
    /// A missing, relative or malformed root `id` yields an anonymous
    /// container. Fails only if the document cannot be canonicalized for
    /// its digest.
    pub fn from_document(
        document: Value,
        mode: AddressingMode,
    ) -> Result<Self, CanonicalizationError> {
        let locator = match root_id(&document) {
            Some(id) if id.has_absolute_locator() => id.locator(),
            _ => {
                tracing::warn!(
                    "schema document has no absolute id; only in-document references resolve"
                );
                JsonRef::empty()
            }
        };
        Self::build(locator, document, mode)
    }

    /// Build a container under an explicit locator, used for documents
    /// fetched by URI. A root `id` that names another URI becomes an alias
    /// for the root.
    pub fn with_locator(
        locator: JsonRef,
        document: Value,
        mode: AddressingMode,
    ) -> Result<Self, CanonicalizationError> {
        Self::build(locator.locator(), document, mode)
    }

    fn build(
        locator: JsonRef,
        mut document: Value,
        mode: AddressingMode,
    ) -> Result<Self, CanonicalizationError> {
        let digest = sha256_digest(&CanonicalBytes::new(&document)?);
        let declared = root_id(&document).map(|id| locator.resolve(&id));
        if let Value::Object(map) = &mut document {
            if map.get("id").is_some_and(Value::is_string) {
                map.remove("id");
            }
        }
        let schema_uri = document
            .get("$schema")
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut ids = HashMap::new();
        if let Some(alias) = declared {
            if alias.locator() != locator && alias.has_absolute_locator() {
                ids.insert(alias.locator(), JsonPointer::root());
            }
        }
        if mode == AddressingMode::Inline {
            index_children(&locator, &document, &JsonPointer::root(), &mut ids);
        }

        tracing::debug!(
            locator = %locator,
            digest = %digest.short(),
            ids = ids.len(),
            "built schema container"
        );

        Ok(Self {
            locator,
            root: document,
            ids,
            digest,
            schema_uri,
        })
    }

    /// The document locator; empty for anonymous containers.
    pub fn locator(&self) -> &JsonRef {
        &self.locator
    }

    /// True when the document has no absolute locator.
    pub fn is_anonymous(&self) -> bool {
        !self.locator.has_absolute_locator()
    }

    /// The root schema node.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// The node at `pointer`, if any.
    pub fn node(&self, pointer: &JsonPointer) -> Option<&Value> {
        pointer.resolve(&self.root)
    }

    /// Digest of the document as loaded.
    pub fn digest(&self) -> &ContentDigest {
        &self.digest
    }

    /// The root `$schema` value, if any.
    pub fn schema_uri(&self) -> Option<&str> {
        self.schema_uri.as_deref()
    }

    /// Number of indexed `id`s.
    pub fn id_count(&self) -> usize {
        self.ids.len()
    }

    /// Cache identity of this container.
    pub fn key(&self) -> ContainerKey {
        ContainerKey {
            locator: self.locator.clone(),
            digest: self.digest,
        }
    }

    /// Absolute reference to the node at `pointer` in this document.
    pub fn reference_to(&self, pointer: &JsonPointer) -> JsonRef {
        self.locator.with_pointer(pointer.clone())
    }

    /// True iff `reference` can be resolved without leaving this document.
    pub fn contains(&self, reference: &JsonRef) -> bool {
        self.locator.contains(reference)
            || self.ids.contains_key(reference)
            || self.ids.contains_key(&reference.locator())
    }

    /// Address of the node `reference` designates, if it exists.
    pub fn resolve(&self, reference: &JsonRef) -> Option<JsonPointer> {
        let pointer = self.lookup(reference)?;
        pointer.resolve(&self.root).map(|_| pointer)
    }

    fn lookup(&self, reference: &JsonRef) -> Option<JsonPointer> {
        if let Some(pointer) = self.ids.get(reference) {
            return Some(pointer.clone());
        }
        if let Fragment::Pointer(fragment) = reference.fragment() {
            if let Some(base) = self.ids.get(&reference.locator()) {
                return Some(base.join(fragment));
            }
        }
        if !self.locator.contains(reference) {
            return None;
        }
        match reference.fragment() {
            Fragment::Empty => Some(JsonPointer::root()),
            Fragment::Pointer(p) => Some(p.clone()),
            Fragment::Identifier(_) => None,
        }
    }
}

fn root_id(document: &Value) -> Option<JsonRef> {
    document
        .get("id")
        .and_then(Value::as_str)
        .and_then(|s| JsonRef::parse(s).ok())
}

fn index_children(
    locator: &JsonRef,
    schema: &Value,
    pointer: &JsonPointer,
    ids: &mut HashMap<JsonRef, JsonPointer>,
) {
    let Value::Object(map) = schema else {
        return;
    };

    for &keyword in SCHEMA_MAP_KEYWORDS {
        if let Some(Value::Object(children)) = map.get(keyword) {
            let base = pointer.append(keyword);
            for (name, child) in children {
                index_schema(locator, child, &base.append(name.as_str()), ids);
            }
        }
    }
    for &keyword in SCHEMA_KEYWORDS {
        if let Some(child @ Value::Object(_)) = map.get(keyword) {
            index_schema(locator, child, &pointer.append(keyword), ids);
        }
    }
    for &keyword in SCHEMA_ARRAY_KEYWORDS {
        if let Some(Value::Array(items)) = map.get(keyword) {
            let base = pointer.append(keyword);
            for (i, child) in items.iter().enumerate() {
                index_schema(locator, child, &base.append_index(i), ids);
            }
        }
    }
}

fn index_schema(
    locator: &JsonRef,
    schema: &Value,
    pointer: &JsonPointer,
    ids: &mut HashMap<JsonRef, JsonPointer>,
) {
    if !schema.is_object() {
        return;
    }
    if let Some(raw) = schema.get("id").and_then(Value::as_str) {
        match JsonRef::parse(raw) {
            Ok(id) => {
                ids.entry(locator.resolve(&id)).or_insert_with(|| pointer.clone());
            }
            Err(e) => tracing::debug!(id = raw, error = %e, "ignoring malformed subschema id"),
        }
    }
    index_children(locator, schema, pointer, ids);
}
