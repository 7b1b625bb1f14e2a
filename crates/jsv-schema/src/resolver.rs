//! # Resolver — Following `$ref` Chains
//!
//! Given a schema node that may be a `$ref`, follow the chain until a node
//! without `$ref` is reached, switching containers when a reference leaves
//! the current document.
//!
//! ## Loop detection
//!
//! Every reference followed is recorded in an insertion-ordered list local
//! to one resolution. Reaching a reference twice is a loop: the error lists
//! the chain in the order it was followed, ending with the repeat. Since
//! the list is per resolution, the outcome does not depend on which
//! instance triggered it or on what is cached.

use std::sync::Arc;

use jsv_core::{JsonPointer, JsonRef, NodeType};
use serde_json::Value;

use crate::container::SchemaContainer;
use crate::error::ResolutionError;
use crate::registry::SchemaRegistry;

/// A concrete schema node: no `$ref`, addressed within its container.
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    /// Container owning the node.
    pub container: Arc<SchemaContainer>,
    /// Address of the node in the container.
    pub pointer: JsonPointer,
}

impl ResolvedSchema {
    /// The schema node itself.
    pub fn node(&self) -> Option<&Value> {
        self.container.node(&self.pointer)
    }
}

/// Follows `$ref` chains through a registry.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> Resolver<'r> {
    /// A resolver fetching other documents from `registry`.
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Follow the chain starting at `pointer` in `container`.
    ///
    /// # Errors
    ///
    /// Any [`ResolutionError`]: a loop, a dangling reference, a target that
    /// is not an object, a malformed `$ref` value, or a failed fetch.
    pub fn resolve(
        &self,
        container: &Arc<SchemaContainer>,
        pointer: &JsonPointer,
    ) -> Result<ResolvedSchema, ResolutionError> {
        let mut container = container.clone();
        let mut pointer = pointer.clone();
        let mut visited: Vec<JsonRef> = Vec::new();

        loop {
            let Some(node) = container.node(&pointer) else {
                return Err(ResolutionError::DanglingRef {
                    reference: container.reference_to(&pointer),
                });
            };
            let Some(raw) = node.get("$ref").and_then(Value::as_str) else {
                if !node.is_object() {
                    return Err(ResolutionError::NotASchema {
                        reference: container.reference_to(&pointer),
                        found: NodeType::of(node),
                    });
                }
                return Ok(ResolvedSchema { container, pointer });
            };

            let parsed = JsonRef::parse(raw).map_err(|source| ResolutionError::MalformedRef {
                value: raw.to_string(),
                source,
            })?;
            let reference = container.locator().resolve(&parsed);
            if visited.contains(&reference) {
                visited.push(reference);
                return Err(ResolutionError::RefLoop { chain: visited });
            }
            visited.push(reference.clone());

            if !container.contains(&reference) {
                container = self.registry.get(&reference)?;
            }
            tracing::trace!(reference = %reference, "following $ref");
            pointer = container
                .resolve(&reference)
                .ok_or_else(|| ResolutionError::DanglingRef {
                    reference: reference.clone(),
                })?;
        }
    }
}
