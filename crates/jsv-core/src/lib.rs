//! # jsv-core — Addressing Primitives for JSON Schema Validation
//!
//! This crate is the leaf of the `jsv` workspace. It defines the types every
//! other crate uses to address JSON nodes and schema documents, and the
//! exact numeric semantics keyword validators rely on.
//!
//! ## Key Design Principles
//!
//! 1. **Total pointer resolution.** `JsonPointer::resolve` returns the node
//!    or `None`; it never panics, whatever the pointer and the document.
//!
//! 2. **References compare by encoded form.** `JsonRef` equality, hashing
//!    and display all go through the string computed once at construction.
//!
//! 3. **No binary floats in comparisons.** Numbers compare through an
//!    integer fast path or exact decimals (`node::compare_numbers`).
//!
//! 4. **Document identity by content.** `CanonicalBytes` and
//!    `ContentDigest` give every schema document a stable identity that is
//!    independent of key order and whitespace.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `jsv-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod node;
pub mod pointer;
pub mod reference;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest};
pub use error::{CanonicalizationError, CoreError, PointerError, ReferenceError};
pub use node::{compare_numbers, is_multiple_of, json_equals, NodeType, TypeSet};
pub use pointer::JsonPointer;
pub use reference::{Fragment, JsonRef};
