//! # Canonical Serialization — Deterministic Document Bytes
//!
//! `CanonicalBytes` is the byte form used to derive the identity of a schema
//! document: two documents with the same canonical bytes are the same
//! schema, whatever their key order or whitespace.
//!
//! ## Rules
//!
//! Serialization goes through `serde_jcs` (RFC 8785, JSON Canonicalization
//! Scheme): object keys sorted by UTF-16 code units, compact separators,
//! JCS string escaping. Numbers keep the text `serde_json` holds for them,
//! which under `arbitrary_precision` is the source literal.

use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced by canonical serialization of a JSON value.
///
/// The inner `Vec<u8>` is private; the only constructor is
/// [`CanonicalBytes::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalizationError::SerializationFailed`] if JCS
    /// serialization rejects the value.
    pub fn new(value: &Value) -> Result<Self, CanonicalizationError> {
        Ok(Self(serde_jcs::to_vec(value)?))
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
