//! # Error Types — Addressing Errors
//!
//! Errors raised while parsing the two addressing syntaxes of the
//! validator, JSON Pointers (RFC 6901) and JSON References (URI plus
//! fragment), and while canonicalizing a document for its digest. All errors use `thiserror` for derive-based `Display` and
//! `Error` implementations.
//!
//! ## Design
//!
//! - Parsing is the only fallible addressing operation. Pointer resolution
//!   against a document is total and reports absence with `None`.
//! - Each error carries the offending input so that messages surfaced in a
//!   validation report can cite it verbatim.

use thiserror::Error;

/// Top-level error type for `jsv-core`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A JSON Pointer could not be parsed.
    #[error("invalid JSON Pointer: {0}")]
    Pointer(#[from] PointerError),

    /// A JSON Reference could not be parsed.
    #[error("invalid JSON Reference: {0}")]
    Reference(#[from] ReferenceError),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JCS serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error while decoding a JSON Pointer string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PointerError {
    /// A non-empty pointer must start with `/`.
    #[error("pointer {input:?} must be empty or start with '/'")]
    MissingLeadingSlash {
        /// The rejected input.
        input: String,
    },

    /// `~` was followed by something other than `0` or `1`.
    #[error("pointer {input:?} contains an illegal escape at byte offset {offset}")]
    IllegalEscape {
        /// The rejected input.
        input: String,
        /// Byte offset of the offending `~`.
        offset: usize,
    },
}

/// Error while decoding a JSON Reference.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    /// The locator part is not a valid URI reference.
    #[error("reference {input:?} has a malformed locator: {reason}")]
    MalformedLocator {
        /// The rejected input.
        input: String,
        /// Reason reported by the URI parser.
        reason: String,
    },

    /// The fragment looks like a pointer but does not decode as one.
    #[error("reference {input:?} has a malformed pointer fragment: {source}")]
    MalformedFragment {
        /// The rejected input.
        input: String,
        /// The underlying pointer error.
        #[source]
        source: PointerError,
    },

    /// The fragment is not valid percent-encoded UTF-8.
    #[error("reference {input:?} has a fragment that is not valid UTF-8 once percent-decoded")]
    FragmentEncoding {
        /// The rejected input.
        input: String,
    },
}
