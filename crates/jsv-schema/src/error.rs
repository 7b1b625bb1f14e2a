//! # Error Types — Resolution, Sources and Setup
//!
//! Three families of errors cross the `jsv-schema` API:
//!
//! - [`ResolutionError`]: the fatal class. A `$ref` loop, a dangling
//!   reference, a non-object reference target, or a document that cannot
//!   be fetched. These abort the branch of the instance they occur in:
//!   that branch's failures are replaced by the fatal message and the
//!   `Error` status propagates up through every enclosing report.
//! - [`SourceError`]: raised by a [`DocumentSource`](crate::DocumentSource)
//!   and wrapped in [`ResolutionError::Fetch`].
//! - [`SchemaValidationError`]: setup-time problems (loading schema
//!   directories, instance documents, configuration files). These never
//!   occur inside a validation call.
//!
//! Constraint failures and malformed schemas are not errors: they are
//! report messages.

use jsv_core::{JsonPointer, JsonRef, NodeType, ReferenceError};
use thiserror::Error;

/// A fatal error raised while following `$ref` chains.
#[derive(Error, Debug, Clone)]
pub enum ResolutionError {
    /// The same reference was reached twice while following one chain.
    #[error("JSON Reference loop detected: {}", render_chain(.chain))]
    RefLoop {
        /// Every reference visited, in order, ending with the repeated one.
        chain: Vec<JsonRef>,
    },

    /// The reference points at nothing.
    #[error("unresolvable JSON Reference: \"{reference}\" does not point to a node")]
    DanglingRef {
        /// The fully resolved reference.
        reference: JsonRef,
    },

    /// The reference points at something that is not a schema object.
    #[error("JSON Reference \"{reference}\" points to a {found}, not a schema")]
    NotASchema {
        /// The fully resolved reference.
        reference: JsonRef,
        /// Type of the node found there.
        found: NodeType,
    },

    /// A `$ref` value could not be parsed.
    #[error("malformed JSON Reference {value:?}: {source}")]
    MalformedRef {
        /// The raw `$ref` value.
        value: String,
        /// The parse error.
        #[source]
        source: ReferenceError,
    },

    /// The reference leaves the current document but its locator is not an
    /// absolute URI, so there is nothing to fetch.
    #[error("cannot dereference \"{reference}\": locator is not an absolute URI")]
    UnresolvableLocator {
        /// The reference whose locator could not be fetched.
        reference: JsonRef,
    },

    /// The document could not be canonicalized for its digest.
    #[error("cannot canonicalize schema document {locator}: {reason}")]
    Canonicalization {
        /// Locator of the document, or `(anonymous)`.
        locator: String,
        /// Human-readable reason.
        reason: String,
    },

    /// The document source failed.
    #[error("failed to fetch schema document {uri}: {source}")]
    Fetch {
        /// The locator that was requested.
        uri: String,
        /// The source's error.
        #[source]
        source: SourceError,
    },
}

fn render_chain(chain: &[JsonRef]) -> String {
    chain
        .iter()
        .map(|r| format!("\"{r}\""))
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// A [`ResolutionError`] together with the instance path where it
/// surfaced. This is what unwinds a validation call.
#[derive(Error, Debug, Clone)]
#[error("{error} (instance: \"{instance_path}\")")]
pub struct FatalError {
    /// Instance path being validated when resolution failed.
    pub instance_path: JsonPointer,
    /// The underlying resolution error.
    #[source]
    pub error: ResolutionError,
}

/// Error returned by a document source.
#[derive(Error, Debug, Clone)]
pub enum SourceError {
    /// The source has no document for this URI.
    #[error("no document available for {uri}")]
    NotFound {
        /// The requested URI.
        uri: String,
    },

    /// The source does not handle this URI scheme.
    #[error("unsupported URI scheme {scheme:?}")]
    UnsupportedScheme {
        /// The rejected scheme.
        scheme: String,
    },

    /// Reading the document failed.
    #[error("cannot read {uri}: {reason}")]
    Read {
        /// The requested URI.
        uri: String,
        /// Human-readable reason.
        reason: String,
    },

    /// The document is not valid JSON (or YAML).
    #[error("cannot parse {uri}: {reason}")]
    Parse {
        /// The requested URI.
        uri: String,
        /// Human-readable reason.
        reason: String,
    },
}

/// Errors raised while setting a validator up or loading documents.
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// A schema file or directory could not be loaded.
    #[error("failed to load schema {path}: {reason}")]
    SchemaLoadError {
        /// Path or identifier of the schema that failed to load.
        path: String,
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// An instance document could not be loaded.
    #[error("failed to load document {path}: {reason}")]
    DocumentLoadError {
        /// Path to the document that failed to load.
        path: String,
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// The configuration could not be loaded.
    #[error("invalid configuration {origin}: {reason}")]
    ConfigError {
        /// Path of the configuration file, or `<inline>`.
        origin: String,
        /// Human-readable reason.
        reason: String,
    },

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_loop_display_lists_chain() {
        let err = ResolutionError::RefLoop {
            chain: vec![
                JsonRef::parse("urn:a").unwrap(),
                JsonRef::parse("urn:b").unwrap(),
                JsonRef::parse("urn:a").unwrap(),
            ],
        };
        assert_eq!(
            err.to_string(),
            r#"JSON Reference loop detected: "urn:a" -> "urn:b" -> "urn:a""#
        );
    }

    #[test]
    fn test_dangling_display_cites_pointer() {
        let err = ResolutionError::DanglingRef {
            reference: JsonRef::parse("#/nope").unwrap(),
        };
        assert!(err.to_string().contains("#/nope"));
    }

    #[test]
    fn test_fatal_display_includes_path() {
        let err = FatalError {
            instance_path: JsonPointer::parse("/a/0").unwrap(),
            error: ResolutionError::UnresolvableLocator {
                reference: JsonRef::parse("other.json").unwrap(),
            },
        };
        let s = err.to_string();
        assert!(s.contains("other.json"));
        assert!(s.contains("/a/0"));
    }

    #[test]
    fn test_fetch_error_wraps_source() {
        let err = ResolutionError::Fetch {
            uri: "http://example.com/s.json".into(),
            source: SourceError::NotFound {
                uri: "http://example.com/s.json".into(),
            },
        };
        assert!(err.to_string().starts_with("failed to fetch schema document"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_setup_error_display() {
        let err = SchemaValidationError::SchemaLoadError {
            path: "schemas/bad.json".into(),
            reason: "invalid JSON".into(),
        };
        assert_eq!(err.to_string(), "failed to load schema schemas/bad.json: invalid JSON");
    }
}
