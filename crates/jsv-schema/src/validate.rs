//! # Schema Validation
//!
//! [`SchemaValidator`] is the entry point: it owns the schema registry, the
//! compiled-validator cache and the dialect tables, and validates JSON or
//! YAML instances against schemas given inline, by URI, or by file path.
//!
//! ## Outcomes
//!
//! Every entry point returns a [`ValidationReport`]; nothing panics and no
//! schema or instance problem becomes an `Err`. Only loading files from
//! disk ([`SchemaValidator::validate_file`]) can fail before validation
//! starts.
//!
//! ## Schema Resolution
//!
//! Documents reached through `$ref` are fetched from the configured
//! [`DocumentSource`] and cached. A validator built with
//! [`SchemaValidator::from_schema_dir`] resolves references by `id`, by
//! `file:` URL and by filename against a directory of schemas, the same way
//! a bundle of schemas referencing one another by `<base>/<filename>` is
//! usually laid out.
//!
//! ## Thread Safety
//!
//! `SchemaValidator` is `Send + Sync`. All caches are internal and
//! lock-protected; concurrent calls share compiled schemas.

use std::path::Path;
use std::sync::Arc;

use jsv_core::{JsonPointer, JsonRef};
use serde_json::Value;
use url::Url;

use crate::cache::{CacheStats, ValidatorCache};
use crate::config::ValidatorConfig;
use crate::container::SchemaContainer;
use crate::context::ValidationContext;
use crate::dialect::{Dialect, DialectSet};
use crate::document::load_document;
use crate::engine::InstanceValidator;
use crate::error::{FatalError, ResolutionError, SchemaValidationError};
use crate::registry::{ChainSource, DirectorySource, DocumentSource, FileSource, NoRemoteSource, SchemaRegistry};
use crate::report::ValidationReport;

/// Validates instances against JSON Schema draft 3 and draft 4 schemas.
#[derive(Debug)]
pub struct SchemaValidator {
    config: ValidatorConfig,
    registry: SchemaRegistry,
    cache: ValidatorCache,
    dialects: DialectSet,
}

impl SchemaValidator {
    /// A validator that never fetches documents: every `$ref` must point
    /// into a registered document.
    pub fn new(config: ValidatorConfig) -> Self {
        Self::with_source(config, Box::new(NoRemoteSource))
    }

    /// A validator fetching unknown documents from `source`.
    pub fn with_source(config: ValidatorConfig, source: Box<dyn DocumentSource>) -> Self {
        let registry = SchemaRegistry::new(source, config.addressing, config.registry_capacity);
        let cache = ValidatorCache::new(config.validator_cache_capacity);
        let dialects = DialectSet::new(config.default_dialect);
        Self {
            config,
            registry,
            cache,
            dialects,
        }
    }

    /// A validator resolving references against the schemas in `dir`, then
    /// against `file:` URLs.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaValidationError::SchemaLoadError`] if the directory
    /// or a schema file in it cannot be loaded.
    pub fn from_schema_dir(
        dir: impl AsRef<Path>,
        config: ValidatorConfig,
    ) -> Result<Self, SchemaValidationError> {
        let directory = DirectorySource::load(dir)?;
        tracing::info!(
            dir = %directory.dir().display(),
            schemas = directory.len(),
            "schema directory loaded"
        );
        let source = ChainSource::new().with(directory).with(FileSource);
        Ok(Self::with_source(config, Box::new(source)))
    }

    /// Replace the default dialect, for example with a draft extended by
    /// custom keywords. Schemas naming a built-in draft in `$schema` still
    /// get that draft.
    pub fn with_default_dialect(mut self, dialect: Dialect) -> Self {
        self.dialects = self.dialects.with_default(dialect);
        self.cache.clear();
        self
    }

    /// The configuration.
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// The schema registry.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Compiled-validator cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Register a schema document so that other schemas can reference it by
    /// its root `id`. Registered documents are kept for the lifetime of the
    /// validator.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::Canonicalization`] if the document digest
    /// cannot be computed.
    pub fn register(&self, schema: Value) -> Result<Arc<SchemaContainer>, ResolutionError> {
        self.registry.register(schema)
    }

    /// Validate `instance` against `schema` with the configured depth.
    pub fn validate(&self, schema: &Value, instance: &Value) -> ValidationReport {
        self.validate_with(schema, instance, self.config.deep_check)
    }

    /// Validate `instance` against `schema`, choosing whether the children
    /// of a failed container are still visited.
    ///
    /// The schema is not registered: if it has an `id` it stays reachable
    /// from other documents only while it is in the bounded document cache.
    pub fn validate_with(&self, schema: &Value, instance: &Value, deep_check: bool) -> ValidationReport {
        match self.registry.admit(schema.clone()) {
            Ok(container) => self.run(container, &JsonPointer::root(), instance, deep_check),
            Err(error) => root_error(error),
        }
    }

    /// Validate `instance` against the schema at `uri`, which may carry a
    /// JSON Pointer fragment (`http://example.com/s.json#/definitions/x`).
    pub fn validate_uri(&self, uri: &str, instance: &Value) -> ValidationReport {
        match self.locate(uri) {
            Ok((container, pointer)) => {
                self.run(container, &pointer, instance, self.config.deep_check)
            }
            Err(error) => root_error(error),
        }
    }

    /// Load a schema and an instance from disk (JSON or YAML by extension)
    /// and validate.
    ///
    /// The schema is addressed by its `file:` URL, so relative `$ref`s in
    /// it resolve against its directory when the document source can read
    /// files.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaValidationError::DocumentLoadError`] if either file
    /// cannot be read or parsed.
    pub fn validate_file(
        &self,
        schema_path: &Path,
        instance_path: &Path,
    ) -> Result<ValidationReport, SchemaValidationError> {
        let schema = load_document(schema_path)?;
        let instance = load_document(instance_path)?;

        let admitted = match file_locator(schema_path) {
            Some(locator) => self.registry.admit_as(&locator, schema),
            None => self.registry.admit(schema),
        };
        tracing::debug!(
            schema = %schema_path.display(),
            instance = %instance_path.display(),
            "validating file"
        );
        Ok(match admitted {
            Ok(container) => {
                self.run(container, &JsonPointer::root(), &instance, self.config.deep_check)
            }
            Err(error) => root_error(error),
        })
    }

    fn locate(&self, uri: &str) -> Result<(Arc<SchemaContainer>, JsonPointer), ResolutionError> {
        let reference = JsonRef::parse(uri).map_err(|source| ResolutionError::MalformedRef {
            value: uri.to_string(),
            source,
        })?;
        let container = self.registry.get(&reference)?;
        let pointer = container
            .resolve(&reference)
            .ok_or(ResolutionError::DanglingRef { reference })?;
        Ok((container, pointer))
    }

    fn run(
        &self,
        container: Arc<SchemaContainer>,
        pointer: &JsonPointer,
        instance: &Value,
        deep_check: bool,
    ) -> ValidationReport {
        let engine = InstanceValidator::new(&self.registry, &self.cache, &self.dialects);
        let mut ctx = ValidationContext::new(container, deep_check, self.config.fail_fast);
        let mut report = ValidationReport::new();
        match engine.validate(&mut ctx, &mut report, instance, pointer) {
            Ok(()) => report,
            Err(fatal) => fatal_report(fatal),
        }
    }
}

fn root_error(error: ResolutionError) -> ValidationReport {
    fatal_report(FatalError {
        instance_path: JsonPointer::root(),
        error,
    })
}

fn fatal_report(fatal: FatalError) -> ValidationReport {
    tracing::warn!(error = %fatal, "validation aborted");
    let mut report = ValidationReport::new();
    report.abort(fatal);
    report
}

fn file_locator(path: &Path) -> Option<JsonRef> {
    let absolute = std::fs::canonicalize(path).ok()?;
    let url = Url::from_file_path(absolute).ok()?;
    JsonRef::from_url(&url).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::registry::MapSource;
    use crate::report::ValidationStatus;
    use serde_json::json;
    use std::io::Write;

    fn validator() -> SchemaValidator {
        SchemaValidator::new(ValidatorConfig::default())
    }

    #[test]
    fn test_validate_success_and_failure() {
        let v = validator();
        let schema = json!({"type": "object", "required": ["name"]});
        assert!(v.validate(&schema, &json!({"name": "x"})).is_success());
        let report = v.validate(&schema, &json!({}));
        assert_eq!(report.status(), ValidationStatus::Failure);
        assert_eq!(report.messages()[0].keyword.as_deref(), Some("required"));
        assert_eq!(report.messages()[0].schema.as_deref(), Some("#"));
    }

    #[test]
    fn test_validate_with_overrides_depth() {
        let v = validator();
        let schema = json!({
            "minProperties": 3,
            "properties": {"a": {"type": "string"}}
        });
        let instance = json!({"a": 1});
        assert_eq!(v.validate_with(&schema, &instance, false).len(), 1);
        assert_eq!(v.validate_with(&schema, &instance, true).len(), 2);
    }

    #[test]
    fn test_validate_uri_with_fragment() {
        let source = MapSource::new().with(
            "http://example.com/defs.json",
            json!({"definitions": {"port": {"type": "integer", "minimum": 1}}}),
        );
        let v = SchemaValidator::with_source(ValidatorConfig::default(), Box::new(source));
        let uri = "http://example.com/defs.json#/definitions/port";
        assert!(v.validate_uri(uri, &json!(8080)).is_success());
        assert_eq!(v.validate_uri(uri, &json!(0)).status(), ValidationStatus::Failure);
    }

    #[test]
    fn test_validate_uri_unknown_document_is_error() {
        let report = validator().validate_uri("http://example.com/missing.json", &json!(1));
        assert_eq!(report.status(), ValidationStatus::Error);
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_validate_uri_malformed() {
        let report = validator().validate_uri("http://exa mple.com/%zz#x", &json!(1));
        assert_eq!(report.status(), ValidationStatus::Error);
    }

    #[test]
    fn test_fetch_failure_is_error() {
        #[derive(Debug)]
        struct Failing;
        impl DocumentSource for Failing {
            fn fetch(&self, uri: &Url) -> Result<Value, SourceError> {
                Err(SourceError::Read {
                    uri: uri.to_string(),
                    reason: "connection refused".to_string(),
                })
            }
        }
        let v = SchemaValidator::with_source(ValidatorConfig::default(), Box::new(Failing));
        let report = v.validate(&json!({"$ref": "http://example.com/a.json"}), &json!(1));
        assert_eq!(report.status(), ValidationStatus::Error);
        assert!(report.messages()[0].message.contains("connection refused"));
    }

    #[test]
    fn test_validate_file_yaml_instance() {
        let dir = tempfile::tempdir().unwrap();
        let schema_path = dir.path().join("person.schema.json");
        let instance_path = dir.path().join("alice.yaml");
        std::fs::write(
            &schema_path,
            r#"{"type": "object", "properties": {"age": {"type": "integer"}}}"#,
        )
        .unwrap();
        let mut file = std::fs::File::create(&instance_path).unwrap();
        writeln!(file, "name: alice\nage: thirty").unwrap();

        let report = validator().validate_file(&schema_path, &instance_path).unwrap();
        assert_eq!(report.status(), ValidationStatus::Failure);
        assert_eq!(report.messages()[0].instance_path.to_string(), "/age");
    }

    #[test]
    fn test_validate_file_missing_instance() {
        let dir = tempfile::tempdir().unwrap();
        let schema_path = dir.path().join("s.json");
        std::fs::write(&schema_path, "{}").unwrap();
        match validator().validate_file(&schema_path, &dir.path().join("nope.json")) {
            Err(SchemaValidationError::DocumentLoadError { path, .. }) => {
                assert!(path.ends_with("nope.json"));
            }
            other => panic!("Expected DocumentLoadError, got: {other:?}"),
        }
    }

    #[test]
    fn test_schema_dir_relative_refs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("root.schema.json"),
            r#"{"properties": {"addr": {"$ref": "address.schema.json"}}}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("address.schema.json"),
            r#"{"type": "object", "required": ["street"]}"#,
        )
        .unwrap();

        let v = SchemaValidator::from_schema_dir(dir.path(), ValidatorConfig::default()).unwrap();
        let schema_path = dir.path().join("root.schema.json");
        let good = dir.path().join("good.json");
        let bad = dir.path().join("bad.json");
        std::fs::write(&good, r#"{"addr": {"street": "Main"}}"#).unwrap();
        std::fs::write(&bad, r#"{"addr": {}}"#).unwrap();

        assert!(v.validate_file(&schema_path, &good).unwrap().is_success());
        let report = v.validate_file(&schema_path, &bad).unwrap();
        assert_eq!(report.status(), ValidationStatus::Failure);
        assert_eq!(report.messages()[0].instance_path.to_string(), "/addr");
    }

    #[test]
    fn test_custom_default_dialect() {
        let v = validator().with_default_dialect(Dialect::draft4().without_keyword("minimum"));
        assert!(v.validate(&json!({"minimum": 10}), &json!(1)).is_success());
        let draft4 = json!({"$schema": "http://json-schema.org/draft-04/schema#", "minimum": 10});
        assert!(!v.validate(&draft4, &json!(1)).is_success());
    }

    #[test]
    fn test_validated_schemas_are_not_pinned() {
        let config = ValidatorConfig {
            registry_capacity: 16,
            ..ValidatorConfig::default()
        };
        let v = SchemaValidator::new(config);
        for i in 0..2000 {
            let schema = json!({"id": format!("urn:example:order:{i}"), "maximum": i});
            assert!(v.validate(&schema, &json!(i)).is_success());
        }
        let stats = v.registry().stats();
        assert_eq!(stats.pinned, 0);
        assert!(stats.cached <= 16, "cached {}", stats.cached);
    }

    #[test]
    fn test_validated_schema_with_id_refers_to_itself() {
        let schema = json!({
            "id": "http://example.com/tree.json",
            "properties": {"child": {"$ref": "http://example.com/tree.json"}},
            "required": ["name"]
        });
        let v = validator();
        assert!(v.validate(&schema, &json!({"name": "a", "child": {"name": "b"}})).is_success());
        let report = v.validate(&schema, &json!({"name": "a", "child": {}}));
        assert_eq!(report.messages()[0].instance_path.to_string(), "/child");
        assert_eq!(v.registry().stats().pinned, 0);
    }
}
