//! # Validator Configuration
//!
//! Immutable settings for a [`SchemaValidator`](crate::SchemaValidator).
//! Every field has a default, so a configuration file only names what it
//! changes:
//!
//! ```yaml
//! default_dialect: draft3
//! deep_check: true
//! ```
//!
//! JSON is accepted too, since it is a subset of YAML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bounded::DEFAULT_CAPACITY;
use crate::container::AddressingMode;
use crate::dialect::DialectKind;
use crate::error::SchemaValidationError;

/// Validator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Dialect for schemas without a recognised `$schema`.
    pub default_dialect: DialectKind,
    /// How nested `id`s are indexed.
    pub addressing: AddressingMode,
    /// Visit the children of a container whose own keywords failed.
    pub deep_check: bool,
    /// Stop at the first failure.
    pub fail_fast: bool,
    /// Fetched or validated schema documents kept in memory.
    pub registry_capacity: usize,
    /// Compiled schema nodes kept in memory.
    pub validator_cache_capacity: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            default_dialect: DialectKind::default(),
            addressing: AddressingMode::default(),
            deep_check: false,
            fail_fast: false,
            registry_capacity: DEFAULT_CAPACITY,
            validator_cache_capacity: DEFAULT_CAPACITY * 16,
        }
    }
}

impl ValidatorConfig {
    /// Parse a configuration from YAML or JSON text.
    ///
    /// # Errors
    ///
    /// [`SchemaValidationError::ConfigError`] on malformed input or an
    /// unknown field.
    pub fn from_yaml_str(content: &str) -> Result<Self, SchemaValidationError> {
        Self::parse(content, "<inline>")
    }

    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// [`SchemaValidationError::ConfigError`] if the file cannot be read or
    /// parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaValidationError> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SchemaValidationError::ConfigError {
                origin: origin.clone(),
                reason: format!("cannot read file: {e}"),
            }
        })?;
        Self::parse(&content, &origin)
    }

    fn parse(content: &str, origin: &str) -> Result<Self, SchemaValidationError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| SchemaValidationError::ConfigError {
            origin: origin.to_string(),
            reason: e.to_string(),
        })
    }

    /// This configuration with `deep_check` set.
    pub fn with_deep_check(mut self, deep_check: bool) -> Self {
        self.deep_check = deep_check;
        self
    }

    /// This configuration with `fail_fast` set.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// This configuration with another default dialect.
    pub fn with_default_dialect(mut self, dialect: DialectKind) -> Self {
        self.default_dialect = dialect;
        self
    }
}
