//! # Validate Subcommand
//!
//! Validates one or more instance documents (JSON or YAML, chosen by file
//! extension) against a schema given as a file path or an absolute URI.
//!
//! ```bash
//! jsv validate --schema schemas/order.schema.json orders/*.yaml
//! jsv validate --schema http://example.com/order.json#/definitions/line \
//!     --schema-dir schemas/ line.json
//! ```
//!
//! The exit code is the worst outcome over all instances: `0` when every
//! instance is valid, `1` when at least one fails a constraint, `2` when a
//! document cannot be loaded or the schema graph cannot be resolved.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;

use jsv_core::JsonRef;
use jsv_schema::{
    load_document, SchemaValidator, ValidationMessage, ValidationReport, ValidationStatus,
    ValidatorConfig,
};

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Schema file, or absolute schema URI (with an optional `#/pointer`).
    #[arg(long, short)]
    pub schema: String,

    /// Validator configuration file (YAML or JSON).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Keep validating the children of a container that already failed.
    #[arg(long)]
    pub deep: bool,

    /// Stop each instance at its first failure.
    #[arg(long)]
    pub fail_fast: bool,

    /// Directory of schemas that `$ref`s resolve against. Defaults to the
    /// directory of a schema given as a file.
    #[arg(long)]
    pub schema_dir: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Instance documents to validate.
    #[arg(required = true)]
    pub instances: Vec<PathBuf>,
}

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One block of indented messages per instance.
    Text,
    /// A JSON array with one object per instance.
    Json,
}

/// Where the schema comes from.
#[derive(Debug, Clone, PartialEq)]
enum SchemaTarget {
    File(PathBuf),
    Uri(String),
}

impl SchemaTarget {
    fn parse(raw: &str) -> Self {
        let path = Path::new(raw);
        if path.exists() {
            return SchemaTarget::File(path.to_path_buf());
        }
        match JsonRef::parse(raw) {
            Ok(reference) if reference.has_absolute_locator() => SchemaTarget::Uri(raw.to_string()),
            _ => SchemaTarget::File(path.to_path_buf()),
        }
    }
}

/// The result for one instance document.
#[derive(Debug, Serialize)]
pub struct InstanceOutcome {
    /// Path of the instance.
    pub instance: String,
    /// Overall status.
    pub status: ValidationStatus,
    /// Report messages.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<ValidationMessage>,
    /// Load failure, when the documents could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InstanceOutcome {
    fn from_report(instance: &Path, report: ValidationReport) -> Self {
        Self {
            instance: instance.display().to_string(),
            status: report.status(),
            messages: report.into_messages(),
            error: None,
        }
    }

    fn load_error(instance: &Path, error: impl std::fmt::Display) -> Self {
        Self {
            instance: instance.display().to_string(),
            status: ValidationStatus::Error,
            messages: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    fn render_text(&self) -> String {
        let mut out = format!("{}: {}", self.instance, self.status);
        if let Some(error) = &self.error {
            out.push_str(&format!("\n  {error}"));
        }
        for message in &self.messages {
            out.push_str(&format!("\n{message}"));
            for cause in &message.causes {
                out.push_str(&format!("\n  {cause}"));
            }
        }
        out
    }
}

/// Exit code for the worst status seen.
pub fn exit_code(status: ValidationStatus) -> u8 {
    match status {
        ValidationStatus::Success => 0,
        ValidationStatus::Failure => 1,
        ValidationStatus::Error => 2,
    }
}

/// Build the validator configuration from `--config` and the flags.
fn load_config(args: &ValidateArgs) -> Result<ValidatorConfig> {
    let mut config = match &args.config {
        Some(path) => ValidatorConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => ValidatorConfig::default(),
    };
    if args.deep {
        config = config.with_deep_check(true);
    }
    if args.fail_fast {
        config = config.with_fail_fast(true);
    }
    Ok(config)
}

fn build_validator(
    target: &SchemaTarget,
    schema_dir: Option<&Path>,
    config: ValidatorConfig,
) -> Result<SchemaValidator> {
    let dir = schema_dir.map(Path::to_path_buf).or_else(|| match target {
        SchemaTarget::File(path) => path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .or_else(|| Some(PathBuf::from("."))),
        SchemaTarget::Uri(_) => None,
    });
    match dir {
        Some(dir) => SchemaValidator::from_schema_dir(&dir, config)
            .with_context(|| format!("loading schema directory {}", dir.display())),
        None => Ok(SchemaValidator::new(config)),
    }
}

/// Validate every instance and collect the outcomes.
pub fn validate_instances(args: &ValidateArgs) -> Result<Vec<InstanceOutcome>> {
    let config = load_config(args)?;
    let target = SchemaTarget::parse(&args.schema);
    let validator = build_validator(&target, args.schema_dir.as_deref(), config)?;

    let outcomes = args
        .instances
        .iter()
        .map(|instance| {
            let outcome = match &target {
                SchemaTarget::File(schema) => match validator.validate_file(schema, instance) {
                    Ok(report) => InstanceOutcome::from_report(instance, report),
                    Err(e) => InstanceOutcome::load_error(instance, e),
                },
                SchemaTarget::Uri(uri) => match load_document(instance) {
                    Ok(document) => {
                        InstanceOutcome::from_report(instance, validator.validate_uri(uri, &document))
                    }
                    Err(e) => InstanceOutcome::load_error(instance, e),
                },
            };
            tracing::info!(
                instance = %instance.display(),
                status = %outcome.status,
                messages = outcome.messages.len(),
                "validated"
            );
            outcome
        })
        .collect();

    let stats = validator.cache_stats();
    tracing::debug!(
        hits = stats.hits,
        misses = stats.misses,
        builds = stats.builds,
        "validator cache"
    );
    Ok(outcomes)
}

/// Execute the validate subcommand.
pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    let outcomes = validate_instances(args)?;
    match args.format {
        OutputFormat::Text => {
            for outcome in &outcomes {
                println!("{}", outcome.render_text());
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcomes)?);
        }
    }
    let worst = outcomes
        .iter()
        .map(|o| o.status)
        .fold(ValidationStatus::Success, ValidationStatus::worst);
    Ok(exit_code(worst))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(schema: &Path, instances: Vec<PathBuf>) -> ValidateArgs {
        ValidateArgs {
            schema: schema.display().to_string(),
            config: None,
            deep: false,
            fail_fast: false,
            schema_dir: None,
            format: OutputFormat::Text,
            instances,
        }
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(ValidationStatus::Success), 0);
        assert_eq!(exit_code(ValidationStatus::Failure), 1);
        assert_eq!(exit_code(ValidationStatus::Error), 2);
    }

    #[test]
    fn test_schema_target_detection() {
        assert_eq!(
            SchemaTarget::parse("http://example.com/s.json#/definitions/a"),
            SchemaTarget::Uri("http://example.com/s.json#/definitions/a".to_string())
        );
        assert_eq!(
            SchemaTarget::parse("schemas/missing.json"),
            SchemaTarget::File(PathBuf::from("schemas/missing.json"))
        );
    }

    #[test]
    fn test_mixed_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let schema = write(dir.path(), "s.schema.json", r#"{"type": "object", "required": ["id"]}"#);
        let good = write(dir.path(), "good.yaml", "id: 1\n");
        let bad = write(dir.path(), "bad.json", "{}");
        let missing = dir.path().join("missing.json");

        let outcomes = validate_instances(&args(&schema, vec![good, bad, missing])).unwrap();
        let statuses: Vec<ValidationStatus> = outcomes.iter().map(|o| o.status).collect();
        assert_eq!(
            statuses,
            vec![ValidationStatus::Success, ValidationStatus::Failure, ValidationStatus::Error]
        );
        assert!(outcomes[2].error.is_some());
        assert!(outcomes[1].render_text().contains("(root): object has missing required properties"));
    }

    #[test]
    fn test_run_validate_returns_worst_code() {
        let dir = tempfile::tempdir().unwrap();
        let schema = write(dir.path(), "s.json", r#"{"maxLength": 3}"#);
        let ok = write(dir.path(), "a.json", r#""abc""#);
        let long = write(dir.path(), "b.json", r#""abcd""#);
        assert_eq!(run_validate(&args(&schema, vec![ok.clone()])).unwrap(), 0);
        assert_eq!(run_validate(&args(&schema, vec![ok, long])).unwrap(), 1);
    }

    #[test]
    fn test_flags_override_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = write(dir.path(), "jsv.yaml", "default_dialect: draft3\n");
        let schema = write(dir.path(), "s.json", "{}");
        let mut a = args(&schema, vec![]);
        a.config = Some(config);
        a.deep = true;
        let loaded = load_config(&a).unwrap();
        assert!(loaded.deep_check);
        assert!(!loaded.fail_fast);
        assert_eq!(loaded.default_dialect, jsv_schema::DialectKind::Draft3);
    }

    #[test]
    fn test_json_outcome_shape() {
        let outcome = InstanceOutcome::load_error(Path::new("x.json"), "cannot read file");
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"], "cannot read file");
        assert!(value.get("messages").is_none());
    }

    #[test]
    fn test_unparsable_sibling_file_does_not_block_validation() {
        let dir = tempfile::tempdir().unwrap();
        let schema = write(dir.path(), "s.schema.json", r#"{"required": ["id"]}"#);
        write(dir.path(), "draft.json", "{\"id\": ");
        let good = write(dir.path(), "good.json", r#"{"id": 7}"#);
        assert_eq!(run_validate(&args(&schema, vec![good])).unwrap(), 0);
    }
}
