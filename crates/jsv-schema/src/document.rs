//! # Document Loading
//!
//! Reads JSON or YAML documents from disk into `serde_json::Value`. The
//! format is chosen by file extension: `.yaml`/`.yml` are parsed as YAML
//! and converted, everything else is parsed as JSON.

use std::path::Path;

use serde_json::Value;

use crate::error::SchemaValidationError;

/// Parse a document from text, as YAML when `yaml` is set.
pub fn parse_document(content: &str, yaml: bool) -> Result<Value, String> {
    if yaml {
        let yaml_value: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| format!("invalid YAML: {e}"))?;
        yaml_to_json_value(&yaml_value).map_err(|e| format!("YAML-to-JSON conversion failed: {e}"))
    } else {
        serde_json::from_str(content).map_err(|e| format!("invalid JSON: {e}"))
    }
}

/// True if `path` names a YAML file.
pub fn is_yaml_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Load a JSON or YAML document from a file path.
///
/// # Errors
///
/// Returns [`SchemaValidationError::DocumentLoadError`] if the file cannot
/// be read or parsed.
pub fn load_document(path: &Path) -> Result<Value, SchemaValidationError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        SchemaValidationError::DocumentLoadError {
            path: path.display().to_string(),
            reason: format!("cannot read file: {e}"),
        }
    })?;
    parse_document(&content, is_yaml_path(path)).map_err(|reason| {
        SchemaValidationError::DocumentLoadError {
            path: path.display().to_string(),
            reason,
        }
    })
}

/// Convert a parsed YAML tree into the JSON data model.
///
/// Tags are dropped, scalar mapping keys are rendered as strings, and
/// numbers are carried over by their text so that decimals keep the
/// digits the exact-numeric keywords compare. `.inf` and `.nan` have no
/// JSON form and are rejected.
pub fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    use serde_yaml::Value as Yaml;

    Ok(match yaml {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(*b),
        Yaml::Number(n) => Value::Number(yaml_number(n)?),
        Yaml::String(s) => Value::String(s.clone()),
        Yaml::Sequence(items) => Value::Array(
            items
                .iter()
                .map(yaml_to_json_value)
                .collect::<Result<_, String>>()?,
        ),
        Yaml::Mapping(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| Ok((yaml_key(k)?, yaml_to_json_value(v)?)))
                .collect::<Result<_, String>>()?,
        ),
        Yaml::Tagged(tagged) => yaml_to_json_value(&tagged.value)?,
    })
}

fn yaml_number(n: &serde_yaml::Number) -> Result<serde_json::Number, String> {
    if n.is_nan() || n.is_infinite() {
        return Err(format!("YAML number {n} has no JSON representation"));
    }
    n.to_string()
        .parse::<serde_json::Number>()
        .map_err(|e| format!("YAML number {n} is not a JSON number: {e}"))
}

fn yaml_key(key: &serde_yaml::Value) -> Result<String, String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("mapping key must be a scalar, found {other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_yaml_to_json_conversion() {
        let yaml_str = r#"
type: object
minProperties: 2
additionalProperties: false
required:
  - name
  - id
"#;
        let json_value = parse_document(yaml_str, true).unwrap();
        assert_eq!(json_value["type"], "object");
        assert_eq!(json_value["minProperties"], 2);
        assert_eq!(json_value["additionalProperties"], false);
        assert_eq!(json_value["required"][1], "id");
    }

    #[test]
    fn test_yaml_numeric_keys_stringified() {
        let json_value = parse_document("1: one\ntrue: yes\n", true).unwrap();
        assert_eq!(json_value["1"], "one");
        assert_eq!(json_value["true"], "yes");
    }

    #[test]
    fn test_load_document_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml_path = dir.path().join("doc.yaml");
        std::fs::File::create(&yaml_path)
            .unwrap()
            .write_all(b"a: [1, 2]\n")
            .unwrap();
        let json_path = dir.path().join("doc.json");
        std::fs::write(&json_path, r#"{"a": [1, 2]}"#).unwrap();

        assert_eq!(load_document(&yaml_path).unwrap(), load_document(&json_path).unwrap());
    }

    #[test]
    fn test_load_document_errors() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{not json").unwrap();
        match load_document(&bad) {
            Err(SchemaValidationError::DocumentLoadError { reason, .. }) => {
                assert!(reason.starts_with("invalid JSON"));
            }
            other => panic!("Expected DocumentLoadError, got: {other:?}"),
        }
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            load_document(&missing),
            Err(SchemaValidationError::DocumentLoadError { .. })
        ));
    }

    #[test]
    fn test_yaml_decimals_keep_their_digits() {
        let yaml = "price: 19.99\nrate: 0.1\nbig: 18446744073709551615\n";
        let json_value = parse_document(yaml, true).unwrap();
        assert_eq!(json_value["price"].to_string(), "19.99");
        assert_eq!(json_value["rate"].to_string(), "0.1");
        assert_eq!(json_value["big"].to_string(), "18446744073709551615");
        let from_json: Value = serde_json::from_str(r#"{"price": 19.99, "rate": 0.1}"#).unwrap();
        assert_eq!(json_value["price"], from_json["price"]);
        assert_eq!(json_value["rate"], from_json["rate"]);
    }

    #[test]
    fn test_yaml_non_finite_numbers_rejected() {
        let err = parse_document("limit: .inf\n", true).unwrap_err();
        assert!(err.contains("no JSON representation"), "{err}");
        assert!(parse_document("limit: .nan\n", true).is_err());
    }
}
