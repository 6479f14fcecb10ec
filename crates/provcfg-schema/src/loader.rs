//! # Document Loading
//!
//! Reads provider configuration files from disk. YAML (`.yaml`/`.yml`) is
//! parsed with `serde_yaml` and converted into the `serde_json::Value` tree
//! the validator works on; anything else is parsed as JSON.

use std::path::Path;

use serde_json::Value;

use crate::error::ProviderConfigError;
use crate::store::SchemaStore;
use crate::validate::{ValidatedDocument, Validator};

/// Load a YAML or JSON document from `path`.
///
/// The format is chosen by extension: `.yaml`/`.yml` for YAML, JSON
/// otherwise.
///
/// # Errors
///
/// [`ProviderConfigError::DocumentLoad`] if the file cannot be read or parsed.
pub fn load_document(path: &Path) -> Result<Value, ProviderConfigError> {
    let load_error = |reason: String| ProviderConfigError::DocumentLoad {
        path: path.display().to_string(),
        reason,
    };

    let content =
        std::fs::read_to_string(path).map_err(|e| load_error(format!("cannot read file: {e}")))?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
                .map_err(|e| load_error(format!("invalid YAML: {e}")))?;
            yaml_to_json_value(&yaml)
                .map_err(|e| load_error(format!("YAML-to-JSON conversion failed: {e}")))
        }
        _ => serde_json::from_str(&content).map_err(|e| load_error(format!("invalid JSON: {e}"))),
    }
}

/// Load the document at `path` and validate it, stopping at the first failure.
pub fn parse_provider_file(
    path: &Path,
    validator: &Validator,
) -> Result<ValidatedDocument, ProviderConfigError> {
    let document = load_document(path)?;
    tracing::debug!(path = %path.display(), "validating provider configuration file");
    Ok(validator.validate(&document)?)
}

/// [`parse_provider_file`] against the packaged schema and the built-in
/// format checkers.
pub fn parse_provider_yaml(path: &Path) -> Result<ValidatedDocument, ProviderConfigError> {
    let validator = Validator::from_store(SchemaStore::global())?;
    parse_provider_file(path, &validator)
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Tags are dropped. Mapping keys must be strings, numbers or booleans.
pub(crate) fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::from(u))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => seq
            .iter()
            .map(yaml_to_json_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_yaml::Value::Mapping(map) => {
            let mut object = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported mapping key: {other:?}")),
                };
                object.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(object))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}
