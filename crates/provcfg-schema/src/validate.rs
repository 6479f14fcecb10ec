//! # Provider Configuration Validation
//!
//! Validates a deserialized configuration document against a compiled
//! [`ProviderSchema`], consulting a [`FormatRegistry`] for string formats.
//!
//! ## Evaluation Order
//!
//! The default mode is fail-fast and reports the first failure in this
//! order:
//!
//! 1. Structure: the root is a mapping, `meta` (if present) is a mapping,
//!    `providers` is present and is a sequence.
//! 2. Version gate: `meta.schema_version` is present, non-empty and matches
//!    the schema's version pattern. Nothing past the gate is inspected for
//!    a document whose version cannot be trusted.
//! 3. Each provider entry, in document order: identification exclusive-or,
//!    `uuid` format, `name` length, then `inventories` and `traits` keys and
//!    their restricted entries.
//!
//! An accepted document is returned unchanged.
//!
//! ## Collect-All Mode
//!
//! [`Validator::validate_all`] runs the structure and version gate
//! fail-fast, then hands the document to the `jsonschema` crate (draft-07,
//! every format named by the schema bound to the registry) and reports every
//! violation it finds. The engine is compiled on first use and kept for the
//! life of the validator and its clones.
//!
//! [`Validator::validate_configured`] picks the mode the validator was
//! configured with.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use provcfg_core::{
    ConfigDocument, CoreError, DocumentPath, FailureKind, SchemaVersion, ValidationFailure,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::{ValidationMode, ValidatorConfig};
use crate::error::ProviderConfigError;
use crate::format::FormatRegistry;
use crate::rules::{describe_value, EntrySchema, ExtensionRules, ProviderSchema};
use crate::store::SchemaStore;

const META: &str = "meta";
const SCHEMA_VERSION: &str = "schema_version";
const PROVIDERS: &str = "providers";
const IDENTIFICATION: &str = "identification";
const UUID: &str = "uuid";
const NAME: &str = "name";
const INVENTORIES: &str = "inventories";
const TRAITS: &str = "traits";

/// A document that passed validation, unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDocument {
    document: Value,
    schema_version: SchemaVersion,
}

impl ValidatedDocument {
    /// The validated document tree.
    pub fn as_value(&self) -> &Value {
        &self.document
    }

    /// Consumes self and returns the document tree.
    pub fn into_inner(self) -> Value {
        self.document
    }

    /// The document's declared schema version.
    pub fn schema_version(&self) -> SchemaVersion {
        self.schema_version
    }

    /// Number of provider entries.
    pub fn provider_count(&self) -> usize {
        self.document
            .get(PROVIDERS)
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// Build the typed provider model.
    pub fn to_model(&self) -> Result<ConfigDocument, CoreError> {
        ConfigDocument::from_value(&self.document)
    }
}

impl AsRef<Value> for ValidatedDocument {
    fn as_ref(&self) -> &Value {
        &self.document
    }
}

/// A single collect-all violation.
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    /// JSON Pointer path to the violating node in the document.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    /// Empty for failures raised by the structure and version gate.
    pub schema_path: String,
    /// Failure kind, when the violation came from the fail-fast gate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
    /// Human-readable description of the violation.
    pub message: String,
}

impl From<ValidationFailure> for Violation {
    fn from(failure: ValidationFailure) -> Self {
        Self {
            instance_path: failure.path.to_pointer(),
            schema_path: String::new(),
            kind: Some(failure.kind),
            message: failure.message,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Collection of collect-all violations. Never empty when returned as an error.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl From<ValidationFailure> for ValidationViolations {
    fn from(failure: ValidationFailure) -> Self {
        Self {
            violations: vec![failure.into()],
        }
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Validates provider configuration documents.
///
/// Cheap to clone; clones share the schema, the format registry and the
/// compiled JSON Schema engine. `Validator` is `Send + Sync`.
#[derive(Clone)]
pub struct Validator {
    schema: Arc<ProviderSchema>,
    formats: Arc<FormatRegistry>,
    mode: ValidationMode,
    compiled: Arc<OnceCell<jsonschema::Validator>>,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("schema_version", &self.schema.version())
            .field("formats", &self.formats)
            .field("mode", &self.mode)
            .field("compiled", &self.compiled.get().is_some())
            .finish()
    }
}

impl Validator {
    /// A fail-fast validator over an already loaded schema and a registry.
    pub fn new(schema: Arc<ProviderSchema>, formats: Arc<FormatRegistry>) -> Self {
        Self {
            schema,
            formats,
            mode: ValidationMode::default(),
            compiled: Arc::new(OnceCell::new()),
        }
    }

    /// A validator over `store`'s schema with the built-in format checkers.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderConfigError::SchemaUnavailable`] if the store cannot load.
    pub fn from_store(store: &SchemaStore) -> Result<Self, ProviderConfigError> {
        Ok(Self::new(store.load()?, Arc::new(FormatRegistry::with_builtins())))
    }

    /// A validator for `config`'s schema source, checking in `config`'s mode.
    ///
    /// The embedded source goes through the process-wide store; other
    /// sources get a store of their own.
    pub fn from_config(config: &ValidatorConfig) -> Result<Self, ProviderConfigError> {
        let validator = match &config.source {
            crate::store::SchemaSource::Embedded => Self::from_store(SchemaStore::global())?,
            other => Self::from_store(&SchemaStore::new(other.clone()))?,
        };
        Ok(validator.with_mode(config.mode))
    }

    /// The same validator, checking in `mode` from [`Validator::validate_configured`].
    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Mode used by [`Validator::validate_configured`].
    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// The compiled schema.
    pub fn schema(&self) -> &ProviderSchema {
        &self.schema
    }

    /// The format registry. Checkers registered here are seen by this
    /// validator and all of its clones.
    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    /// Validate `document`, stopping at the first failure.
    pub fn validate(&self, document: &Value) -> Result<ValidatedDocument, ValidationFailure> {
        let result = validate(document, &self.schema, &self.formats);
        match &result {
            Ok(validated) => tracing::debug!(
                schema_version = %validated.schema_version(),
                providers = validated.provider_count(),
                "provider configuration accepted"
            ),
            Err(failure) => tracing::debug!(
                kind = %failure.kind,
                path = %failure.path,
                "provider configuration rejected: {}",
                failure.message
            ),
        }
        result
    }

    /// Validate `document`, reporting every violation.
    ///
    /// # Errors
    ///
    /// [`ProviderConfigError::Violations`] for an invalid document,
    /// [`ProviderConfigError::SchemaUnavailable`] if the schema cannot be
    /// compiled by the JSON Schema engine.
    pub fn validate_all(&self, document: &Value) -> Result<ValidatedDocument, ProviderConfigError> {
        let walker = Walker::new(&self.schema, &self.formats);
        let schema_version = walker
            .check_structure(document)
            .and_then(|root| walker.check_version(root))
            .map_err(ValidationViolations::from)?;

        let compiled = self.compiled()?;
        let violations: Vec<Violation> = compiled
            .iter_errors(document)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                kind: None,
                message: e.to_string(),
            })
            .collect();

        if violations.is_empty() {
            Ok(ValidatedDocument {
                document: document.clone(),
                schema_version,
            })
        } else {
            tracing::debug!(count = violations.len(), "provider configuration rejected");
            Err(ValidationViolations { violations }.into())
        }
    }

    /// Validate in the given mode.
    pub fn validate_with_mode(
        &self,
        document: &Value,
        mode: ValidationMode,
    ) -> Result<ValidatedDocument, ProviderConfigError> {
        match mode {
            ValidationMode::FailFast => Ok(self.validate(document)?),
            ValidationMode::CollectAll => self.validate_all(document),
        }
    }

    /// Validate in this validator's own mode.
    pub fn validate_configured(
        &self,
        document: &Value,
    ) -> Result<ValidatedDocument, ProviderConfigError> {
        self.validate_with_mode(document, self.mode)
    }

    /// The schema compiled by the `jsonschema` crate. Built on first use and
    /// shared by every clone; a failed build is not cached.
    fn compiled(&self) -> Result<&jsonschema::Validator, ProviderConfigError> {
        self.compiled.get_or_try_init(|| self.build_validator())
    }

    /// Compile the schema, binding every format the schema names to this
    /// validator's registry.
    fn build_validator(&self) -> Result<jsonschema::Validator, ProviderConfigError> {
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft7);
        opts.should_validate_formats(true);
        for name in self.schema.format_names() {
            let formats = Arc::clone(&self.formats);
            let format_name = name.to_string();
            opts.with_format(name.to_string(), move |value: &str| {
                formats.check(&format_name, value)
            });
        }
        tracing::debug!(schema_version = %self.schema.version(), "compiling provider schema");
        opts.build(self.schema.raw())
            .map_err(|e| ProviderConfigError::SchemaUnavailable {
                source_name: "compiled provider schema".to_string(),
                reason: e.to_string(),
            })
    }
}

/// Validate `document` against `schema`, stopping at the first failure.
pub fn validate(
    document: &Value,
    schema: &ProviderSchema,
    formats: &FormatRegistry,
) -> Result<ValidatedDocument, ValidationFailure> {
    let walker = Walker::new(schema, formats);
    let root = walker.check_structure(document)?;
    let schema_version = walker.check_version(root)?;

    let providers_path = DocumentPath::root().key(PROVIDERS);
    if let Some(Value::Array(providers)) = root.get(PROVIDERS) {
        for (index, entry) in providers.iter().enumerate() {
            walker.check_provider(entry, &providers_path.index(index))?;
        }
    }

    Ok(ValidatedDocument {
        document: document.clone(),
        schema_version,
    })
}

struct Walker<'a> {
    schema: &'a ProviderSchema,
    formats: &'a FormatRegistry,
}

fn fail(kind: FailureKind, path: DocumentPath, message: impl Into<String>) -> ValidationFailure {
    ValidationFailure::new(kind, path, message)
}

impl<'a> Walker<'a> {
    fn new(schema: &'a ProviderSchema, formats: &'a FormatRegistry) -> Self {
        Self { schema, formats }
    }

    fn check_structure<'d>(
        &self,
        document: &'d Value,
    ) -> Result<&'d Map<String, Value>, ValidationFailure> {
        let root = DocumentPath::root();
        let Some(map) = document.as_object() else {
            return Err(fail(
                FailureKind::DocumentMalformed,
                root,
                format!("document must be a mapping, found {}", describe_value(document)),
            ));
        };

        if let Some(meta) = map.get(META) {
            if !meta.is_object() {
                return Err(fail(
                    FailureKind::DocumentMalformed,
                    root.key(META),
                    format!("meta must be a mapping, found {}", describe_value(meta)),
                ));
            }
        }

        match map.get(PROVIDERS) {
            None => Err(fail(
                FailureKind::DocumentMalformed,
                root.key(PROVIDERS),
                "providers is required",
            )),
            Some(Value::Array(_)) => Ok(map),
            Some(other) => Err(fail(
                FailureKind::DocumentMalformed,
                root.key(PROVIDERS),
                format!("providers must be a sequence, found {}", describe_value(other)),
            )),
        }
    }

    fn check_version(&self, root: &Map<String, Value>) -> Result<SchemaVersion, ValidationFailure> {
        let meta_path = DocumentPath::root().key(META);
        let Some(meta) = root.get(META).and_then(Value::as_object) else {
            return Err(fail(
                FailureKind::VersionInvalid,
                meta_path,
                "meta is required to declare schema_version",
            ));
        };

        let path = meta_path.key(SCHEMA_VERSION);
        let raw = match meta.get(SCHEMA_VERSION) {
            None => {
                return Err(fail(FailureKind::VersionInvalid, path, "schema_version is required"))
            }
            Some(Value::String(raw)) => raw,
            Some(other) => {
                return Err(fail(
                    FailureKind::VersionInvalid,
                    path,
                    format!("schema_version must be a string, found {}", describe_value(other)),
                ))
            }
        };

        if raw.is_empty() {
            return Err(fail(FailureKind::VersionInvalid, path, "schema_version must not be empty"));
        }

        let pattern = self.schema.version_pattern();
        if !pattern.is_match(raw) {
            return Err(fail(
                FailureKind::VersionInvalid,
                path,
                format!("{raw:?} does not match pattern {:?}", pattern.as_str()),
            ));
        }

        raw.parse()
            .map_err(|e: CoreError| fail(FailureKind::VersionInvalid, path, e.to_string()))
    }

    fn check_provider(&self, entry: &Value, path: &DocumentPath) -> Result<(), ValidationFailure> {
        let Some(entry) = entry.as_object() else {
            return Err(fail(
                FailureKind::DocumentMalformed,
                path.clone(),
                format!("provider entry must be a mapping, found {}", describe_value(entry)),
            ));
        };
        tracing::trace!(path = %path, "checking provider entry");

        self.check_identification(entry.get(IDENTIFICATION), &path.key(IDENTIFICATION))?;
        if let Some(inventories) = entry.get(INVENTORIES) {
            self.check_extension(
                inventories,
                self.schema.inventories(),
                "resource class",
                &path.key(INVENTORIES),
            )?;
        }
        if let Some(traits) = entry.get(TRAITS) {
            self.check_extension(traits, self.schema.traits(), "trait", &path.key(TRAITS))?;
        }
        Ok(())
    }

    fn check_identification(
        &self,
        identification: Option<&Value>,
        path: &DocumentPath,
    ) -> Result<(), ValidationFailure> {
        let invalid = |path: DocumentPath, message: String| {
            fail(FailureKind::IdentificationInvalid, path, message)
        };

        let identification = match identification {
            None => return Err(invalid(path.clone(), "identification is required".to_string())),
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(invalid(
                    path.clone(),
                    format!("identification must be a mapping, found {}", describe_value(other)),
                ))
            }
        };

        match (identification.get(UUID), identification.get(NAME)) {
            (Some(_), Some(_)) => {
                return Err(invalid(
                    path.clone(),
                    "exactly one of uuid or name is allowed, found both".to_string(),
                ))
            }
            (None, None) => {
                return Err(invalid(
                    path.clone(),
                    "exactly one of uuid or name is required, found neither".to_string(),
                ))
            }
            _ => {}
        }

        if let Some(extra) = identification.keys().find(|k| *k != UUID && *k != NAME) {
            return Err(invalid(
                path.key(extra.as_str()),
                format!("unexpected identification field {extra:?}; only uuid or name is allowed"),
            ));
        }

        let rules = self.schema.identification();
        if let Some(uuid) = identification.get(UUID) {
            let path = path.key(UUID);
            let Some(raw) = uuid.as_str() else {
                return Err(invalid(
                    path,
                    format!("uuid must be a string, found {}", describe_value(uuid)),
                ));
            };
            if !self.formats.check(&rules.uuid_format, raw) {
                return Err(invalid(path, format!("{raw:?} is not a valid {}", rules.uuid_format)));
            }
        }

        if let Some(name) = identification.get(NAME) {
            let path = path.key(NAME);
            let Some(raw) = name.as_str() else {
                return Err(invalid(
                    path,
                    format!("name must be a string, found {}", describe_value(name)),
                ));
            };
            if raw.chars().count() < rules.name_min_length {
                let message = if raw.is_empty() {
                    "name must not be empty".to_string()
                } else {
                    format!("name must be at least {} characters", rules.name_min_length)
                };
                return Err(invalid(path, message));
            }
        }

        Ok(())
    }

    fn check_extension(
        &self,
        container: &Value,
        rules: &ExtensionRules,
        noun: &str,
        path: &DocumentPath,
    ) -> Result<(), ValidationFailure> {
        let Some(entries) = container.as_object() else {
            return Err(fail(
                FailureKind::DocumentMalformed,
                path.clone(),
                format!(
                    "expected a mapping of {noun} to entry, found {}",
                    describe_value(container)
                ),
            ));
        };

        for (key, value) in entries {
            let entry_path = path.key(key.as_str());
            match rules.resolve(key) {
                Some(schema) => self.check_entry(value, schema, &entry_path)?,
                None if rules.additional_allowed() => {}
                None => {
                    let patterns: Vec<&str> = rules.custom_patterns().collect();
                    return Err(fail(
                        FailureKind::UnknownProperty,
                        entry_path,
                        format!(
                            "unknown {noun} {key:?}: not a known {noun} and does not match {}",
                            patterns.join(" or ")
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    fn check_entry(
        &self,
        value: &Value,
        schema: &EntrySchema,
        path: &DocumentPath,
    ) -> Result<(), ValidationFailure> {
        let record = match schema {
            EntrySchema::Scalar(scalar) => {
                return scalar
                    .check(value)
                    .map_err(|message| fail(FailureKind::SubSchemaInvalid, path.clone(), message));
            }
            EntrySchema::Record(record) => record,
        };

        let Some(fields) = value.as_object() else {
            return Err(fail(
                FailureKind::SubSchemaInvalid,
                path.clone(),
                format!("expected a mapping, found {}", describe_value(value)),
            ));
        };

        for (field, field_value) in fields {
            let field_path = path.key(field.as_str());
            match record.fields.get(field) {
                Some(scalar) => scalar.check(field_value).map_err(|message| {
                    fail(FailureKind::SubSchemaInvalid, field_path, format!("{field}: {message}"))
                })?,
                None if record.additional_allowed => {}
                None => {
                    return Err(fail(
                        FailureKind::UnknownProperty,
                        field_path,
                        format!("unexpected field {field:?}"),
                    ))
                }
            }
        }

        if let Some(missing) = record.required.iter().find(|r| !fields.contains_key(r.as_str())) {
            return Err(fail(
                FailureKind::SubSchemaInvalid,
                path.clone(),
                format!("{missing} is required"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const VALID_UUID: &str = "5a4b8e0c-3f5d-4b6e-9a1c-2d3e4f5a6b7c";

    fn validator() -> Validator {
        Validator::from_store(SchemaStore::global()).unwrap()
    }

    fn doc(providers: Value) -> Value {
        json!({"meta": {"schema_version": "1.0"}, "providers": providers})
    }

    fn failure(document: &Value) -> ValidationFailure {
        validator().validate(document).unwrap_err()
    }

    #[test]
    fn test_root_must_be_mapping() {
        let f = failure(&json!(["providers"]));
        assert_eq!(f.kind, FailureKind::DocumentMalformed);
        assert!(f.path.is_root());
    }

    #[test]
    fn test_providers_required() {
        let f = failure(&json!({"meta": {"schema_version": "1.0"}}));
        assert_eq!(f.kind, FailureKind::DocumentMalformed);
        assert_eq!(f.path.to_pointer(), "/providers");
    }

    #[test]
    fn test_providers_must_be_sequence() {
        let f = failure(&json!({"meta": {"schema_version": "1.0"}, "providers": {"a": 1}}));
        assert_eq!(f.kind, FailureKind::DocumentMalformed);
        assert!(f.message.contains("sequence"));
    }

    #[test]
    fn test_meta_must_be_mapping() {
        let f = failure(&json!({"meta": "1.0", "providers": []}));
        assert_eq!(f.kind, FailureKind::DocumentMalformed);
        assert_eq!(f.path.to_pointer(), "/meta");
    }

    #[test]
    fn test_empty_providers_accepted() {
        let document = doc(json!([]));
        let validated = validator().validate(&document).unwrap();
        assert_eq!(validated.provider_count(), 0);
        assert_eq!(validated.as_value(), &document);
    }

    #[test]
    fn test_version_gate_messages() {
        let f = failure(&json!({"meta": {}, "providers": []}));
        assert_eq!(f.kind, FailureKind::VersionInvalid);
        assert_eq!(f.path.to_pointer(), "/meta/schema_version");

        let f = failure(&json!({"meta": {"schema_version": 1.0}, "providers": []}));
        assert_eq!(f.kind, FailureKind::VersionInvalid);
        assert!(f.message.contains("string"));

        let f = failure(&json!({"meta": {"schema_version": "2.0"}, "providers": []}));
        assert_eq!(f.kind, FailureKind::VersionInvalid);
        assert!(f.message.contains("does not match pattern"));

        let f = failure(&json!({"meta": {"schema_version": "1.01"}, "providers": []}));
        assert_eq!(f.kind, FailureKind::VersionInvalid);
    }

    #[test]
    fn test_validated_document_version() {
        let validated = validator()
            .validate(&json!({"meta": {"schema_version": "1.12"}, "providers": []}))
            .unwrap();
        assert_eq!(validated.schema_version(), SchemaVersion::new(1, 12));
    }

    #[test]
    fn test_provider_entry_must_be_mapping() {
        let f = failure(&doc(json!(["foo"])));
        assert_eq!(f.kind, FailureKind::DocumentMalformed);
        assert_eq!(f.path.to_pointer(), "/providers/0");
    }

    #[test]
    fn test_identification_must_be_mapping() {
        let f = failure(&doc(json!([{"identification": "foo"}])));
        assert_eq!(f.kind, FailureKind::IdentificationInvalid);
        assert_eq!(f.path.to_pointer(), "/providers/0/identification");
    }

    #[test]
    fn test_identification_extra_field() {
        let f = failure(&doc(json!([{"identification": {"name": "foo", "id": 3}}])));
        assert_eq!(f.kind, FailureKind::IdentificationInvalid);
        assert_eq!(f.path.to_pointer(), "/providers/0/identification/id");
    }

    #[test]
    fn test_identification_non_string_values() {
        let f = failure(&doc(json!([{"identification": {"uuid": 42}}])));
        assert_eq!(f.path.to_pointer(), "/providers/0/identification/uuid");
        let f = failure(&doc(json!([{"identification": {"name": null}}])));
        assert_eq!(f.path.to_pointer(), "/providers/0/identification/name");
        assert_eq!(f.kind, FailureKind::IdentificationInvalid);
    }

    #[test]
    fn test_custom_format_checker_is_used() {
        let registry = FormatRegistry::with_builtins();
        registry.register("uuid", |s: &str| s == "$COMPUTE_NODE");
        let v = Validator::new(SchemaStore::global().load().unwrap(), Arc::new(registry));

        assert!(v.validate(&doc(json!([{"identification": {"uuid": "$COMPUTE_NODE"}}]))).is_ok());
        let f = v
            .validate(&doc(json!([{"identification": {"uuid": VALID_UUID}}])))
            .unwrap_err();
        assert_eq!(f.kind, FailureKind::IdentificationInvalid);
    }

    #[test]
    fn test_unregistered_format_fails_closed() {
        let schema = SchemaStore::global().load().unwrap();
        let v = Validator::new(schema, Arc::new(FormatRegistry::new()));
        let f = v
            .validate(&doc(json!([{"identification": {"uuid": VALID_UUID}}])))
            .unwrap_err();
        assert_eq!(f.kind, FailureKind::IdentificationInvalid);
        assert!(v.validate(&doc(json!([{"identification": {"name": "foo"}}]))).is_ok());
    }

    #[test]
    fn test_inventories_must_be_mapping() {
        let f = failure(&doc(json!([{"identification": {"name": "foo"}, "inventories": ["123"]}])));
        assert_eq!(f.kind, FailureKind::DocumentMalformed);
        assert_eq!(f.path.to_pointer(), "/providers/0/inventories");
    }

    #[test]
    fn test_unknown_property_message_lists_pattern() {
        let f = failure(&doc(json!([{
            "identification": {"name": "foo"},
            "traits": {"GOLD": true}
        }])));
        assert_eq!(f.kind, FailureKind::UnknownProperty);
        assert_eq!(f.path.to_pointer(), "/providers/0/traits/GOLD");
        assert!(f.message.contains("^CUSTOM_[A-Z0-9_]+$"), "{}", f.message);
    }

    #[test]
    fn test_inventory_entry_must_be_mapping() {
        let f = failure(&doc(json!([{
            "identification": {"name": "foo"},
            "inventories": {"VCPU": 8}
        }])));
        assert_eq!(f.kind, FailureKind::SubSchemaInvalid);
        assert_eq!(f.path.to_pointer(), "/providers/0/inventories/VCPU");
    }

    #[test]
    fn test_inventory_minimum() {
        let f = failure(&doc(json!([{
            "identification": {"name": "foo"},
            "inventories": {"CUSTOM_FPGA": {"total": 4, "step_size": 0}}
        }])));
        assert_eq!(f.kind, FailureKind::SubSchemaInvalid);
        assert_eq!(f.path.to_pointer(), "/providers/0/inventories/CUSTOM_FPGA/step_size");
    }

    #[test]
    fn test_trait_value_must_be_boolean() {
        let f = failure(&doc(json!([{
            "identification": {"name": "foo"},
            "traits": {"CUSTOM_GOLD": "yes"}
        }])));
        assert_eq!(f.kind, FailureKind::SubSchemaInvalid);
        assert_eq!(f.path.to_pointer(), "/providers/0/traits/CUSTOM_GOLD");
    }

    #[test]
    fn test_first_failure_in_document_order() {
        let f = failure(&doc(json!([
            {"identification": {"name": "ok"}},
            {"identification": {"name": "ok2"}, "traits": {"BAD": true}},
            {"identification": {}}
        ])));
        assert_eq!(f.kind, FailureKind::UnknownProperty);
        assert_eq!(f.path.to_pointer(), "/providers/1/traits/BAD");
    }

    #[test]
    fn test_validate_with_mode_fail_fast_wraps_failure() {
        let err = validator()
            .validate_with_mode(&doc(json!([{}])), ValidationMode::FailFast)
            .unwrap_err();
        assert_eq!(err.as_failure().map(|f| f.kind), Some(FailureKind::IdentificationInvalid));
    }

    #[test]
    fn test_compiled_engine_is_built_once_and_shared_by_clones() {
        let v = validator();
        assert!(v.compiled.get().is_none());
        let first: *const jsonschema::Validator = v.compiled().unwrap();
        let second: *const jsonschema::Validator = v.compiled().unwrap();
        assert_eq!(first, second);

        let clone = v.clone();
        let from_clone: *const jsonschema::Validator = clone.compiled().unwrap();
        assert_eq!(first, from_clone);
    }

    #[test]
    fn test_collect_all_reuses_compiled_engine() {
        let v = validator();
        v.validate_all(&doc(json!([]))).unwrap();
        let after_first: *const jsonschema::Validator = v.compiled.get().unwrap();
        v.validate_all(&doc(json!([{}]))).unwrap_err();
        let after_second: *const jsonschema::Validator = v.compiled.get().unwrap();
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn test_from_config_applies_mode() {
        let invalid = doc(json!([{}, {"identification": {"uuid": "nope"}}]));

        let config = ValidatorConfig::default().with_mode(ValidationMode::CollectAll);
        let v = Validator::from_config(&config).unwrap();
        assert_eq!(v.mode(), ValidationMode::CollectAll);
        let err = v.validate_configured(&invalid).unwrap_err();
        let ProviderConfigError::Violations(violations) = err else {
            panic!("expected violations, got {err}");
        };
        assert!(violations.len() >= 2, "{violations}");

        let v = Validator::from_config(&ValidatorConfig::default()).unwrap();
        assert_eq!(v.mode(), ValidationMode::FailFast);
        let err = v.validate_configured(&invalid).unwrap_err();
        assert_eq!(err.as_failure().map(|f| f.kind), Some(FailureKind::IdentificationInvalid));
    }

    #[test]
    fn test_with_mode_keeps_compiled_engine() {
        let v = validator();
        v.compiled().unwrap();
        let collect_all = v.clone().with_mode(ValidationMode::CollectAll);
        assert_eq!(collect_all.mode(), ValidationMode::CollectAll);
        assert!(collect_all.compiled.get().is_some());
        assert_eq!(v.mode(), ValidationMode::FailFast);
    }

    #[test]
    fn test_collect_all_reports_every_violation() {
        let document = doc(json!([
            {"identification": {"uuid": "not-quite-a-uuid"}},
            {"identification": {"name": "foo"}, "traits": {"GOLD": true}},
            {"identification": {"name": "bar"}, "inventories": {"CUSTOM_X": {"total": "many"}}}
        ]));
        let err = validator().validate_all(&document).unwrap_err();
        let ProviderConfigError::Violations(violations) = err else {
            panic!("expected violations, got {err}");
        };
        assert!(violations.len() >= 3, "{violations}");
        let paths: Vec<&str> = violations
            .violations()
            .iter()
            .map(|v| v.instance_path.as_str())
            .collect();
        assert!(paths.iter().any(|p| p.starts_with("/providers/0")), "{paths:?}");
        assert!(paths.iter().any(|p| p.starts_with("/providers/1")), "{paths:?}");
        assert!(paths.iter().any(|p| p.starts_with("/providers/2")), "{paths:?}");
    }

    #[test]
    fn test_collect_all_honors_version_gate() {
        let document = json!({
            "meta": {"schema_version": "!@#"},
            "providers": [{"identification": {"uuid": "invalid!@#"}}]
        });
        let err = validator().validate_all(&document).unwrap_err();
        let ProviderConfigError::Violations(violations) = err else {
            panic!("expected violations, got {err}");
        };
        assert_eq!(violations.len(), 1);
        assert_eq!(violations.violations()[0].kind, Some(FailureKind::VersionInvalid));
        assert_eq!(violations.violations()[0].instance_path, "/meta/schema_version");
    }

    #[test]
    fn test_collect_all_accepts_valid_document() {
        let document = doc(json!([
            {"identification": {"uuid": VALID_UUID}, "inventories": {"VCPU": {"total": 8}}},
            {"identification": {"name": "foo"}, "traits": {"CUSTOM_GOLD": true}}
        ]));
        let validated = validator()
            .validate_with_mode(&document, ValidationMode::CollectAll)
            .unwrap();
        assert_eq!(validated.into_inner(), document);
    }

    #[test]
    fn test_violation_display() {
        let v = Violation {
            instance_path: "/providers/0/identification/uuid".to_string(),
            schema_path: "/definitions/identification/properties/uuid/format".to_string(),
            kind: None,
            message: r#""abc" is not a "uuid""#.to_string(),
        };
        assert!(v.to_string().contains("/providers/0/identification/uuid"));

        let root = Violation::from(ValidationFailure::new(
            FailureKind::DocumentMalformed,
            DocumentPath::root(),
            "document must be a mapping",
        ));
        assert!(root.to_string().contains("(root)"));
    }

    #[test]
    fn test_to_model() {
        let validated = validator()
            .validate(&doc(json!([{
                "identification": {"name": "foo"},
                "inventories": {"CUSTOM_FPGA": {"total": 2}},
                "traits": {"CUSTOM_GOLD": true}
            }])))
            .unwrap();
        let model = validated.to_model().unwrap();
        assert_eq!(model.providers[0].inventories["CUSTOM_FPGA"].total, 2);
        assert!(model.provider_by_name("foo").is_some());
    }
}
