//! # Compiled Schema Rules
//!
//! The fail-fast validator does not interpret JSON Schema generically. At
//! load time the schema document is mined for the handful of parameters
//! the provider rules depend on, and those are compiled once:
//!
//! | Rule | Read from |
//! |------|-----------|
//! | version pattern | `/properties/meta/properties/schema_version/pattern` |
//! | identification | `/properties/providers/items` → `identification` |
//! | inventories, traits | `properties`, `patternProperties`, `additionalProperties` |
//! | entry sub-schemas | `type`, `properties`, `required`, `minimum`, `additionalProperties` |
//!
//! For `inventories` and `traits`, `properties` lists the known identifiers
//! and `patternProperties` the custom naming patterns. Local `$ref`s
//! (`#/...`) are followed. A schema missing any of these
//! parameters is rejected as unusable.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use provcfg_core::SchemaVersion;
use regex::Regex;
use serde_json::{Map, Value};

/// Keyword carrying the schema asset's own version.
pub const SCHEMA_VERSION_KEYWORD: &str = "x-schema-version";

/// Maximum chain of `$ref` hops followed before giving up.
const MAX_REF_DEPTH: usize = 16;

/// A provider schema, compiled for the fail-fast validator.
///
/// Read-only once built. Shared between threads behind an `Arc`.
#[derive(Debug)]
pub struct ProviderSchema {
    raw: Value,
    version: SchemaVersion,
    version_pattern: Regex,
    identification: IdentificationRules,
    inventories: ExtensionRules,
    traits: ExtensionRules,
    formats: BTreeSet<String>,
}

/// Parameters of the identification exclusive-or rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentificationRules {
    /// Format checker applied to `uuid`.
    pub uuid_format: String,
    /// Minimum number of characters in `name`.
    pub name_min_length: usize,
}

/// Rules for a mapping whose keys are identifiers (resource classes, traits).
#[derive(Debug)]
pub struct ExtensionRules {
    known: BTreeMap<String, EntrySchema>,
    custom: Vec<(Regex, EntrySchema)>,
    additional_allowed: bool,
}

/// Restricted sub-schema for one extension entry.
#[derive(Debug, Clone, PartialEq)]
pub enum EntrySchema {
    /// A mapping with typed scalar fields.
    Record(RecordSchema),
    /// A single scalar value.
    Scalar(ScalarSchema),
}

/// Object entry: known fields, required fields, closed or open.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    pub fields: BTreeMap<String, ScalarSchema>,
    pub required: Vec<String>,
    pub additional_allowed: bool,
}

/// Type and lower bound of a scalar leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarSchema {
    pub kind: ScalarKind,
    pub minimum: Option<f64>,
}

/// JSON scalar types an entry may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Boolean,
    Integer,
    Number,
    String,
}

impl ScalarKind {
    fn from_type(name: &str) -> Option<Self> {
        match name {
            "boolean" => Some(Self::Boolean),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "string" => Some(Self::String),
            _ => None,
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Boolean => value.is_boolean(),
            Self::Integer => {
                value.is_i64()
                    || value.is_u64()
                    || value.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
            }
            Self::Number => value.is_number(),
            Self::String => value.is_string(),
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
        })
    }
}

/// Short name of a value's type, for messages.
pub(crate) fn describe_value(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

impl ScalarSchema {
    /// Check `value` against this leaf schema, returning a message on failure.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        if !self.kind.matches(value) {
            return Err(format!(
                "expected {}, found {} {value}",
                self.kind,
                describe_value(value)
            ));
        }
        if let (Some(minimum), Some(number)) = (self.minimum, value.as_f64()) {
            if number < minimum {
                return Err(format!("{value} is less than the minimum of {minimum}"));
            }
        }
        Ok(())
    }
}

impl ExtensionRules {
    /// Sub-schema for `key`: a known identifier first, then the first
    /// custom pattern that matches. `None` means the key is unknown.
    pub fn resolve(&self, key: &str) -> Option<&EntrySchema> {
        self.known.get(key).or_else(|| {
            self.custom
                .iter()
                .find(|(pattern, _)| pattern.is_match(key))
                .map(|(_, entry)| entry)
        })
    }

    /// True if keys that resolve to nothing are accepted unchecked.
    pub fn additional_allowed(&self) -> bool {
        self.additional_allowed
    }

    /// Known identifiers, sorted.
    pub fn known_keys(&self) -> impl Iterator<Item = &str> {
        self.known.keys().map(String::as_str)
    }

    /// Custom naming patterns, in schema order.
    pub fn custom_patterns(&self) -> impl Iterator<Item = &str> {
        self.custom.iter().map(|(pattern, _)| pattern.as_str())
    }
}

impl ProviderSchema {
    /// Compile a schema document.
    ///
    /// # Errors
    ///
    /// Returns a description of the first missing or malformed parameter.
    pub fn compile(raw: Value) -> Result<Self, String> {
        let version = raw
            .get(SCHEMA_VERSION_KEYWORD)
            .and_then(Value::as_str)
            .ok_or_else(|| format!("schema has no {SCHEMA_VERSION_KEYWORD} string"))?
            .parse::<SchemaVersion>()
            .map_err(|e| e.to_string())?;

        let version_pattern =
            lookup(&raw, &raw, "/properties/meta/properties/schema_version/pattern")?
                .as_str()
                .ok_or("schema_version pattern is not a string")?;
        let version_pattern = compile_pattern(version_pattern)?;

        let provider = lookup(&raw, &raw, "/properties/providers/items")?;
        let identification =
            compile_identification(&raw, lookup(&raw, provider, "/properties/identification")?)?;
        let inventories =
            compile_extension(&raw, lookup(&raw, provider, "/properties/inventories")?)?;
        let traits = compile_extension(&raw, lookup(&raw, provider, "/properties/traits")?)?;

        let mut formats = BTreeSet::new();
        collect_formats(&raw, &mut formats);

        Ok(Self {
            raw,
            version,
            version_pattern,
            identification,
            inventories,
            traits,
            formats,
        })
    }

    /// The schema document as loaded.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// The schema asset's own version.
    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Pattern `meta.schema_version` must match.
    pub fn version_pattern(&self) -> &Regex {
        &self.version_pattern
    }

    pub fn identification(&self) -> &IdentificationRules {
        &self.identification
    }

    pub fn inventories(&self) -> &ExtensionRules {
        &self.inventories
    }

    pub fn traits(&self) -> &ExtensionRules {
        &self.traits
    }

    /// Every format name used anywhere in the schema.
    pub fn format_names(&self) -> impl Iterator<Item = &str> {
        self.formats.iter().map(String::as_str)
    }
}

/// Follow a local `$ref` chain starting at `node`.
fn resolve_ref<'a>(root: &'a Value, node: &'a Value) -> Result<&'a Value, String> {
    let mut current = node;
    for _ in 0..MAX_REF_DEPTH {
        let Some(reference) = current.get("$ref").and_then(Value::as_str) else {
            return Ok(current);
        };
        let pointer = reference
            .strip_prefix('#')
            .ok_or_else(|| format!("only local $ref is supported, found {reference:?}"))?;
        current = root
            .pointer(pointer)
            .ok_or_else(|| format!("unresolvable $ref {reference:?}"))?;
    }
    Err(format!("$ref chain deeper than {MAX_REF_DEPTH}"))
}

/// Resolve `node`, then look up `pointer` beneath it and resolve the result.
fn lookup<'a>(root: &'a Value, node: &'a Value, pointer: &str) -> Result<&'a Value, String> {
    let base = resolve_ref(root, node)?;
    let found = base
        .pointer(pointer)
        .ok_or_else(|| format!("schema is missing {pointer}"))?;
    resolve_ref(root, found)
}

fn compile_pattern(pattern: &str) -> Result<Regex, String> {
    Regex::new(pattern).map_err(|e| format!("invalid pattern {pattern:?}: {e}"))
}

fn compile_identification(root: &Value, node: &Value) -> Result<IdentificationRules, String> {
    let uuid_format = lookup(root, node, "/properties/uuid/format")?
        .as_str()
        .ok_or("identification uuid format is not a string")?
        .to_string();
    let name = lookup(root, node, "/properties/name")?;
    let name_min_length = match name.get("minLength") {
        None => 1,
        Some(value) => value
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or("identification name minLength is not a non-negative integer")?,
    };
    Ok(IdentificationRules {
        uuid_format,
        name_min_length,
    })
}

fn additional_allowed(node: &Value) -> bool {
    node.get("additionalProperties") != Some(&Value::Bool(false))
}

fn object_at<'a>(node: &'a Value, keyword: &str) -> Result<Option<&'a Map<String, Value>>, String> {
    match node.get(keyword) {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(format!("{keyword} must be a mapping")),
    }
}

fn compile_extension(root: &Value, node: &Value) -> Result<ExtensionRules, String> {
    let mut known = BTreeMap::new();
    if let Some(properties) = object_at(node, "properties")? {
        for (key, entry) in properties {
            known.insert(key.clone(), compile_entry(root, entry)?);
        }
    }

    let mut custom = Vec::new();
    if let Some(patterns) = object_at(node, "patternProperties")? {
        for (pattern, entry) in patterns {
            custom.push((compile_pattern(pattern)?, compile_entry(root, entry)?));
        }
    }

    Ok(ExtensionRules {
        known,
        custom,
        additional_allowed: additional_allowed(node),
    })
}

fn compile_entry(root: &Value, node: &Value) -> Result<EntrySchema, String> {
    let node = resolve_ref(root, node)?;
    if node.get("type").and_then(Value::as_str) != Some("object") {
        return compile_scalar(node).map(EntrySchema::Scalar);
    }

    let mut fields = BTreeMap::new();
    if let Some(properties) = object_at(node, "properties")? {
        for (name, field) in properties {
            fields.insert(name.clone(), compile_scalar(resolve_ref(root, field)?)?);
        }
    }

    let required = match node.get("required") {
        None => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| "required entries must be strings".to_string())
            })
            .collect::<Result<_, _>>()?,
        Some(_) => return Err("required must be a sequence".to_string()),
    };

    Ok(EntrySchema::Record(RecordSchema {
        fields,
        required,
        additional_allowed: additional_allowed(node),
    }))
}

fn compile_scalar(node: &Value) -> Result<ScalarSchema, String> {
    let type_name = node
        .get("type")
        .and_then(Value::as_str)
        .ok_or("entry schema has no type")?;
    let kind = ScalarKind::from_type(type_name)
        .ok_or_else(|| format!("unsupported entry type {type_name:?}"))?;
    Ok(ScalarSchema {
        kind,
        minimum: node.get("minimum").and_then(Value::as_f64),
    })
}

fn collect_formats(node: &Value, out: &mut BTreeSet<String>) {
    match node {
        Value::Object(map) => {
            for (key, value) in map {
                match value {
                    Value::String(name) if key == "format" => {
                        out.insert(name.clone());
                    }
                    _ => collect_formats(value, out),
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_formats(item, out)),
        _ => {}
    }
}
