//! # Schema Store
//!
//! Produces the single authoritative [`ProviderSchema`] for a schema
//! source. The first successful [`SchemaStore::load`] is memoized; later
//! calls return the same `Arc` without locking.
//!
//! ## Load Semantics
//!
//! - Concurrent first callers are serialized: exactly one of them reads
//!   and compiles the asset, the others wait for its result.
//! - A failed load caches nothing. The next call reads the asset again,
//!   so a schema that was missing during a deployment is picked up once it
//!   appears.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};

use crate::error::ProviderConfigError;
use crate::loader::yaml_to_json_value;
use crate::rules::ProviderSchema;

/// File name of the packaged schema asset.
pub const SCHEMA_FILE: &str = "provider_config_schema.yaml";

const EMBEDDED_SCHEMA: &str = include_str!("../../../schemas/provider_config_schema.yaml");

/// Where a store reads its schema from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SchemaSource {
    /// The schema asset compiled into this crate.
    #[default]
    Embedded,
    /// A schema file on disk, read on first load.
    File(PathBuf),
    /// Schema text held in memory.
    Inline(String),
}

impl SchemaSource {
    fn read(&self) -> Result<String, String> {
        match self {
            Self::Embedded => Ok(EMBEDDED_SCHEMA.to_string()),
            Self::File(path) => std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read schema file: {e}")),
            Self::Inline(text) => Ok(text.clone()),
        }
    }
}

impl fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedded => write!(f, "embedded {SCHEMA_FILE}"),
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Inline(_) => f.write_str("inline schema"),
        }
    }
}

/// Memoizing loader for one schema source.
#[derive(Debug)]
pub struct SchemaStore {
    source: SchemaSource,
    schema: OnceCell<Arc<ProviderSchema>>,
}

static GLOBAL: Lazy<SchemaStore> = Lazy::new(SchemaStore::embedded);

impl SchemaStore {
    /// A store over `source`. Nothing is read until [`load`](Self::load).
    pub fn new(source: SchemaSource) -> Self {
        Self {
            source,
            schema: OnceCell::new(),
        }
    }

    /// A store over the embedded asset.
    pub fn embedded() -> Self {
        Self::new(SchemaSource::Embedded)
    }

    /// The process-wide store over the embedded asset.
    pub fn global() -> &'static SchemaStore {
        &GLOBAL
    }

    /// Where this store reads from.
    pub fn source(&self) -> &SchemaSource {
        &self.source
    }

    /// True once a load has succeeded.
    pub fn is_loaded(&self) -> bool {
        self.schema.get().is_some()
    }

    /// Return the compiled schema, loading it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderConfigError::SchemaUnavailable`] if the asset cannot
    /// be read, is not valid YAML, is rejected by the JSON Schema compiler,
    /// or lacks a parameter the validator needs. Nothing is cached on error.
    pub fn load(&self) -> Result<Arc<ProviderSchema>, ProviderConfigError> {
        self.schema
            .get_or_try_init(|| self.load_uncached().map(Arc::new))
            .map(Arc::clone)
    }

    fn load_uncached(&self) -> Result<ProviderSchema, ProviderConfigError> {
        let result = compile_source(&self.source);
        match &result {
            Ok(schema) => tracing::debug!(
                source = %self.source,
                version = %schema.version(),
                known_resource_classes = schema.inventories().known_keys().count(),
                known_traits = schema.traits().known_keys().count(),
                "loaded provider schema"
            ),
            Err(e) => {
                tracing::warn!(source = %self.source, error = %e, "provider schema unavailable")
            }
        }
        result
    }
}

fn compile_source(source: &SchemaSource) -> Result<ProviderSchema, ProviderConfigError> {
    let unavailable = |reason: String| ProviderConfigError::SchemaUnavailable {
        source_name: source.to_string(),
        reason,
    };

    let text = source.read().map_err(unavailable)?;
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(&text).map_err(|e| unavailable(format!("invalid YAML: {e}")))?;
    let raw = yaml_to_json_value(&yaml)
        .map_err(|e| unavailable(format!("YAML-to-JSON conversion failed: {e}")))?;

    if !raw.is_object() {
        return Err(unavailable("schema document is not a mapping".to_string()));
    }

    // Load-time check only. Validators compile their own engine with their
    // format registry bound, once each.
    let mut opts = jsonschema::options();
    opts.with_draft(jsonschema::Draft::Draft7);
    opts.build(&raw)
        .map_err(|e| unavailable(format!("not a valid JSON Schema: {e}")))?;

    ProviderSchema::compile(raw).map_err(unavailable)
}
