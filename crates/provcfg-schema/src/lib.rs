//! # provcfg-schema: Provider Configuration Validation Engine
//!
//! Validates resource provider configuration documents against the
//! packaged schema (`schemas/provider_config_schema.yaml`).
//!
//! ## Architecture
//!
//! - [`FormatRegistry`] maps format names (`uuid`) to checker predicates.
//! - [`SchemaStore`] loads and memoizes the compiled [`ProviderSchema`].
//!   A failed load is not cached; the next call retries.
//! - [`Validator`] walks a document fail-fast and returns the first
//!   [`ValidationFailure`](provcfg_core::ValidationFailure), or reports
//!   every violation in collect-all mode through the `jsonschema` crate.
//! - [`loader`] reads YAML and JSON files into `serde_json::Value` trees.
//!
//! ## Usage
//!
//! ```ignore
//! use provcfg_schema::{SchemaStore, Validator};
//!
//! let validator = Validator::from_store(SchemaStore::global())?;
//! let validated = validator.validate(&document)?;
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod loader;
pub mod rules;
pub mod store;
pub mod validate;

pub use config::{ValidationMode, ValidatorConfig};
pub use error::ProviderConfigError;
pub use format::{FormatChecker, FormatRegistry, UUID_FORMAT};
pub use loader::{load_document, parse_provider_file, parse_provider_yaml};
pub use rules::{
    EntrySchema, ExtensionRules, IdentificationRules, ProviderSchema, RecordSchema, ScalarKind,
    ScalarSchema,
};
pub use store::{SchemaSource, SchemaStore, SCHEMA_FILE};
pub use validate::{validate, ValidatedDocument, ValidationViolations, Validator, Violation};
