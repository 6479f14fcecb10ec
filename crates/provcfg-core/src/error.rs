//! # Error Types
//!
//! Two families live here:
//!
//! - [`CoreError`]: failures of the core types themselves (parsing a
//!   version string, converting a validated document into the typed model).
//! - [`ValidationFailure`]: the structured rejection produced by the
//!   validation engine. It carries a [`FailureKind`], the [`DocumentPath`]
//!   of the offending node and an operator-facing message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::path::DocumentPath;

/// Error raised by core type constructors and conversions.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A schema version string is not of the form `<major>.<minor>`.
    #[error("invalid schema version: {0}")]
    InvalidVersion(String),

    /// Conversion between the generic document tree and the typed model failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Category of a validation failure.
///
/// Callers branch on the kind; operators read the message and path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Wrong container kind or a missing structural key.
    DocumentMalformed,
    /// `meta.schema_version` is missing or does not match the version pattern.
    /// Nothing past the version gate is inspected.
    VersionInvalid,
    /// Zero or both of `uuid`/`name`, an empty `name`, or a `uuid` failing
    /// the format check.
    IdentificationInvalid,
    /// A key matches neither a known identifier nor a custom naming pattern,
    /// or a restricted entry carries a field it does not allow.
    UnknownProperty,
    /// A restricted entry is missing a required field or holds a value of
    /// the wrong type or range.
    SubSchemaInvalid,
}

impl FailureKind {
    /// Returns every failure kind.
    pub fn all() -> &'static [FailureKind] {
        &[
            Self::DocumentMalformed,
            Self::VersionInvalid,
            Self::IdentificationInvalid,
            Self::UnknownProperty,
            Self::SubSchemaInvalid,
        ]
    }

    /// Returns the snake_case identifier, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentMalformed => "document_malformed",
            Self::VersionInvalid => "version_invalid",
            Self::IdentificationInvalid => "identification_invalid",
            Self::UnknownProperty => "unknown_property",
            Self::SubSchemaInvalid => "sub_schema_invalid",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The first problem found in a configuration document.
///
/// The engine is fail-fast: a document yields at most one
/// `ValidationFailure` per call, located at the first offending node in
/// document order.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{kind} at {path}: {message}")]
pub struct ValidationFailure {
    /// Category of the failure.
    pub kind: FailureKind,
    /// Location of the offending node, from the document root.
    pub path: DocumentPath,
    /// Human-readable reason.
    pub message: String,
}

impl ValidationFailure {
    /// Create a failure of the given kind at `path`.
    pub fn new(kind: FailureKind, path: DocumentPath, message: impl Into<String>) -> Self {
        Self {
            kind,
            path,
            message: message.into(),
        }
    }

    /// Returns the failure kind.
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Returns the path of the offending node.
    pub fn path(&self) -> &DocumentPath {
        &self.path
    }
}
