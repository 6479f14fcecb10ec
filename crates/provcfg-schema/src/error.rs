//! # Engine Errors
//!
//! [`ProviderConfigError`] is what callers of the engine see. Only
//! [`ProviderConfigError::SchemaUnavailable`] is worth retrying: every other
//! variant is a deterministic verdict on the input.

use provcfg_core::ValidationFailure;
use thiserror::Error;

use crate::validate::ValidationViolations;

/// Error returned by the schema store, the validator and the document loader.
#[derive(Error, Debug)]
pub enum ProviderConfigError {
    /// The schema asset is missing, unparsable, or not a usable schema.
    #[error("schema unavailable from {source_name}: {reason}")]
    SchemaUnavailable {
        /// Where the schema was loaded from.
        source_name: String,
        /// Why it could not be used.
        reason: String,
    },

    /// The document failed fail-fast validation.
    #[error("invalid provider configuration: {0}")]
    Invalid(#[from] ValidationFailure),

    /// The document failed collect-all validation.
    #[error("invalid provider configuration ({count} violation(s)):\n{0}", count = .0.len())]
    Violations(ValidationViolations),

    /// The document file could not be read or parsed.
    #[error("document load error for '{path}': {reason}")]
    DocumentLoad {
        /// Path to the document that failed to load.
        path: String,
        /// Reason the document could not be loaded.
        reason: String,
    },
}

impl ProviderConfigError {
    /// True when the same call may succeed later without changing the input.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::SchemaUnavailable { .. })
    }

    /// Returns the fail-fast failure, if this is one.
    pub fn as_failure(&self) -> Option<&ValidationFailure> {
        match self {
            Self::Invalid(failure) => Some(failure),
            _ => None,
        }
    }
}

impl From<ValidationViolations> for ProviderConfigError {
    fn from(violations: ValidationViolations) -> Self {
        Self::Violations(violations)
    }
}
